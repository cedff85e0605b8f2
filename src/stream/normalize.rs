/// Length of the multiplexing header the runtime puts in front of an output frame.
pub const FRAME_HEADER_LEN: usize = 8;

/// Removes the frame header from a raw output line.
///
/// Lines longer than [`FRAME_HEADER_LEN`] lose their first eight bytes. Shorter lines are
/// returned unchanged, except for a line that is exactly one frame header (stream type
/// `0..=2` followed by three zero bytes), which is a frame with an empty payload.
pub fn strip_frame_header(line: &[u8]) -> &[u8] {
    if line.len() > FRAME_HEADER_LEN || is_frame_header(line) {
        &line[FRAME_HEADER_LEN..]
    } else {
        line
    }
}

fn is_frame_header(line: &[u8]) -> bool {
    line.len() == FRAME_HEADER_LEN && line[0] <= 2 && line[1..4] == [0, 0, 0]
}

/// Turns a raw output line into the message of a log event.
///
/// Returns `None` if nothing is left after stripping the frame header.
pub fn normalize_line(line: &[u8]) -> Option<String> {
    let payload = strip_frame_header(line);
    if payload.is_empty() {
        return None;
    }
    Some(String::from_utf8_lossy(payload).into_owned())
}
