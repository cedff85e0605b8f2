use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;

use crate::runtime::{self, LogStream};

/// Longest line accepted before the stream is considered broken.
pub const MAX_LINE_LEN: usize = 64 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum LineReadError {
    #[error(transparent)]
    Stream(#[from] runtime::Error),
    #[error("line exceeds {limit} bytes")]
    TooLong { limit: usize },
}

/// Splits a [`LogStream`] into lines.
///
/// Lines are terminated by `\n`; a trailing `\r` is dropped as well. Bytes after the last
/// newline are returned as a final line once the stream ends.
pub struct LineReader {
    stream: LogStream,
    buf: BytesMut,
    // Prefix of `buf` already known to hold no newline.
    scanned: usize,
    max_line_len: usize,
    eof: bool,
}

impl LineReader {
    pub fn new(stream: LogStream) -> Self {
        Self::with_max_line_len(stream, MAX_LINE_LEN)
    }

    pub fn with_max_line_len(stream: LogStream, max_line_len: usize) -> Self {
        Self {
            stream,
            buf: BytesMut::with_capacity(4096),
            scanned: 0,
            max_line_len,
            eof: false,
        }
    }

    /// Returns the next line, or `None` at end of stream.
    ///
    /// Cancel safe: bytes already pulled from the stream stay buffered.
    pub async fn next_line(&mut self) -> Result<Option<Bytes>, LineReadError> {
        loop {
            if let Some(pos) = self.buf[self.scanned..].iter().position(|b| *b == b'\n') {
                let pos = self.scanned + pos;
                self.scanned = 0;
                let mut line = self.buf.split_to(pos + 1);
                line.truncate(pos);
                return Ok(Some(trim_cr(line)));
            }
            self.scanned = self.buf.len();
            if self.buf.len() > self.max_line_len {
                return Err(LineReadError::TooLong {
                    limit: self.max_line_len,
                });
            }
            if self.eof {
                if self.buf.is_empty() {
                    return Ok(None);
                }
                self.scanned = 0;
                let line = self.buf.split();
                return Ok(Some(trim_cr(line)));
            }

            match self.stream.next().await {
                Some(Ok(chunk)) => self.buf.extend_from_slice(&chunk),
                Some(Err(err)) => return Err(err.into()),
                None => self.eof = true,
            }
        }
    }
}

fn trim_cr(mut line: BytesMut) -> Bytes {
    if line.last() == Some(&b'\r') {
        line.truncate(line.len() - 1);
    }
    line.freeze()
}
