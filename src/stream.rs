//! Per-container log forwarding.
//!
//! A [`LogStreamWorker`] attaches to one container, splits its output into lines with
//! [`LineReader`], strips the runtime's frame header and hands the resulting events to the
//! publisher through a bounded queue.
mod lines;
mod normalize;
mod queue;
mod worker;

pub use lines::{LineReadError, LineReader, MAX_LINE_LEN};
pub use normalize::{FRAME_HEADER_LEN, normalize_line, strip_frame_header};
pub use queue::{
    OverflowPolicy, ParseOverflowPolicyError, QueueClosed, QueueReceiver, QueueSender, bounded,
};
pub use worker::{DEFAULT_QUEUE_CAPACITY, LogStreamWorker, WorkerConfig, WorkerExit};
