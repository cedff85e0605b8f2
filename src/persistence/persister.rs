use super::{LogEvent, Result, StreamKey};

pub trait StreamAppender: Send + Sync + 'static {
    /// Appends the fields of `event` as one entry of the stream `key`. The stream is
    /// created by the first append.
    fn append(
        &self,
        key: &StreamKey,
        event: &LogEvent,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}
