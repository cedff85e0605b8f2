use std::sync::Arc;

use super::{LogEvent, StreamAppender};

/// Publishes [`LogEvent`]s to the stream of their container.
///
/// Delivery is at-most-once: a failed append is logged and the event is dropped.
#[derive(Debug)]
pub struct EventPublisher<A> {
    appender: Arc<A>,
}

impl<A> Clone for EventPublisher<A> {
    fn clone(&self) -> Self {
        Self {
            appender: Arc::clone(&self.appender),
        }
    }
}

impl<A: StreamAppender> EventPublisher<A> {
    pub fn new(appender: A) -> Self {
        Self {
            appender: Arc::new(appender),
        }
    }

    /// Appends `event` and waits for the backend to acknowledge it.
    ///
    /// Returns whether the event was stored.
    pub async fn publish(&self, event: &LogEvent) -> bool {
        let key = event.stream_key();
        match self.appender.append(&key, event).await {
            Ok(()) => true,
            Err(err) => {
                log::error!(
                    "Error pushing event of container {} to stream: {}",
                    event.container_id().short(),
                    err
                );
                false
            }
        }
    }
}
