use std::fmt;
use std::sync::Arc;

use crate::container::{ContainerID, ContainerRecord};

/// Prefix of every per-container stream key.
pub const STREAM_KEY_PREFIX: &str = "logs:";

/// Name of the stream a container's events are appended to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StreamKey(String);

impl StreamKey {
    pub fn for_container(container_id: &ContainerID) -> Self {
        let mut key = String::with_capacity(STREAM_KEY_PREFIX.len() + container_id.as_str().len());
        key.push_str(STREAM_KEY_PREFIX);
        key.push_str(container_id.as_str());
        Self(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for StreamKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StreamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One forwarded output line of a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    container_id: ContainerID,
    container_name: Arc<str>,
    message: String,
    timestamp: u64,
}

impl LogEvent {
    pub fn new(record: &ContainerRecord, message: String, timestamp: u64) -> Self {
        Self {
            container_id: record.id().clone(),
            container_name: Arc::from(record.name()),
            message,
            timestamp,
        }
    }

    /// Creates an event stamped with the current wall-clock time, in seconds.
    ///
    /// Workers call this when a line is read and queued, not when it is appended. With a
    /// backlog in the queue the stamp can be earlier than the append to redis.
    pub fn now(record: &ContainerRecord, message: String) -> Self {
        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        Self::new(record, message, timestamp)
    }

    pub fn container_id(&self) -> &ContainerID {
        &self.container_id
    }

    pub fn container_name(&self) -> &str {
        &self.container_name
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Seconds since the UNIX epoch at which the line was forwarded.
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn stream_key(&self) -> StreamKey {
        StreamKey::for_container(&self.container_id)
    }

    /// Field/value pairs of the stream entry.
    pub fn fields(&self) -> [(&'static str, String); 4] {
        [
            ("container_id", self.container_id.to_string()),
            ("container_name", self.container_name.to_string()),
            ("log", self.message.clone()),
            ("timestamp", self.timestamp.to_string()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> ContainerRecord {
        ContainerRecord::new(ContainerID::new("c0ffee").unwrap(), "/api")
    }

    #[test]
    fn test_stream_key_is_prefixed_container_id() {
        let key = StreamKey::for_container(&ContainerID::new("c0ffee").unwrap());
        assert_eq!(key.as_str(), "logs:c0ffee");
    }

    #[test]
    fn test_event_fields() {
        let event = LogEvent::new(&record(), "Hello".to_owned(), 1_700_000_000);
        assert_eq!(event.stream_key().as_str(), "logs:c0ffee");
        assert_eq!(
            event.fields(),
            [
                ("container_id", "c0ffee".to_owned()),
                ("container_name", "/api".to_owned()),
                ("log", "Hello".to_owned()),
                ("timestamp", "1700000000".to_owned()),
            ]
        );
    }

    #[test]
    fn test_event_now_uses_wall_clock() {
        let before = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_secs();
        let event = LogEvent::now(&record(), "x".to_owned());
        assert!(event.timestamp() >= before);
        assert_eq!(event.message(), "x");
        assert_eq!(event.container_name(), "/api");
    }
}
