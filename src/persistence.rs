mod error;
mod models;
mod persister;
mod publisher;
mod redis_stream;

pub use error::{Error, Result};
pub use models::{LogEvent, STREAM_KEY_PREFIX, StreamKey};
pub use persister::StreamAppender;
pub use publisher::EventPublisher;
pub use redis_stream::RedisStreamAppender;
