#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to connect to redis at `{url}`: {source}")]
    ConnectionError {
        url: String,
        #[source]
        source: redis::RedisError,
    },
    #[error("failed to append to stream `{key}`: {source}")]
    AppendError {
        key: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
