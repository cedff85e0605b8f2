use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use super::{Error, LogEvent, Result, StreamAppender, StreamKey};

/// Appends events to Redis streams using `XADD`.
#[derive(Clone)]
pub struct RedisStreamAppender {
    conn: ConnectionManager,
}

impl RedisStreamAppender {
    /// Opens a managed connection to `url` and verifies it with `PING`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionError`] if the url is invalid or the server does not
    /// answer the `PING`.
    pub async fn connect(url: &str) -> Result<Self> {
        let connection_error = |source| Error::ConnectionError {
            url: url.to_owned(),
            source,
        };
        let client = redis::Client::open(url).map_err(connection_error)?;
        let mut conn = client
            .get_connection_manager()
            .await
            .map_err(connection_error)?;
        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(connection_error)?;
        log::debug!("Connected to redis at {}: {}", url, pong);

        Ok(Self { conn })
    }
}

impl std::fmt::Debug for RedisStreamAppender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStreamAppender").finish_non_exhaustive()
    }
}

impl StreamAppender for RedisStreamAppender {
    async fn append(&self, key: &StreamKey, event: &LogEvent) -> Result<()> {
        let mut conn = self.conn.clone();
        let fields = event.fields();
        let entry_id: String = conn
            .xadd(key.as_str(), "*", &fields)
            .await
            .map_err(|source| Error::AppendError {
                key: key.to_string(),
                source: Box::new(source),
            })?;
        log::trace!("appended entry {} to {}", entry_id, key);

        Ok(())
    }
}
