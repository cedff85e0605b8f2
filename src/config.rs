//! Runtime configuration read from environment variables.
//!
//! | Variable              | Default       |
//! |-----------------------|---------------|
//! | `REDIS_ADDR`          | `redis:6379`  |
//! | `LOG_QUEUE_CAPACITY`  | `1024`        |
//! | `LOG_QUEUE_OVERFLOW`  | `block`       |
//! | `SHUTDOWN_GRACE_SECS` | `10`          |
//!
//! `LOG_QUEUE_CAPACITY` must lie in `1..=MAX_QUEUE_CAPACITY`. With `drop-oldest` it is
//! rounded up to the next power of two, the granularity of the underlying channel.
//!
//! The docker daemon is reached through `DOCKER_HOST` or the local socket.
use std::time::Duration;

use crate::stream::{
    DEFAULT_QUEUE_CAPACITY, OverflowPolicy, ParseOverflowPolicyError, WorkerConfig,
};

const DEFAULT_REDIS_ADDR: &str = "redis:6379";
const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(10);
const MAX_SHUTDOWN_GRACE_SECS: usize = 3600;

/// Upper bound for `LOG_QUEUE_CAPACITY`. Every worker allocates its queue up front.
pub const MAX_QUEUE_CAPACITY: usize = 1 << 20;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid value `{value}` for `{var}`: expected an integer in 1..={max}")]
    InvalidNumber {
        var: &'static str,
        value: String,
        max: usize,
    },
    #[error("invalid value for `LOG_QUEUE_OVERFLOW`: {0}")]
    InvalidOverflowPolicy(#[source] ParseOverflowPolicyError),
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub redis_url: String,
    pub worker: WorkerConfig,
    pub shutdown_grace: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Builds the configuration from `lookup`, which maps a variable name to its value.
    /// Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |var: &str| lookup(var).filter(|value| !value.trim().is_empty());

        let redis_addr = get("REDIS_ADDR").unwrap_or_else(|| DEFAULT_REDIS_ADDR.to_owned());
        let redis_url = if redis_addr.contains("://") {
            redis_addr
        } else {
            format!("redis://{redis_addr}")
        };

        let queue_capacity = match get("LOG_QUEUE_CAPACITY") {
            Some(value) => parse_bounded("LOG_QUEUE_CAPACITY", &value, MAX_QUEUE_CAPACITY)?,
            None => DEFAULT_QUEUE_CAPACITY,
        };
        let overflow = match get("LOG_QUEUE_OVERFLOW") {
            Some(value) => value.parse().map_err(Error::InvalidOverflowPolicy)?,
            None => OverflowPolicy::default(),
        };
        let queue_capacity = match overflow {
            OverflowPolicy::Block => queue_capacity,
            OverflowPolicy::DropOldest => queue_capacity.next_power_of_two(),
        };
        let shutdown_grace = match get("SHUTDOWN_GRACE_SECS") {
            Some(value) => Duration::from_secs(
                parse_bounded("SHUTDOWN_GRACE_SECS", &value, MAX_SHUTDOWN_GRACE_SECS)? as u64,
            ),
            None => DEFAULT_SHUTDOWN_GRACE,
        };

        Ok(Self {
            redis_url,
            worker: WorkerConfig {
                queue_capacity,
                overflow,
            },
            shutdown_grace,
        })
    }
}

fn parse_bounded(var: &'static str, value: &str, max: usize) -> Result<usize> {
    match value.trim().parse::<usize>() {
        Ok(n) if (1..=max).contains(&n) => Ok(n),
        _ => Err(Error::InvalidNumber {
            var,
            value: value.to_owned(),
            max,
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|var| vars.get(var).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.redis_url, "redis://redis:6379");
        assert_eq!(config.worker, WorkerConfig::default());
        assert_eq!(config.shutdown_grace, Duration::from_secs(10));
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("REDIS_ADDR", "localhost:6380"),
            ("LOG_QUEUE_CAPACITY", "16"),
            ("LOG_QUEUE_OVERFLOW", "drop-oldest"),
            ("SHUTDOWN_GRACE_SECS", "3"),
        ])
        .unwrap();
        assert_eq!(config.redis_url, "redis://localhost:6380");
        assert_eq!(config.worker.queue_capacity, 16);
        assert_eq!(config.worker.overflow, OverflowPolicy::DropOldest);
        assert_eq!(config.shutdown_grace, Duration::from_secs(3));
    }

    #[test]
    fn test_full_redis_url_is_kept() {
        let config = config_from(&[("REDIS_ADDR", "rediss://cache.internal:6379/2")]).unwrap();
        assert_eq!(config.redis_url, "rediss://cache.internal:6379/2");
    }

    #[test]
    fn test_empty_value_uses_default() {
        let config = config_from(&[("REDIS_ADDR", "  ")]).unwrap();
        assert_eq!(config.redis_url, "redis://redis:6379");
    }

    #[test]
    fn test_invalid_values() {
        let err = config_from(&[("LOG_QUEUE_CAPACITY", "0")]).unwrap_err();
        assert!(matches!(err, Error::InvalidNumber { var: "LOG_QUEUE_CAPACITY", .. }));

        let err = config_from(&[("SHUTDOWN_GRACE_SECS", "soon")]).unwrap_err();
        assert!(matches!(err, Error::InvalidNumber { var: "SHUTDOWN_GRACE_SECS", .. }));

        let err = config_from(&[("LOG_QUEUE_OVERFLOW", "spill")]).unwrap_err();
        assert!(matches!(err, Error::InvalidOverflowPolicy(_)));
    }

    #[test]
    fn test_queue_capacity_is_capped() {
        let config = config_from(&[("LOG_QUEUE_CAPACITY", "1048576")]).unwrap();
        assert_eq!(config.worker.queue_capacity, MAX_QUEUE_CAPACITY);

        let too_large = (MAX_QUEUE_CAPACITY + 1).to_string();
        let err = config_from(&[("LOG_QUEUE_CAPACITY", &too_large)]).unwrap_err();
        assert!(matches!(err, Error::InvalidNumber { var: "LOG_QUEUE_CAPACITY", .. }));

        let max = usize::MAX.to_string();
        let err = config_from(&[("LOG_QUEUE_CAPACITY", &max)]).unwrap_err();
        assert!(matches!(err, Error::InvalidNumber { var: "LOG_QUEUE_CAPACITY", .. }));
    }

    #[test]
    fn test_drop_oldest_capacity_is_rounded_up() {
        let config = config_from(&[
            ("LOG_QUEUE_CAPACITY", "3"),
            ("LOG_QUEUE_OVERFLOW", "drop-oldest"),
        ])
        .unwrap();
        assert_eq!(config.worker.queue_capacity, 4);

        let config = config_from(&[("LOG_QUEUE_CAPACITY", "3")]).unwrap();
        assert_eq!(config.worker.queue_capacity, 3);
    }
}
