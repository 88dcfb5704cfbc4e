//! Executor configuration.
//!
//! [`ExecutorConfig`] is the serializable form of an executor's settings, so
//! the values can live in whatever configuration file the embedding service
//! already loads. Every field has a default, so a partial document is fine.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default idle connections kept per destination.
pub const DEFAULT_POOL_SIZE: usize = 50;

/// Default per-attempt timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default number of retries after the first attempt.
pub const DEFAULT_RETRY: usize = 3;

/// Default wait between a failed attempt and the next retry.
pub const DEFAULT_RETRY_WAIT: Duration = Duration::from_secs(10);

/// Settings for an [`Executor`](crate::Executor).
///
/// Durations are written as whole milliseconds.
///
/// # Examples
///
/// ```
/// use steadycall::ExecutorConfig;
/// use std::time::Duration;
///
/// let config: ExecutorConfig =
///     serde_json::from_str(r#"{ "retry": 5, "timeout_ms": 2500 }"#).unwrap();
///
/// assert_eq!(config.retry, 5);
/// assert_eq!(config.timeout, Duration::from_millis(2500));
/// assert_eq!(config.pool_size, 50);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Idle connections kept per destination.
    pub pool_size: usize,

    /// Deadline applied to each single exchange.
    #[serde(rename = "timeout_ms", with = "duration_ms")]
    pub timeout: Duration,

    /// Maximum number of retries after the first attempt.
    pub retry: usize,

    /// Delay between a failed attempt and the next retry.
    #[serde(rename = "retry_wait_ms", with = "duration_ms")]
    pub retry_wait: Duration,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            pool_size: DEFAULT_POOL_SIZE,
            timeout: DEFAULT_TIMEOUT,
            retry: DEFAULT_RETRY,
            retry_wait: DEFAULT_RETRY_WAIT,
        }
    }
}

impl ExecutorConfig {
    /// Checks the values make sense together.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigurationError`] for a zero per-attempt timeout,
    /// since no exchange could ever succeed.
    pub fn validate(&self) -> Result<()> {
        if self.timeout.is_zero() {
            return Err(Error::ConfigurationError(
                "Per-attempt timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
