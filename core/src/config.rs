//! Scenario configuration types

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Per-scenario run configuration
///
/// Controls how many create calls may be in flight, how often the
/// orchestrator is polled and how long the watchers and teardown wait.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    /// Maximum number of create calls in flight
    pub concurrency: usize,

    /// Optional submission rate limit (creates per second)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<f64>,

    /// Interval between state snapshots
    #[serde(rename = "poll_interval_ms", with = "duration_ms")]
    pub poll_interval: Duration,

    /// Deadline for all units to reach their terminal milestone
    #[serde(rename = "timeout_ms", with = "duration_ms")]
    pub timeout: Duration,

    /// Deadline for deleted units to disappear from snapshots
    #[serde(rename = "teardown_timeout_ms", with = "duration_ms")]
    pub teardown_timeout: Duration,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            concurrency: 256,
            rate_limit: None,
            poll_interval: Duration::from_millis(200),
            timeout: Duration::from_secs(240),
            teardown_timeout: Duration::from_secs(240),
        }
    }
}

impl ScenarioConfig {
    /// Create a new config with the given submission concurrency
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency,
            ..Default::default()
        }
    }

    /// Set the submission rate limit
    pub fn with_rate_limit(mut self, rps: f64) -> Self {
        self.rate_limit = Some(rps);
        self
    }

    /// Set the poll interval
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the completion deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the teardown deadline
    pub fn with_teardown_timeout(mut self, timeout: Duration) -> Self {
        self.teardown_timeout = timeout;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::InvalidConcurrency(
                "concurrency must be at least 1".into(),
            ));
        }

        if let Some(rps) = self.rate_limit {
            if rps <= 0.0 || !rps.is_finite() {
                return Err(ConfigError::InvalidRateLimit(
                    "rate limit must be positive".into(),
                ));
            }
        }

        if self.poll_interval.is_zero() {
            return Err(ConfigError::InvalidInterval(
                "poll interval must be non-zero".into(),
            ));
        }

        if self.timeout.is_zero() || self.teardown_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout(
                "timeouts must be non-zero".into(),
            ));
        }

        Ok(())
    }
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Invalid concurrency value
    #[error("Invalid concurrency: {0}")]
    InvalidConcurrency(String),

    /// Invalid rate limit
    #[error("Invalid rate limit: {0}")]
    InvalidRateLimit(String),

    /// Invalid poll interval
    #[error("Invalid poll interval: {0}")]
    InvalidInterval(String),

    /// Invalid timeout
    #[error("Invalid timeout: {0}")]
    InvalidTimeout(String),
}

/// Serialize a `Duration` as whole milliseconds
pub mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    /// Serialize as integer milliseconds
    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    /// Deserialize from integer milliseconds
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
