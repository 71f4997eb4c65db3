//! Error types for fezzik-core

use std::time::Duration;

use thiserror::Error;

/// Core error type
#[derive(Error, Debug)]
pub enum FezzikError {
    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// A builder was finalized without a required field
    #[error("missing required configuration: {0}")]
    MissingConfig(&'static str),

    /// Fetching a state snapshot from the orchestrator failed
    #[error("observation failed: {0}")]
    Observation(String),

    /// An inbound completion notification could not be decoded
    #[error("completion notification rejected: {0}")]
    Notification(String),

    /// A deadline elapsed before the target was reached
    #[error("timed out after {waited:?} with {observed}/{target} units done")]
    Timeout {
        /// How long the caller waited
        waited: Duration,
        /// Units that reached the terminal milestone
        observed: usize,
        /// Units expected
        target: usize,
    },

    /// IO error (listener, endpoint)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FezzikError {
    /// Build a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Build a missing-field error
    pub fn missing_config(field: &'static str) -> Self {
        Self::MissingConfig(field)
    }

    /// Build an observation error
    pub fn observation(message: impl Into<String>) -> Self {
        Self::Observation(message.into())
    }

    /// Build a notification error
    pub fn notification(message: impl Into<String>) -> Self {
        Self::Notification(message.into())
    }

    /// Whether this error is a deadline expiry rather than a hard failure
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, FezzikError>;
