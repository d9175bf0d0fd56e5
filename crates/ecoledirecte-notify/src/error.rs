//! Error types for notification sinks.

use thiserror::Error;

/// Result type for sink operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Sink is disabled.
    #[error("Sink disabled: {0}")]
    SinkDisabled(String),

    /// Delivery failed.
    #[error("Send failed: {0}")]
    SendFailed(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Other error.
    #[error("Other: {0}")]
    Other(#[from] anyhow::Error),
}
