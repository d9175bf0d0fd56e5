//! Error types shared by every Ecole Directe crate.

use thiserror::Error;

/// Result type for Ecole Directe operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while talking to Ecole Directe or handling its data.
#[derive(Debug, Error)]
pub enum Error {
    /// The HTTP call itself failed (timeout, DNS, TLS, unreadable body).
    #[error("Transport error: {0}")]
    Transport(String),

    /// The response body was not a JSON envelope.
    #[error("Invalid response from {url}: {reason}")]
    InvalidResponse { url: String, reason: String },

    /// The API answered with a non-success code.
    #[error("Request to {url} failed with code {code}: {message}")]
    Api {
        url: String,
        code: i64,
        message: String,
    },

    /// Login rejected or login payload unusable.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Double authentication could not be completed automatically.
    ///
    /// The QCM answer file needs a human edit before the next login.
    #[error("Double authentication failed: {0}")]
    Qcm(String),

    /// The payload did not have the expected shape.
    #[error("Unexpected payload: {0}")]
    Schema(String),

    /// QCM answer table could not be read or written.
    #[error("QCM store error: {0}")]
    Store(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Other error.
    #[error("Other: {0}")]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Whether this error asks for a human to fix the QCM answer file.
    pub fn is_qcm(&self) -> bool {
        matches!(self, Error::Qcm(_))
    }

    /// Whether the error came from the API envelope rather than the network.
    pub fn api_code(&self) -> Option<i64> {
        match self {
            Error::Api { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::InvalidConfiguration(e.to_string())
    }
}
