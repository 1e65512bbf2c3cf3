//! Error types for aionic-core.

use thiserror::Error;

/// Result type alias using aionic-core Error
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for universe operations
#[derive(Error, Debug)]
pub enum Error {
    // Catalog errors
    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    // Generation errors
    #[error("Generation failed: {0}")]
    Generation(#[from] GenerationError),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Coordinator errors
    #[error("Universe has shut down")]
    ChannelClosed,

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Create a catalog validation error
    pub fn invalid_catalog(message: impl Into<String>) -> Self {
        Self::InvalidCatalog(message.into())
    }

    /// Create an unknown command error
    pub fn unknown_command(id: impl Into<String>) -> Self {
        Self::UnknownCommand(id.into())
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for Error {
    fn from(_: tokio::sync::mpsc::error::SendError<T>) -> Self {
        Error::ChannelClosed
    }
}

impl From<tokio::sync::oneshot::error::RecvError> for Error {
    fn from(_: tokio::sync::oneshot::error::RecvError) -> Self {
        Error::ChannelClosed
    }
}

/// Failures of the external generative service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error("no API key configured")]
    NotConfigured,

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("service returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("request timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    #[error("the model did not return {0}")]
    Empty(&'static str),

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl GenerationError {
    /// Create a timeout error
    pub fn timeout(duration_ms: u64) -> Self {
        Self::Timeout { duration_ms }
    }

    /// Check if this error is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

#[cfg(feature = "client")]
impl From<reqwest::Error> for GenerationError {
    fn from(e: reqwest::Error) -> Self {
        GenerationError::Http(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = Error::unknown_command("42");
        assert!(err.to_string().contains("42"));

        let err = Error::from(GenerationError::timeout(5000));
        assert!(err.to_string().contains("5000"));

        assert!(GenerationError::timeout(1).is_timeout());
        assert!(!GenerationError::NotConfigured.is_timeout());
    }
}
