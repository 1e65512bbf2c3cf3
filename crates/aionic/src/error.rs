//! Error types for aionic.

use thiserror::Error;

/// Main error type for aionic operations.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown command: {0} (try `aionic list`)")]
    UnknownCommand(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for CliError {
    fn from(e: toml::de::Error) -> Self {
        CliError::Config(e.to_string())
    }
}

/// Result type alias for aionic operations.
pub type CliResult<T> = Result<T, CliError>;
