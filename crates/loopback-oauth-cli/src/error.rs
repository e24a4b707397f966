//! Error types for the loopback-oauth CLI

use color_eyre::eyre::Report;
use thiserror::Error;

/// CLI error type with minimal variants
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration file or environment issues
    #[error("Configuration error: {0}")]
    Config(String),

    /// Authorization or token exchange failed
    #[error("Failed: {0}")]
    Auth(#[from] loopback_oauth::AuthError),

    /// Output serialization failed
    #[error("Failed to serialize output: {0}")]
    Output(#[from] serde_json::Error),

    /// Everything else (using color-eyre's Report for rich errors)
    #[error(transparent)]
    Internal(#[from] Report),
}

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        Self::Config(err.to_string())
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
