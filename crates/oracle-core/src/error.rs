//! Error types for the Oracle core.

use thiserror::Error;

/// Result type alias for core operations.
pub type OracleResult<T> = Result<T, OracleError>;

/// Errors that can occur inside the core. Input-validation failures are not
/// errors here; they travel as `ValidationError` data and become redirect
/// copy, never error paths.
#[derive(Error, Debug)]
pub enum OracleError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Enhancement request failed: {0}")]
    Enhance(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Malformed upstream response: {0}")]
    UpstreamFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for OracleError {
    fn from(err: reqwest::Error) -> Self {
        OracleError::Http(err.to_string())
    }
}

impl From<serde_json::Error> for OracleError {
    fn from(err: serde_json::Error) -> Self {
        OracleError::UpstreamFormat(err.to_string())
    }
}
