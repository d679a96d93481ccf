//! Error types for the Oracle speech layer.

use thiserror::Error;

/// Result type alias for speech operations.
pub type SpeechResult<T> = Result<T, SpeechError>;

/// Errors that can occur while synthesizing speech. Callers fall back to
/// estimated speaking durations; none of these reach the visitor.
#[derive(Error, Debug)]
pub enum SpeechError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TTS error: {0}")]
    Tts(String),

    #[error("Upstream status {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for SpeechError {
    fn from(err: reqwest::Error) -> Self {
        SpeechError::Tts(err.to_string())
    }
}
