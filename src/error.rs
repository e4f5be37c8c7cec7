//! Error types for ChatAudio.

use thiserror::Error;

/// Library-level error type for ChatAudio operations.
#[derive(Error, Debug)]
pub enum ChatAudioError {
    #[error("Media unavailable: {0}")]
    MediaUnavailable(String),

    #[error("Upload failed: {0}")]
    UploadError(String),

    #[error("Transcription failed: {0}")]
    TranscriptionFailed(String),

    #[error("No transcript available yet. Submit a video link and wait for the transcription to finish first.")]
    NoTranscriptAvailable,

    #[error("Answer unavailable: {0}")]
    AnswerUnavailable(String),

    #[error("Missing configuration: {0} is not set. Add it to your environment or a .env file.")]
    ConfigurationMissing(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Provider returned HTTP {status}: {body}")]
    Provider { status: u16, body: String },

    #[error("Transcription did not finish in time: {0}")]
    PollTimeout(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl ChatAudioError {
    /// Whether retrying the same request may succeed.
    ///
    /// Network-level failures, timeouts, rate limiting and server-side
    /// errors are transient; everything else is terminal.
    pub fn is_transient(&self) -> bool {
        match self {
            ChatAudioError::Http(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.is_request()
                    || e.status().is_some_and(|s| s.as_u16() == 429 || s.is_server_error())
            }
            ChatAudioError::Provider { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Whether the error reflects how the session was used rather than a fault.
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            ChatAudioError::NoTranscriptAvailable | ChatAudioError::InvalidInput(_)
        )
    }
}

/// Result type alias for ChatAudio operations.
pub type Result<T> = std::result::Result<T, ChatAudioError>;
