//! Error types for Finn.

use std::time::Duration;
use thiserror::Error;

/// Library-level error type for Finn operations.
#[derive(Error, Debug)]
pub enum FinnError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{service} error (status {status}): {message}")]
    ExternalService {
        service: String,
        status: u16,
        message: String,
    },

    #[error("Missing field in response: {0}")]
    MissingResult(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Cannot {event} while at {stage}")]
    InvalidTransition { stage: String, event: String },

    #[error("Audio download failed: {0}")]
    AudioDownload(String),

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("Page scrape failed: {0}")]
    Scrape(String),

    #[error("Completion failed: {0}")]
    Completion(String),

    #[error("Video synthesis did not finish within {0:?}")]
    VideoTimeout(Duration),

    #[error("Could not parse time from '{0}'")]
    TimeParse(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl FinnError {
    /// Build an error for a non-success response from a third-party endpoint.
    pub fn external(service: &str, status: u16, message: impl Into<String>) -> Self {
        FinnError::ExternalService {
            service: service.to_string(),
            status,
            message: message.into(),
        }
    }
}

/// Result type alias for Finn operations.
pub type Result<T> = std::result::Result<T, FinnError>;
