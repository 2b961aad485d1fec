//! Error types for the campus concierge.

use std::time::Duration;
use thiserror::Error;

/// Library-level error type for concierge operations.
#[derive(Error, Debug)]
pub enum ConciergeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Invalid tool arguments: {0}")]
    Validation(String),

    #[error("LLM request timed out after {0:?}")]
    Timeout(Duration),

    #[error("LLM provider error: {0}")]
    Llm(String),

    #[error("Agent error: {0}")]
    Agent(String),

    #[error("Data store error: {0}")]
    Store(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Coarse failure category, used for the API error envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    BadRequest,
    Validation,
    Timeout,
    Upstream,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "bad_request",
            ErrorKind::Validation => "validation",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Upstream => "upstream",
            ErrorKind::Internal => "internal",
        }
    }
}

impl ConciergeError {
    /// Classify this error for callers outside the library.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConciergeError::BadRequest(_) => ErrorKind::BadRequest,
            ConciergeError::Validation(_) => ErrorKind::Validation,
            ConciergeError::Timeout(_) => ErrorKind::Timeout,
            ConciergeError::Llm(_) | ConciergeError::Http(_) => ErrorKind::Upstream,
            _ => ErrorKind::Internal,
        }
    }
}

/// Result type alias for concierge operations.
pub type Result<T> = std::result::Result<T, ConciergeError>;
