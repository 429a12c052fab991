//! Error types for the chatbot client.

use thiserror::Error;

/// Errors that can occur while talking to the chatbot backend.
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed before a response was received.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// HTTP client configuration error.
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// JSON parsing error.
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// The backend rejected the request with a human-readable message.
    #[error("{0}")]
    Api(String),

    /// The stored session is no longer valid (HTTP 401 from any endpoint).
    #[error("Session expired, please sign in again")]
    SessionExpired,

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// Whether this error ended the session and requires a new login.
    #[must_use]
    pub const fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired)
    }
}
