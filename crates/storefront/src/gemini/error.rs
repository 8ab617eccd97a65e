//! Error types for the Gemini API client.

use thiserror::Error;

/// Errors that can occur when interacting with the Gemini API.
#[derive(Debug, Error)]
pub enum GeminiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Gemini API returned an error.
    #[error("API error ({status}): {message}")]
    Api {
        /// Status string from the API (e.g., `INVALID_ARGUMENT`).
        status: String,
        /// Error message.
        message: String,
    },

    /// Rate limited or out of quota.
    #[error("quota exceeded, retry after {0} seconds")]
    RateLimited(u64),

    /// The API key was rejected or is malformed.
    #[error("invalid API key: {0}")]
    Unauthorized(String),

    /// Failed to parse response.
    #[error("parse error: {0}")]
    Parse(String),

    /// Stream error.
    #[error("stream error: {0}")]
    Stream(String),
}

impl GeminiError {
    /// Whether the failure is caused by API key configuration.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        match self {
            Self::Unauthorized(_) => true,
            Self::Api { message, .. } => message.contains("API key"),
            _ => false,
        }
    }

    /// Whether the failure is a quota or rate limit.
    #[must_use]
    pub fn is_quota(&self) -> bool {
        match self {
            Self::RateLimited(_) => true,
            Self::Api { status, message } => {
                status == "RESOURCE_EXHAUSTED" || message.to_lowercase().contains("quota")
            }
            _ => false,
        }
    }
}

/// API error response from Gemini.
#[derive(Debug, serde::Deserialize)]
pub struct ApiErrorResponse {
    /// Nested error details.
    pub error: ApiError,
}

/// Nested error details.
#[derive(Debug, serde::Deserialize)]
pub struct ApiError {
    /// HTTP status code.
    #[serde(default)]
    pub code: u16,
    /// Error message.
    pub message: String,
    /// Canonical status string.
    #[serde(default)]
    pub status: String,
}
