//! Error types for the client records client.

use crate::types::ErrorBody;
use thiserror::Error;


/// Client error types.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// API returned an error response.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error code from the API, when the body was a JSON error.
        code: Option<String>,
        /// Error message from API.
        message: String,
    },

    /// Resource or route not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Request rejected by validation.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Email already used by another client.
    #[error("Conflict: {0}")]
    Conflict(String),
}

impl Error {
    /// Maps a non-success status and body to an error.
    pub(crate) fn from_status(status: u16, text: String) -> Self {
        let body: Option<ErrorBody> = serde_json::from_str(&text).ok();
        let message = body
            .as_ref()
            .map_or_else(|| text.clone(), |b| b.message.clone());

        match status {
            400 => Error::InvalidRequest(message),
            404 => Error::NotFound(message),
            409 => Error::Conflict(message),
            _ => Error::Api {
                status,
                code: body.map(|b| b.code),
                message,
            },
        }
    }
}
