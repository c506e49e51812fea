//! Error types for the REST API.

use crate::db::DbError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;


/// API error response body.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Always false.
    pub success: bool,
    /// Short error title.
    pub error: String,
    /// Human-readable detail.
    pub message: String,
    /// Error code.
    pub code: String,
}

/// API error types.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Client not found.
    #[error("No client found with ID: {0}")]
    ClientNotFound(i64),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Request body failed validation.
    #[error("{0}")]
    Validation(String),

    /// Update request carried no fields.
    #[error("Please provide at least one field to update")]
    NoFieldsToUpdate,

    /// Email already used by another client.
    #[error("A client with this email already exists")]
    DuplicateEmail,

    /// Database error.
    #[error("{context}: {message}")]
    Database {
        /// Failed operation, e.g. "Failed to fetch clients".
        context: &'static str,
        /// Underlying error message.
        message: String,
    },

    /// No route matches the request.
    #[error("Cannot {method} {path}")]
    RouteNotFound {
        /// Request method.
        method: String,
        /// Request path.
        path: String,
    },
}

impl ApiError {
    /// Wraps a database failure, mapping unique violations to
    /// [`ApiError::DuplicateEmail`].
    #[must_use]
    pub fn database(context: &'static str, err: DbError) -> Self {
        if err.is_unique_violation() {
            return ApiError::DuplicateEmail;
        }
        error!("{}: {}", context, err);
        ApiError::Database {
            context,
            message: err.to_string(),
        }
    }

    /// Returns the HTTP status code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::ClientNotFound(_) | ApiError::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::InvalidRequest(_)
            | ApiError::Validation(_)
            | ApiError::NoFieldsToUpdate => StatusCode::BAD_REQUEST,
            ApiError::DuplicateEmail => StatusCode::CONFLICT,
            ApiError::Database { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the short error title and the error code.
    fn title_and_code(&self) -> (&'static str, &'static str) {
        match self {
            ApiError::ClientNotFound(_) => ("Client not found", "CLIENT_NOT_FOUND"),
            ApiError::InvalidRequest(_) => ("Invalid request", "INVALID_REQUEST"),
            ApiError::Validation(_) => ("Validation error", "VALIDATION_ERROR"),
            ApiError::NoFieldsToUpdate => ("No fields to update", "NO_FIELDS_TO_UPDATE"),
            ApiError::DuplicateEmail => ("Duplicate email", "DUPLICATE_EMAIL"),
            ApiError::Database { context, .. } => (*context, "DATABASE_ERROR"),
            ApiError::RouteNotFound { .. } => ("Route not found", "ROUTE_NOT_FOUND"),
        }
    }

    /// Builds the response body.
    #[must_use]
    pub fn to_body(&self) -> ErrorResponse {
        let (title, code) = self.title_and_code();
        let message = match self {
            ApiError::Database { message, .. } => message.clone(),
            ApiError::InvalidRequest(message) => message.clone(),
            other => other.to_string(),
        };
        ErrorResponse {
            success: false,
            error: title.to_string(),
            message,
            code: code.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.to_body())).into_response()
    }
}
