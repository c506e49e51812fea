//! Database error types.

use crate::secrets::SecretError;
use std::time::Duration;
use thiserror::Error;

/// SQLSTATE codes PostgreSQL reports when a created object already exists.
const ALREADY_EXISTS_CODES: &[&str] = &[
    "42P07", // duplicate_table
    "42710", // duplicate_object
    "42701", // duplicate_column
    "42P06", // duplicate_schema
    "42723", // duplicate_function
    "42P04", // duplicate_database
];

/// SQLSTATE for unique constraint violations.
const UNIQUE_VIOLATION: &str = "23505";

/// Database error types.
#[derive(Debug, Error)]
pub enum DbError {
    /// Required connection settings are missing.
    #[error("missing required database settings: {}", .missing.join(", "))]
    Configuration {
        /// Environment names of the missing settings.
        missing: Vec<&'static str>,
    },

    /// The liveness probe or the transport failed.
    #[error("failed to connect to the database: {0}")]
    Connection(#[source] sqlx::Error),

    /// The database password could not be resolved.
    #[error("failed to resolve database password: {0}")]
    Secret(#[from] SecretError),

    /// An operation did not complete within its bound.
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        /// Operation that timed out.
        operation: &'static str,
        /// Elapsed bound.
        after: Duration,
    },

    /// A statement failed because its target object already exists.
    #[error("object already exists: {0}")]
    AlreadyExists(String),

    /// A statement failed.
    #[error("query failed: {0}")]
    Query(#[from] sqlx::Error),
}

impl DbError {
    /// Classifies a statement failure, separating duplicate-object errors.
    #[must_use]
    pub fn from_statement(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            let code_matches = db
                .code()
                .is_some_and(|code| ALREADY_EXISTS_CODES.contains(&code.as_ref()));
            if code_matches || db.message().contains("already exists") {
                return DbError::AlreadyExists(db.message().to_string());
            }
        }
        DbError::Query(err)
    }

    /// Returns true for a unique constraint violation.
    #[must_use]
    pub fn is_unique_violation(&self) -> bool {
        match self {
            DbError::Query(sqlx::Error::Database(db)) => {
                db.code().is_some_and(|code| code == UNIQUE_VIOLATION)
            }
            _ => false,
        }
    }

    /// Returns true if the error stems from an exceeded time bound.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            DbError::Timeout { .. } | DbError::Secret(SecretError::Timeout { .. })
        )
    }
}
