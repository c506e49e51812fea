//! Application state management.

use crate::db::{DbError, PoolManager};
use sqlx::PgPool;
use std::sync::Arc;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Lazily initialized database pool.
    pub db: Arc<PoolManager>,
}

impl AppState {
    /// Creates the application state.
    #[must_use]
    pub fn new(db: Arc<PoolManager>) -> Self {
        Self { db }
    }

    /// Returns the database pool, initializing it on first use.
    ///
    /// # Errors
    /// Returns an error if the pool cannot be initialized.
    pub async fn pool(&self) -> Result<PgPool, DbError> {
        self.db.get_pool().await
    }
}
