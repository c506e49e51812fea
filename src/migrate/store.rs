//! PostgreSQL-backed migration ledger.

use super::MigrationStore;
use crate::db::{DbError, PgConnector, PoolManager, SqlValue};
use async_trait::async_trait;
use sqlx::Row;

/// Name of the ledger table.
pub const LEDGER_TABLE: &str = "schema_migrations";

const CREATE_LEDGER: &str = "CREATE TABLE IF NOT EXISTS schema_migrations (
    id SERIAL PRIMARY KEY,
    migration_name VARCHAR(255) NOT NULL UNIQUE,
    executed_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
)";

#[async_trait]
impl MigrationStore for PoolManager<PgConnector> {
    async fn ensure_ledger(&self) -> Result<(), DbError> {
        self.execute_script(CREATE_LEDGER).await
    }

    async fn applied_migrations(&self) -> Result<Vec<String>, DbError> {
        let rows = self
            .query(
                "SELECT migration_name FROM schema_migrations ORDER BY executed_at, id",
                &[],
            )
            .await?;
        rows.iter()
            .map(|row| row.try_get::<String, _>("migration_name").map_err(DbError::from))
            .collect()
    }

    async fn execute(&self, statement: &str) -> Result<(), DbError> {
        self.execute_script(statement).await
    }

    async fn record(&self, name: &str) -> Result<(), DbError> {
        self.query(
            "INSERT INTO schema_migrations (migration_name) VALUES ($1)",
            &[SqlValue::from(name)],
        )
        .await?;
        Ok(())
    }

    async fn record_if_absent(&self, name: &str) -> Result<(), DbError> {
        self.query(
            "INSERT INTO schema_migrations (migration_name) VALUES ($1) \
             ON CONFLICT (migration_name) DO NOTHING",
            &[SqlValue::from(name)],
        )
        .await?;
        Ok(())
    }

    async fn release(&self) {
        self.close_pool().await;
    }
}
