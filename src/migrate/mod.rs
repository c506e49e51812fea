//! SQL migration runner.
//!
//! Migrations are plain `*.sql` files applied in file-name order. A ledger
//! table records every applied file so that re-running the runner only
//! executes files it has not seen before.
//!
//! Runs are not wrapped in a transaction: files applied before a failure
//! stay recorded, and the next run resumes at the failed file. A file whose
//! statements fail only because their objects already exist is recorded as
//! applied and the run continues.

mod store;

#[cfg(test)]
mod tests;

pub use store::LEDGER_TABLE;

use crate::db::DbError;
use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// File suffix recognized as a migration.
pub const MIGRATION_SUFFIX: &str = ".sql";

/// Migration error types.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// The migrations directory or a migration file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The ledger could not be created, read or written.
    #[error("migration ledger error: {0}")]
    Ledger(#[from] DbError),

    /// A statement of a migration failed.
    #[error("migration {migration} failed: {source}")]
    Execution {
        /// File name of the failed migration.
        migration: String,
        /// Statement failure.
        #[source]
        source: DbError,
    },
}

/// Persistence used by the runner.
#[async_trait]
pub trait MigrationStore: Send + Sync {
    /// Creates the ledger table if absent.
    async fn ensure_ledger(&self) -> Result<(), DbError>;

    /// Returns applied migration names ordered by application time.
    async fn applied_migrations(&self) -> Result<Vec<String>, DbError>;

    /// Executes one statement.
    async fn execute(&self, statement: &str) -> Result<(), DbError>;

    /// Records a migration as applied.
    async fn record(&self, name: &str) -> Result<(), DbError>;

    /// Records a migration, ignoring an existing record of the same name.
    async fn record_if_absent(&self, name: &str) -> Result<(), DbError>;

    /// Releases the underlying connections.
    async fn release(&self);
}

/// Outcome of a successful run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Migration files found on disk.
    pub discovered: Vec<String>,
    /// Migrations executed and recorded in this run.
    pub applied: Vec<String>,
    /// Migrations recorded because their objects already existed.
    pub forced: Vec<String>,
}

impl MigrationReport {
    /// Returns true if the run changed nothing.
    #[must_use]
    pub fn is_up_to_date(&self) -> bool {
        self.applied.is_empty() && self.forced.is_empty()
    }
}

/// Applies pending migrations from a directory.
#[derive(Debug, Clone)]
pub struct MigrationRunner {
    dir: PathBuf,
}

impl MigrationRunner {
    /// Creates a runner for `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the migrations directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Applies every pending migration, then releases the store.
    ///
    /// The store is released on every exit path, including failures.
    ///
    /// # Errors
    /// Returns [`MigrationError::Execution`] on the first statement failure
    /// that is not an "already exists" condition; later migrations are not
    /// attempted.
    pub async fn run<S: MigrationStore + ?Sized>(
        &self,
        store: &S,
    ) -> Result<MigrationReport, MigrationError> {
        info!("Starting database migrations");
        let result = self.apply_pending(store).await;
        store.release().await;
        result
    }

    async fn apply_pending<S: MigrationStore + ?Sized>(
        &self,
        store: &S,
    ) -> Result<MigrationReport, MigrationError> {
        store.ensure_ledger().await?;
        info!("Migrations table ready");

        let applied: HashSet<String> = store.applied_migrations().await?.into_iter().collect();
        let discovered = self.discover().await?;
        let pending: Vec<&String> = discovered
            .iter()
            .filter(|name| !applied.contains(*name))
            .collect();

        let mut report = MigrationReport {
            discovered: discovered.clone(),
            ..MigrationReport::default()
        };

        if pending.is_empty() {
            info!("No pending migrations, database is up to date");
            return Ok(report);
        }

        info!("Found {} pending migration(s)", pending.len());
        for name in &pending {
            info!("  - {}", name);
        }

        for name in pending {
            if self.apply(store, name).await? {
                report.applied.push(name.clone());
            } else {
                report.forced.push(name.clone());
            }
        }

        info!(
            applied = report.applied.len(),
            forced = report.forced.len(),
            "All migrations completed successfully"
        );
        Ok(report)
    }

    /// Applies one migration. Returns false when it was recorded because
    /// its objects already existed.
    async fn apply<S: MigrationStore + ?Sized>(
        &self,
        store: &S,
        name: &str,
    ) -> Result<bool, MigrationError> {
        let path = self.dir.join(name);
        let sql = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| MigrationError::Io {
                path: path.clone(),
                source,
            })?;

        info!(migration = name, "Running migration");

        for statement in split_statements(&sql) {
            match store.execute(&statement).await {
                Ok(()) => {}
                Err(DbError::AlreadyExists(message)) => {
                    warn!(
                        migration = name,
                        "Migration already applied ({}), marking as executed", message
                    );
                    store.record_if_absent(name).await?;
                    return Ok(false);
                }
                Err(source) => {
                    return Err(MigrationError::Execution {
                        migration: name.to_string(),
                        source,
                    });
                }
            }
        }

        store.record(name).await?;
        info!(migration = name, "Migration completed successfully");
        Ok(true)
    }

    /// Lists migration files in execution order, creating the directory
    /// when it does not exist.
    ///
    /// # Errors
    /// Returns [`MigrationError::Io`] if the directory cannot be read.
    pub async fn discover(&self) -> Result<Vec<String>, MigrationError> {
        let io_error = |source| MigrationError::Io {
            path: self.dir.clone(),
            source,
        };

        if !tokio::fs::try_exists(&self.dir).await.map_err(io_error)? {
            info!(dir = %self.dir.display(), "No migrations directory found, creating it");
            tokio::fs::create_dir_all(&self.dir).await.map_err(io_error)?;
            return Ok(Vec::new());
        }

        let mut entries = tokio::fs::read_dir(&self.dir).await.map_err(io_error)?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(io_error)? {
            let is_file = entry.file_type().await.map_err(io_error)?.is_file();
            let file_name = entry.file_name();
            if let Some(name) = file_name.to_str()
                && is_file
                && name.ends_with(MIGRATION_SUFFIX)
            {
                names.push(name.to_string());
            }
        }

        names.sort();
        Ok(names)
    }
}

/// Splits a migration script into statements on `;`.
///
/// Leading `--` comment lines are stripped from every fragment, and
/// fragments left empty are dropped. The splitter does not understand SQL
/// string literals or dollar-quoted bodies, so a `;` inside them splits the
/// statement; migrations must avoid embedded semicolons.
#[must_use]
pub fn split_statements(sql: &str) -> Vec<String> {
    sql.split(';')
        .filter_map(|fragment| {
            let body: Vec<&str> = fragment
                .trim()
                .lines()
                .skip_while(|line| {
                    let line = line.trim();
                    line.is_empty() || line.starts_with("--")
                })
                .collect();
            let statement = body.join("\n").trim().to_string();
            (!statement.is_empty()).then_some(statement)
        })
        .collect()
}
