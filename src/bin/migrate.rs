//! Applies pending SQL migrations and exits.
//!
//! Exits with status 0 when every pending migration was applied (or none
//! were pending) and 1 on any failure. The pool is closed on both paths.

use client_records_backend::config::Config;
use client_records_backend::db::PoolManager;
use client_records_backend::logging::init_tracing;
use client_records_backend::migrate::MigrationRunner;
use std::process::ExitCode;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let db = match PoolManager::from_config(&config) {
        Ok(db) => db,
        Err(e) => {
            error!("Failed to set up secret store client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let runner = MigrationRunner::new(&config.migrations.dir);
    match runner.run(&db).await {
        Ok(report) => {
            info!(
                discovered = report.discovered.len(),
                applied = report.applied.len(),
                forced = report.forced.len(),
                "Migration run finished"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Migration failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
