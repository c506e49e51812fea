//! Verifies database connectivity and prints basic server information.

use anyhow::Context;
use client_records_backend::config::Config;
use client_records_backend::db::{self, PoolManager};
use client_records_backend::logging::init_tracing;
use sqlx::Row;
use std::process::ExitCode;
use tracing::{error, info};

async fn check(db: &PoolManager) -> anyhow::Result<()> {
    info!("Testing database connection...");

    let rows = db.query("SELECT 1 + 1 AS result", &[]).await?;
    let result: i32 = rows
        .first()
        .context("SELECT 1 + 1 returned no rows")?
        .try_get("result")?;
    info!("Database connection successful, 1 + 1 = {}", result);

    let pool = db.get_pool().await?;
    let total = db::count_clients(&pool)
        .await
        .context("failed to count clients, has the migration run?")?;
    info!("Clients table contains {} record(s)", total);

    let mut conn = db.get_connection().await?;
    let (version,): (String,) = sqlx::query_as("SELECT version()")
        .fetch_one(&mut *conn)
        .await?;
    info!("Server version: {}", version);

    Ok(())
}

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

    let outcome = check(&db).await;
    db.close_pool().await;

    match outcome {
        Ok(()) => {
            info!("All connection checks passed");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Connection check failed: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
