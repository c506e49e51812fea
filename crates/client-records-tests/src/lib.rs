//! Integration tests for the Client Records API.
//!
//! These tests require the API server to be running against a migrated
//! database. Configure the server URL via the `API_BASE_URL` environment
//! variable (default: `http://localhost:3000`).

use client_records_client::{ClientConfig, ClientRecordsClient};
use std::time::Duration;

/// Gets the API base URL from environment or uses default.
#[must_use]
pub fn get_api_url() -> String {
    std::env::var("API_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// Creates a test client configured for the API.
///
/// # Errors
/// Returns error if client creation fails.
pub fn create_test_client() -> Result<ClientRecordsClient, client_records_client::Error> {
    ClientRecordsClient::new(ClientConfig {
        base_url: get_api_url(),
        timeout: Duration::from_secs(10),
    })
}

/// Generates a unique email to avoid conflicts between tests.
#[must_use]
pub fn unique_email(prefix: &str) -> String {
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::{SystemTime, UNIX_EPOCH};

    static COUNTER: AtomicU64 = AtomicU64::new(0);

    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64;
    let counter = COUNTER.fetch_add(1, Ordering::Relaxed);

    format!("{}_{}_{}@example.com", prefix, ts, counter)
}
