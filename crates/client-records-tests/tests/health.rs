//! Health check and status endpoint tests.

use client_records_tests::create_test_client;

#[tokio::test]
async fn test_health_check() {
    let client = create_test_client().expect("Failed to create client");

    let health = client.health_check().await.expect("Health check failed");

    assert_eq!(health.status, "healthy");
    assert!(!health.version.is_empty());
}

#[tokio::test]
async fn test_status_page() {
    let client = create_test_client().expect("Failed to create client");

    let page = client.status_page().await.expect("Status page failed");

    assert!(page.contains("Client Information System"));
    assert!(page.contains("Total clients in database:"));
}
