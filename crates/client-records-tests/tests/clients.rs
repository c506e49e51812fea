//! Client CRUD endpoint tests.

use client_records_client::{ClientUpdate, Error, NewClient};
use client_records_tests::{create_test_client, unique_email};

#[tokio::test]
async fn test_client_lifecycle() {
    let client = create_test_client().expect("Failed to create client");
    let email = unique_email("lifecycle");

    // Create
    let created = client
        .create_client(&NewClient::new("Ada Lovelace", &email).with_company("Engines"))
        .await
        .expect("Failed to create client");
    assert!(created.success);
    assert_eq!(
        created.message.as_deref(),
        Some("Client created successfully")
    );
    assert_eq!(created.data.email, email);
    assert_eq!(created.data.company.as_deref(), Some("Engines"));
    let id = created.data.id;

    // Read
    let fetched = client.get_client(id).await.expect("Failed to get client");
    assert_eq!(fetched.data, created.data);

    // Update
    let updated = client
        .update_client(
            id,
            &ClientUpdate {
                phone: Some(Some("555-0100".to_string())),
                ..ClientUpdate::default()
            },
        )
        .await
        .expect("Failed to update client");
    assert_eq!(updated.data.phone.as_deref(), Some("555-0100"));
    assert_eq!(updated.data.full_name, "Ada Lovelace");

    // Clear with an explicit null
    let cleared = client
        .update_client(
            id,
            &ClientUpdate {
                company: Some(None),
                ..ClientUpdate::default()
            },
        )
        .await
        .expect("Failed to clear company");
    assert_eq!(cleared.data.company, None);
    assert_eq!(cleared.data.phone.as_deref(), Some("555-0100"));

    // Listed
    let list = client.list_clients().await.expect("Failed to list clients");
    assert_eq!(list.count, list.data.len());
    assert!(list.data.iter().any(|c| c.id == id));

    // Delete
    let deleted = client
        .delete_client(id)
        .await
        .expect("Failed to delete client");
    assert_eq!(deleted.data.id, id);

    let result = client.get_client(id).await;
    assert!(matches!(result, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn test_count_increases_after_create() {
    let client = create_test_client().expect("Failed to create client");

    let created = client
        .create_client(&NewClient::new("Grace Hopper", &unique_email("count")))
        .await
        .expect("Failed to create client");
    let count = client
        .count_clients()
        .await
        .expect("Failed to count clients");
    assert!(count.count >= 1);

    client
        .delete_client(created.data.id)
        .await
        .expect("Failed to delete client");
}

#[tokio::test]
async fn test_duplicate_email_conflicts() {
    let client = create_test_client().expect("Failed to create client");
    let email = unique_email("duplicate");

    let first = client
        .create_client(&NewClient::new("First", &email))
        .await
        .expect("Failed to create client");
    let second = client
        .create_client(&NewClient::new("Second", &email))
        .await;
    assert!(matches!(second, Err(Error::Conflict(_))));

    client
        .delete_client(first.data.id)
        .await
        .expect("Failed to delete client");
}

#[tokio::test]
async fn test_create_requires_fields() {
    let client = create_test_client().expect("Failed to create client");

    let result = client.create_client(&NewClient::new("No Email", "")).await;

    match result {
        Err(Error::InvalidRequest(message)) => {
            assert_eq!(message, "full_name and email are required fields");
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_empty_update_is_rejected() {
    let client = create_test_client().expect("Failed to create client");
    let created = client
        .create_client(&NewClient::new("Empty Update", &unique_email("empty")))
        .await
        .expect("Failed to create client");

    let result = client
        .update_client(created.data.id, &ClientUpdate::default())
        .await;
    assert!(matches!(result, Err(Error::InvalidRequest(_))));

    client
        .delete_client(created.data.id)
        .await
        .expect("Failed to delete client");
}

#[tokio::test]
async fn test_empty_update_of_missing_client_is_not_found() {
    let client = create_test_client().expect("Failed to create client");

    let result = client
        .update_client(i64::MAX, &ClientUpdate::default())
        .await;

    assert!(matches!(result, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn test_missing_client_is_not_found() {
    let client = create_test_client().expect("Failed to create client");

    assert!(matches!(
        client.get_client(i64::MAX).await,
        Err(Error::NotFound(_))
    ));
    assert!(matches!(
        client.delete_client(i64::MAX).await,
        Err(Error::NotFound(_))
    ));
}
