//! Unit tests for secrets module.

use super::gcp::{AccessSecretVersionResponse, SecretPayload, decode_payload, secret_version_name};
use super::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// In-memory store counting how often it is asked for a value.
struct CountingStore {
    values: HashMap<String, String>,
    calls: AtomicUsize,
    delay: Duration,
}

impl CountingStore {
    fn with(name: &str, value: &str) -> Self {
        Self {
            values: HashMap::from([(name.to_string(), value.to_string())]),
            calls: AtomicUsize::new(0),
            delay: Duration::ZERO,
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SecretStore for CountingStore {
    async fn access_latest(&self, name: &str) -> Result<Vec<u8>, SecretError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.values
            .get(name)
            .map(|value| value.as_bytes().to_vec())
            .ok_or_else(|| SecretError::NotFound {
                name: name.to_string(),
            })
    }
}

fn resolver(store: Arc<CountingStore>) -> SecretResolver {
    SecretResolver::new(store, Duration::from_secs(5))
}

// ============================================================================
// Resolution and caching
// ============================================================================

#[tokio::test]
async fn test_resolve_trims_whitespace() {
    let store = Arc::new(CountingStore::with("db-password", "  hunter2\n"));
    let secrets = resolver(Arc::clone(&store));

    let value = secrets.resolve("db-password").await.unwrap();
    assert_eq!(value, "hunter2");
}

#[tokio::test]
async fn test_sequential_resolution_fetches_once() {
    let store = Arc::new(CountingStore::with("db-password", "hunter2"));
    let secrets = resolver(Arc::clone(&store));

    let first = secrets.resolve("db-password").await.unwrap();
    let second = secrets.resolve("db-password").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(store.calls(), 1);
    assert!(secrets.is_cached("db-password"));
}

#[tokio::test]
async fn test_concurrent_first_resolution_fetches_once() {
    let mut store = CountingStore::with("db-password", "hunter2");
    store.delay = Duration::from_millis(50);
    let store = Arc::new(store);
    let secrets = resolver(Arc::clone(&store));

    let (a, b) = tokio::join!(secrets.resolve("db-password"), secrets.resolve("db-password"));

    assert_eq!(a.unwrap(), "hunter2");
    assert_eq!(b.unwrap(), "hunter2");
    assert_eq!(store.calls(), 1);
}

#[tokio::test]
async fn test_clear_cache_forces_refetch() {
    let store = Arc::new(CountingStore::with("db-password", "hunter2"));
    let secrets = resolver(Arc::clone(&store));

    secrets.resolve("db-password").await.unwrap();
    secrets.clear_cache();
    assert!(!secrets.is_cached("db-password"));

    secrets.resolve("db-password").await.unwrap();
    assert_eq!(store.calls(), 2);
}

#[tokio::test]
async fn test_missing_secret_is_not_cached() {
    let store = Arc::new(CountingStore::with("db-password", "hunter2"));
    let secrets = resolver(Arc::clone(&store));

    let err = secrets.resolve("other").await.unwrap_err();
    assert!(matches!(err, SecretError::NotFound { ref name } if name == "other"));
    assert!(!secrets.is_cached("other"));

    let _ = secrets.resolve("other").await;
    assert_eq!(store.calls(), 2);
}

#[tokio::test]
async fn test_fetch_timeout() {
    let mut store = CountingStore::with("db-password", "hunter2");
    store.delay = Duration::from_secs(5);
    let secrets = SecretResolver::new(Arc::new(store), Duration::from_millis(20));

    let err = secrets.resolve("db-password").await.unwrap_err();
    assert!(matches!(err, SecretError::Timeout { .. }));
}

#[tokio::test]
async fn test_invalid_utf8_payload() {
    struct BinaryStore;

    #[async_trait]
    impl SecretStore for BinaryStore {
        async fn access_latest(&self, _name: &str) -> Result<Vec<u8>, SecretError> {
            Ok(vec![0xff, 0xfe])
        }
    }

    let secrets = SecretResolver::new(Arc::new(BinaryStore), Duration::from_secs(1));
    let err = secrets.resolve("binary").await.unwrap_err();
    assert!(matches!(err, SecretError::Fetch { .. }));
}

// ============================================================================
// Password source selection
// ============================================================================

#[tokio::test]
async fn test_local_password_used_without_secret_name() {
    let store = Arc::new(CountingStore::with("db-password", "remote"));
    let secrets = resolver(Arc::clone(&store));

    let password = secrets.resolve_password(Some("local"), None).await.unwrap();
    assert_eq!(password.as_deref(), Some("local"));
    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn test_secret_name_overrides_local_password() {
    let store = Arc::new(CountingStore::with("db-password", "remote"));
    let secrets = resolver(Arc::clone(&store));

    let password = secrets
        .resolve_password(Some("local"), Some("db-password"))
        .await
        .unwrap();
    assert_eq!(password.as_deref(), Some("remote"));
    assert_eq!(store.calls(), 1);
}

#[tokio::test]
async fn test_no_password_source() {
    let store = Arc::new(CountingStore::with("db-password", "remote"));
    let secrets = resolver(Arc::clone(&store));

    let password = secrets.resolve_password(None, None).await.unwrap();
    assert!(password.is_none());
    assert_eq!(store.calls(), 0);
}

// ============================================================================
// Secret Manager helpers
// ============================================================================

#[test]
fn test_secret_version_name() {
    assert_eq!(
        secret_version_name("my-project", "db-password"),
        "projects/my-project/secrets/db-password/versions/latest"
    );
}

#[test]
fn test_decode_payload() {
    let body = AccessSecretVersionResponse {
        payload: SecretPayload {
            data: "aHVudGVyMgo=".to_string(),
        },
    };

    let bytes = decode_payload("db-password", &body).unwrap();
    assert_eq!(bytes, b"hunter2\n");
}

#[test]
fn test_decode_payload_rejects_garbage() {
    let body = AccessSecretVersionResponse {
        payload: SecretPayload {
            data: "not base64!".to_string(),
        },
    };

    assert!(decode_payload("db-password", &body).is_err());
}

#[test]
fn test_access_response_deserialization() {
    let json = r#"{"name":"projects/1/secrets/db-password/versions/3","payload":{"data":"aHVudGVyMg==","dataCrc32c":"123"}}"#;
    let body: AccessSecretVersionResponse = serde_json::from_str(json).unwrap();
    assert_eq!(decode_payload("db-password", &body).unwrap(), b"hunter2");
}

#[test]
fn test_secret_error_display() {
    let error = SecretError::NotFound {
        name: "db-password".to_string(),
    };
    assert_eq!(format!("{}", error), "secret not found: db-password");
}
