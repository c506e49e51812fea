//! Secret resolution with in-process caching.
//!
//! Database credentials can come from two places: a plain-text value in the
//! local configuration (handy for development against a local database), or
//! a remote secret store such as Google Cloud Secret Manager. The
//! [`SecretResolver`] hides that choice from the pool manager and caches
//! every remotely fetched value for the lifetime of the resolver.

mod gcp;

#[cfg(test)]
mod tests;

pub use gcp::GcpSecretStore;

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{debug, info};

/// Secret store error types.
#[derive(Debug, Error)]
pub enum SecretError {
    /// The secret, or its latest version, does not exist.
    #[error("secret not found: {name}")]
    NotFound {
        /// Secret name.
        name: String,
    },

    /// The store could not be reached or returned an unusable payload.
    #[error("failed to fetch secret {name}: {reason}")]
    Fetch {
        /// Secret name.
        name: String,
        /// Failure description.
        reason: String,
    },

    /// The fetch did not complete within the configured bound.
    #[error("timed out fetching secret {name} after {after:?}")]
    Timeout {
        /// Secret name.
        name: String,
        /// Elapsed bound.
        after: Duration,
    },
}

/// A remote store holding secret values.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Returns the raw payload of the latest version of `name`.
    async fn access_latest(&self, name: &str) -> Result<Vec<u8>, SecretError>;
}

/// Resolves secrets, fetching each name from the store at most once.
///
/// Every cache entry is a one-shot cell, so concurrent first resolutions of
/// the same name share a single remote fetch. A failed fetch leaves the cell
/// empty and the next call retries.
pub struct SecretResolver {
    store: Arc<dyn SecretStore>,
    cache: DashMap<String, Arc<OnceCell<String>>>,
    fetch_timeout: Duration,
}

impl SecretResolver {
    /// Creates a resolver backed by `store`.
    #[must_use]
    pub fn new(store: Arc<dyn SecretStore>, fetch_timeout: Duration) -> Self {
        Self {
            store,
            cache: DashMap::new(),
            fetch_timeout,
        }
    }

    /// Resolves `name`, returning the cached value when one exists.
    ///
    /// # Errors
    /// Returns [`SecretError`] if the store is unreachable, the secret is
    /// missing, or the fetch times out.
    pub async fn resolve(&self, name: &str) -> Result<String, SecretError> {
        let cell = self.cache.entry(name.to_string()).or_default().clone();

        if let Some(value) = cell.get() {
            debug!(secret = name, "Using cached secret");
            return Ok(value.clone());
        }

        let value = cell.get_or_try_init(|| self.fetch(name)).await?;
        Ok(value.clone())
    }

    /// Resolves the database password.
    ///
    /// A local literal wins only when no secret name is configured. Returns
    /// `Ok(None)` when neither source is present.
    ///
    /// # Errors
    /// Returns [`SecretError`] if the remote fetch fails.
    pub async fn resolve_password(
        &self,
        local: Option<&str>,
        secret_name: Option<&str>,
    ) -> Result<Option<String>, SecretError> {
        match (local, secret_name) {
            (_, Some(name)) => self.resolve(name).await.map(Some),
            (Some(password), None) => {
                debug!("Using database password from local configuration");
                Ok(Some(password.to_string()))
            }
            (None, None) => Ok(None),
        }
    }

    /// Returns true if a value for `name` is cached.
    #[must_use]
    pub fn is_cached(&self, name: &str) -> bool {
        self.cache
            .get(name)
            .is_some_and(|cell| cell.initialized())
    }

    /// Drops every cached value.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    async fn fetch(&self, name: &str) -> Result<String, SecretError> {
        info!(secret = name, "Fetching secret from secret store");

        let payload = tokio::time::timeout(self.fetch_timeout, self.store.access_latest(name))
            .await
            .map_err(|_| SecretError::Timeout {
                name: name.to_string(),
                after: self.fetch_timeout,
            })??;

        let value = String::from_utf8(payload).map_err(|e| SecretError::Fetch {
            name: name.to_string(),
            reason: format!("payload is not valid UTF-8: {e}"),
        })?;

        info!(secret = name, "Secret retrieved");
        Ok(value.trim().to_string())
    }
}
