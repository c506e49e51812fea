//! HTTP client for the client records API.

use crate::error::Error;
use crate::types::*;
use reqwest::Client;
use std::time::Duration;


/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the API (e.g., "http://localhost:3000").
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// HTTP client for the Client Records API.
#[derive(Debug, Clone)]
pub struct ClientRecordsClient {
    client: Client,
    base_url: String,
}

impl ClientRecordsClient {
    /// Creates a new client with the given configuration.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self, Error> {
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Creates a new client with default configuration.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn with_base_url(base_url: &str) -> Result<Self, Error> {
        Self::new(ClientConfig {
            base_url: base_url.to_string(),
            ..Default::default()
        })
    }

    /// Returns the normalized base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // ========================================================================
    // Health & Status
    // ========================================================================

    /// Performs a health check.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn health_check(&self) -> Result<HealthResponse, Error> {
        let resp = self.client.get(self.url("/health")).send().await?;
        self.handle_response(resp).await
    }

    /// Fetches the HTML status page.
    ///
    /// # Errors
    /// Returns error if the request fails or the server reports a failure.
    pub async fn status_page(&self) -> Result<String, Error> {
        let resp = self.client.get(self.url("/api/status")).send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        if status.is_success() {
            Ok(text)
        } else {
            Err(Error::from_status(status.as_u16(), text))
        }
    }

    // ========================================================================
    // Clients
    // ========================================================================

    /// Lists all clients, newest first.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn list_clients(&self) -> Result<ClientListResponse, Error> {
        let resp = self.client.get(self.url("/api/clients")).send().await?;
        self.handle_response(resp).await
    }

    /// Counts all clients.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn count_clients(&self) -> Result<ClientCountResponse, Error> {
        let resp = self
            .client
            .get(self.url("/api/clients/count"))
            .send()
            .await?;
        self.handle_response(resp).await
    }

    /// Gets a client by id.
    ///
    /// # Errors
    /// Returns [`Error::NotFound`] if no client has the id.
    pub async fn get_client(&self, id: i64) -> Result<ClientResponse, Error> {
        let url = self.url(&format!("/api/clients/{}", id));
        let resp = self.client.get(&url).send().await?;
        self.handle_response(resp).await
    }

    /// Creates a client.
    ///
    /// # Errors
    /// Returns [`Error::InvalidRequest`] on validation failure and
    /// [`Error::Conflict`] if the email is taken.
    pub async fn create_client(&self, client: &NewClient) -> Result<ClientResponse, Error> {
        let resp = self
            .client
            .post(self.url("/api/clients"))
            .json(client)
            .send()
            .await?;
        self.handle_response(resp).await
    }

    /// Updates the set fields of a client.
    ///
    /// # Errors
    /// Returns [`Error::NotFound`] if no client has the id and
    /// [`Error::InvalidRequest`] if the update is empty.
    pub async fn update_client(
        &self,
        id: i64,
        update: &ClientUpdate,
    ) -> Result<ClientResponse, Error> {
        let url = self.url(&format!("/api/clients/{}", id));
        let resp = self.client.put(&url).json(update).send().await?;
        self.handle_response(resp).await
    }

    /// Deletes a client, returning the removed record.
    ///
    /// # Errors
    /// Returns [`Error::NotFound`] if no client has the id.
    pub async fn delete_client(&self, id: i64) -> Result<ClientResponse, Error> {
        let url = self.url(&format!("/api/clients/{}", id));
        let resp = self.client.delete(&url).send().await?;
        self.handle_response(resp).await
    }

    // ========================================================================
    // Response handling
    // ========================================================================

    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();

        if status.is_success() {
            Ok(resp.json().await?)
        } else {
            let text = resp.text().await.unwrap_or_default();
            Err(Error::from_status(status.as_u16(), text))
        }
    }
}
