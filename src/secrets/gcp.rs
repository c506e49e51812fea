//! Google Cloud Secret Manager backend.

use super::{SecretError, SecretStore};
use crate::config::SecretsConfig;
use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::debug;

const SECRET_MANAGER_URL: &str = "https://secretmanager.googleapis.com/v1";
const METADATA_URL: &str = "http://metadata.google.internal/computeMetadata/v1";
const METADATA_FLAVOR: (&str, &str) = ("Metadata-Flavor", "Google");

#[derive(Debug, Deserialize)]
pub(crate) struct AccessSecretVersionResponse {
    pub(crate) payload: SecretPayload,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SecretPayload {
    pub(crate) data: String,
}

#[derive(Debug, Deserialize)]
struct MetadataToken {
    access_token: String,
}

/// Secret store backed by the Secret Manager REST API.
///
/// Credentials come from `access_token` when configured, otherwise from the
/// metadata server available on App Engine, Cloud Run and GCE.
pub struct GcpSecretStore {
    http: Client,
    api_url: String,
    metadata_url: String,
    access_token: Option<String>,
    project_id: OnceCell<String>,
}

impl GcpSecretStore {
    /// Creates a store from the secrets configuration.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &SecretsConfig) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.fetch_timeout_secs))
            .build()?;

        let project_id = match &config.project_id {
            Some(project) => OnceCell::new_with(Some(project.clone())),
            None => OnceCell::new(),
        };

        Ok(Self {
            http,
            api_url: SECRET_MANAGER_URL.to_string(),
            metadata_url: METADATA_URL.to_string(),
            access_token: config.access_token.clone(),
            project_id,
        })
    }

    async fn project_id(&self, name: &str) -> Result<&str, SecretError> {
        let project = self
            .project_id
            .get_or_try_init(|| async {
                debug!("Looking up project id from metadata server");
                let url = format!("{}/project/project-id", self.metadata_url);
                let resp = self
                    .http
                    .get(&url)
                    .header(METADATA_FLAVOR.0, METADATA_FLAVOR.1)
                    .send()
                    .await
                    .map_err(|e| fetch_error(name, format!("project id lookup failed: {e}")))?;
                if !resp.status().is_success() {
                    return Err(fetch_error(
                        name,
                        format!("project id lookup returned {}", resp.status()),
                    ));
                }
                resp.text()
                    .await
                    .map(|text| text.trim().to_string())
                    .map_err(|e| fetch_error(name, e.to_string()))
            })
            .await?;
        Ok(project.as_str())
    }

    async fn access_token(&self, name: &str) -> Result<String, SecretError> {
        if let Some(token) = &self.access_token {
            return Ok(token.clone());
        }

        let url = format!(
            "{}/instance/service-accounts/default/token",
            self.metadata_url
        );
        let resp = self
            .http
            .get(&url)
            .header(METADATA_FLAVOR.0, METADATA_FLAVOR.1)
            .send()
            .await
            .map_err(|e| fetch_error(name, format!("token request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(fetch_error(
                name,
                format!("token request returned {}", resp.status()),
            ));
        }

        let token: MetadataToken = resp
            .json()
            .await
            .map_err(|e| fetch_error(name, e.to_string()))?;
        Ok(token.access_token)
    }
}

#[async_trait]
impl SecretStore for GcpSecretStore {
    async fn access_latest(&self, name: &str) -> Result<Vec<u8>, SecretError> {
        let project = self.project_id(name).await?;
        let token = self.access_token(name).await?;
        let url = format!(
            "{}/{}:access",
            self.api_url,
            secret_version_name(project, name)
        );

        let resp = self
            .http
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| fetch_error(name, e.to_string()))?;

        match resp.status() {
            StatusCode::NOT_FOUND => Err(SecretError::NotFound {
                name: name.to_string(),
            }),
            status if !status.is_success() => {
                let body = resp.text().await.unwrap_or_default();
                Err(fetch_error(name, format!("{status}: {body}")))
            }
            _ => {
                let body: AccessSecretVersionResponse = resp
                    .json()
                    .await
                    .map_err(|e| fetch_error(name, e.to_string()))?;
                decode_payload(name, &body)
            }
        }
    }
}

/// Builds the fully-qualified resource name of the latest secret version.
pub(crate) fn secret_version_name(project: &str, name: &str) -> String {
    format!("projects/{project}/secrets/{name}/versions/latest")
}

pub(crate) fn decode_payload(
    name: &str,
    body: &AccessSecretVersionResponse,
) -> Result<Vec<u8>, SecretError> {
    STANDARD
        .decode(body.payload.data.as_bytes())
        .map_err(|e| fetch_error(name, format!("invalid payload encoding: {e}")))
}

fn fetch_error(name: &str, reason: String) -> SecretError {
    SecretError::Fetch {
        name: name.to_string(),
        reason,
    }
}
