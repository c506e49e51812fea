//! Request and response models for the REST API.

use crate::db::Client;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service version.
    pub version: String,
}

/// Response listing clients.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ClientListResponse {
    /// Always true.
    pub success: bool,
    /// Number of clients in `data`.
    pub count: usize,
    /// Clients, newest first.
    pub data: Vec<Client>,
}

/// Response carrying the total number of clients.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ClientCountResponse {
    /// Always true.
    pub success: bool,
    /// Total clients.
    pub count: i64,
}

/// Response carrying a single client.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ClientResponse {
    /// Always true.
    pub success: bool,
    /// Outcome message for mutations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// The client.
    pub data: Client,
}

impl ClientResponse {
    /// Wraps a fetched client.
    #[must_use]
    pub fn found(data: Client) -> Self {
        Self {
            success: true,
            message: None,
            data,
        }
    }

    /// Wraps a mutated client with a message.
    #[must_use]
    pub fn with_message(message: &str, data: Client) -> Self {
        Self {
            success: true,
            message: Some(message.to_string()),
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn sample_client() -> Client {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        Client {
            id: 1,
            full_name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            phone: None,
            company: Some("Analytical Engines".to_string()),
            created_at: ts,
            updated_at: ts,
        }
    }

    #[test]
    fn test_client_response_found_omits_message() {
        let json = serde_json::to_string(&ClientResponse::found(sample_client())).unwrap();
        assert!(json.contains("\"success\":true"));
        assert!(!json.contains("\"message\""));
        assert!(json.contains("\"email\":\"ada@example.com\""));
        assert!(json.contains("\"phone\":null"));
    }

    #[test]
    fn test_client_response_with_message() {
        let response = ClientResponse::with_message("Client created successfully", sample_client());
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"message\":\"Client created successfully\""));
    }

    #[test]
    fn test_client_list_response_serialization() {
        let response = ClientListResponse {
            success: true,
            count: 1,
            data: vec![sample_client()],
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"count\":1"));
        assert!(json.contains("\"full_name\":\"Ada Lovelace\""));
    }
}
