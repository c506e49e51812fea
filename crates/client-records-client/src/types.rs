//! Request and response types for the Client Records API.

use serde::{Deserialize, Serialize};


/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service version.
    pub version: String,
}

/// A client record.
///
/// Timestamps are kept as the RFC 3339 strings sent by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    /// Unique identifier.
    pub id: i64,
    /// Full name.
    pub full_name: String,
    /// Email address.
    pub email: String,
    /// Phone number.
    pub phone: Option<String>,
    /// Company name.
    pub company: Option<String>,
    /// Creation timestamp.
    pub created_at: String,
    /// Last modification timestamp.
    pub updated_at: String,
}

/// Body for creating a client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewClient {
    /// Full name.
    pub full_name: String,
    /// Email address.
    pub email: String,
    /// Phone number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Company name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
}

impl NewClient {
    /// Creates a body with the required fields.
    #[must_use]
    pub fn new(full_name: &str, email: &str) -> Self {
        Self {
            full_name: full_name.to_string(),
            email: email.to_string(),
            phone: None,
            company: None,
        }
    }

    /// Sets the phone number.
    #[must_use]
    pub fn with_phone(mut self, phone: &str) -> Self {
        self.phone = Some(phone.to_string());
        self
    }

    /// Sets the company name.
    #[must_use]
    pub fn with_company(mut self, company: &str) -> Self {
        self.company = Some(company.to_string());
        self
    }
}

/// Body for a partial update. Only set fields are sent; `Some(None)` is
/// sent as `null` and clears the field.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ClientUpdate {
    /// New full name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<Option<String>>,
    /// New email address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<Option<String>>,
    /// New phone number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<Option<String>>,
    /// New company name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<Option<String>>,
}

/// Response listing clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientListResponse {
    /// Always true.
    pub success: bool,
    /// Number of clients.
    pub count: usize,
    /// Clients, newest first.
    pub data: Vec<Client>,
}

/// Response carrying the client count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientCountResponse {
    /// Always true.
    pub success: bool,
    /// Total clients.
    pub count: i64,
}

/// Response carrying one client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientResponse {
    /// Always true.
    pub success: bool,
    /// Outcome message for mutations.
    #[serde(default)]
    pub message: Option<String>,
    /// The client.
    pub data: Client,
}

/// Error body returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Always false.
    pub success: bool,
    /// Short error title.
    pub error: String,
    /// Detail message.
    pub message: String,
    /// Error code.
    pub code: String,
}
