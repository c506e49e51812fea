//! Database schema types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Client record from the `clients` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Client {
    /// Unique identifier.
    pub id: i64,
    /// Full name.
    pub full_name: String,
    /// Email address, unique across clients.
    pub email: String,
    /// Phone number.
    pub phone: Option<String>,
    /// Company name.
    pub company: Option<String>,
    /// Record creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Request body for creating a client.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CreateClientRequest {
    /// Full name (required).
    #[serde(default)]
    pub full_name: Option<String>,
    /// Email address (required).
    #[serde(default)]
    pub email: Option<String>,
    /// Phone number.
    #[serde(default)]
    pub phone: Option<String>,
    /// Company name.
    #[serde(default)]
    pub company: Option<String>,
}

/// Validated fields of a new client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewClient {
    /// Full name.
    pub full_name: String,
    /// Email address.
    pub email: String,
    /// Phone number, `None` when absent or empty.
    pub phone: Option<String>,
    /// Company name, `None` when absent or empty.
    pub company: Option<String>,
}

/// Request body for a partial client update.
///
/// Absent fields are left as is. An explicit `null` is a provided value and
/// clears the column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UpdateClientRequest {
    /// New full name.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    #[schema(value_type = Option<String>)]
    pub full_name: Option<Option<String>>,
    /// New email address.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    #[schema(value_type = Option<String>)]
    pub email: Option<Option<String>>,
    /// New phone number, `null` to clear.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    #[schema(value_type = Option<String>)]
    pub phone: Option<Option<String>>,
    /// New company name, `null` to clear.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    #[schema(value_type = Option<String>)]
    pub company: Option<Option<String>>,
}

impl UpdateClientRequest {
    /// Returns true if no field is provided.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.company.is_none()
    }
}

/// Marks a field that appears in the body, `null` included, as provided.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
