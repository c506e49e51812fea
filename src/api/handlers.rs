//! API request handlers.

use crate::db::{self, Client, CreateClientRequest, NewClient, UpdateClientRequest};
use crate::error::{ApiError, ErrorResponse};
use crate::models::{ClientCountResponse, ClientListResponse, ClientResponse, HealthResponse};
use crate::state::AppState;
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{Method, StatusCode, Uri};
use axum::response::Html;
use std::sync::Arc;
use tracing::{error, info};


/// Parses a client id path segment.
fn parse_client_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>()
        .map_err(|_| ApiError::InvalidRequest(format!("Invalid client ID: {}", raw)))
}

/// Unwraps a JSON body, reporting malformed payloads as bad requests.
fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ApiError::InvalidRequest(rejection.body_text()))
}

/// Keeps a value only when it is a non-empty string.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Checks the required fields of a create request. Values are kept as sent.
pub(crate) fn validate_new_client(request: CreateClientRequest) -> Result<NewClient, ApiError> {
    let (Some(full_name), Some(email)) = (non_empty(request.full_name), non_empty(request.email))
    else {
        return Err(ApiError::Validation(
            "full_name and email are required fields".to_string(),
        ));
    };
    Ok(NewClient {
        full_name,
        email,
        phone: non_empty(request.phone),
        company: non_empty(request.company),
    })
}

/// Escapes text for inclusion in HTML.
fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Renders the status page.
pub(crate) fn render_status_page(total_clients: i64) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
  <head>
    <title>Client Information System</title>
  </head>
  <body>
    <h1>Client Information System</h1>
    <p>
      Welcome to the Client Information System.
      This system helps manage and organize client data efficiently.
    </p>
    <p>
      <strong>Total clients in database:</strong> {total_clients}
    </p>
  </body>
</html>
"#
    )
}

/// Renders the status page shown when the database is unreachable.
pub(crate) fn render_status_error_page(message: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
  <head><title>Database Error</title></head>
  <body>
    <h1>Database Connection Failed</h1>
    <p><strong>Error:</strong> {}</p>
  </body>
</html>
"#,
        escape_html(message)
    )
}

// ============================================================================
// Health Check
// ============================================================================

/// Health check endpoint.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "Health"
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// HTML status page with the total number of clients.
#[utoipa::path(
    get,
    path = "/api/status",
    responses(
        (status = 200, description = "Status page", content_type = "text/html"),
        (status = 500, description = "Database unreachable", content_type = "text/html")
    ),
    tag = "Health"
)]
pub async fn status_page(State(state): State<Arc<AppState>>) -> (StatusCode, Html<String>) {
    let total = match state.pool().await {
        Ok(pool) => db::count_clients(&pool).await,
        Err(e) => Err(e),
    };

    match total {
        Ok(total) => (StatusCode::OK, Html(render_status_page(total))),
        Err(e) => {
            error!("Database error: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(render_status_error_page(&e.to_string())),
            )
        }
    }
}

// ============================================================================
// Clients
// ============================================================================

/// List all clients, newest first.
#[utoipa::path(
    get,
    path = "/api/clients",
    responses(
        (status = 200, description = "List of clients", body = ClientListResponse),
        (status = 500, description = "Database error", body = ErrorResponse)
    ),
    tag = "Clients"
)]
pub async fn list_clients(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ClientListResponse>, ApiError> {
    const CONTEXT: &str = "Failed to fetch clients";
    let pool = state.pool().await.map_err(|e| ApiError::database(CONTEXT, e))?;
    let clients = db::list_clients(&pool)
        .await
        .map_err(|e| ApiError::database(CONTEXT, e))?;

    Ok(Json(ClientListResponse {
        success: true,
        count: clients.len(),
        data: clients,
    }))
}

/// Count all clients.
#[utoipa::path(
    get,
    path = "/api/clients/count",
    responses(
        (status = 200, description = "Total number of clients", body = ClientCountResponse),
        (status = 500, description = "Database error", body = ErrorResponse)
    ),
    tag = "Clients"
)]
pub async fn count_clients(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ClientCountResponse>, ApiError> {
    const CONTEXT: &str = "Failed to count clients";
    let pool = state.pool().await.map_err(|e| ApiError::database(CONTEXT, e))?;
    let count = db::count_clients(&pool)
        .await
        .map_err(|e| ApiError::database(CONTEXT, e))?;

    Ok(Json(ClientCountResponse {
        success: true,
        count,
    }))
}

/// Get a client by id.
#[utoipa::path(
    get,
    path = "/api/clients/{id}",
    params(
        ("id" = i64, Path, description = "Client ID")
    ),
    responses(
        (status = 200, description = "Client details", body = ClientResponse),
        (status = 400, description = "Invalid client ID", body = ErrorResponse),
        (status = 404, description = "Client not found", body = ErrorResponse)
    ),
    tag = "Clients"
)]
pub async fn get_client(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ClientResponse>, ApiError> {
    const CONTEXT: &str = "Failed to fetch client";
    let id = parse_client_id(&id)?;
    let pool = state.pool().await.map_err(|e| ApiError::database(CONTEXT, e))?;
    let client = db::find_client(&pool, id)
        .await
        .map_err(|e| ApiError::database(CONTEXT, e))?
        .ok_or(ApiError::ClientNotFound(id))?;

    Ok(Json(ClientResponse::found(client)))
}

/// Create a client.
#[utoipa::path(
    post,
    path = "/api/clients",
    request_body = CreateClientRequest,
    responses(
        (status = 201, description = "Client created", body = ClientResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 409, description = "Duplicate email", body = ErrorResponse)
    ),
    tag = "Clients"
)]
pub async fn create_client(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateClientRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ClientResponse>), ApiError> {
    const CONTEXT: &str = "Failed to create client";
    let new_client = validate_new_client(json_body(payload)?)?;
    let pool = state.pool().await.map_err(|e| ApiError::database(CONTEXT, e))?;
    let client: Client = db::insert_client(&pool, &new_client)
        .await
        .map_err(|e| ApiError::database(CONTEXT, e))?;

    info!(id = client.id, "Client created");
    Ok((
        StatusCode::CREATED,
        Json(ClientResponse::with_message(
            "Client created successfully",
            client,
        )),
    ))
}

/// Update the provided fields of a client.
#[utoipa::path(
    put,
    path = "/api/clients/{id}",
    params(
        ("id" = i64, Path, description = "Client ID")
    ),
    request_body = UpdateClientRequest,
    responses(
        (status = 200, description = "Client updated", body = ClientResponse),
        (status = 400, description = "No fields to update", body = ErrorResponse),
        (status = 404, description = "Client not found", body = ErrorResponse),
        (status = 409, description = "Duplicate email", body = ErrorResponse)
    ),
    tag = "Clients"
)]
pub async fn update_client(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateClientRequest>, JsonRejection>,
) -> Result<Json<ClientResponse>, ApiError> {
    const CONTEXT: &str = "Failed to update client";
    let id = parse_client_id(&id)?;
    let update = json_body(payload)?;

    let pool = state.pool().await.map_err(|e| ApiError::database(CONTEXT, e))?;
    db::find_client(&pool, id)
        .await
        .map_err(|e| ApiError::database(CONTEXT, e))?
        .ok_or(ApiError::ClientNotFound(id))?;

    if update.is_empty() {
        return Err(ApiError::NoFieldsToUpdate);
    }

    let client = db::update_client(&pool, id, &update)
        .await
        .map_err(|e| ApiError::database(CONTEXT, e))?
        .ok_or(ApiError::ClientNotFound(id))?;

    info!(id, "Client updated");
    Ok(Json(ClientResponse::with_message(
        "Client updated successfully",
        client,
    )))
}

/// Delete a client, returning the removed record.
#[utoipa::path(
    delete,
    path = "/api/clients/{id}",
    params(
        ("id" = i64, Path, description = "Client ID")
    ),
    responses(
        (status = 200, description = "Client deleted", body = ClientResponse),
        (status = 404, description = "Client not found", body = ErrorResponse)
    ),
    tag = "Clients"
)]
pub async fn delete_client(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ClientResponse>, ApiError> {
    const CONTEXT: &str = "Failed to delete client";
    let id = parse_client_id(&id)?;
    let pool = state.pool().await.map_err(|e| ApiError::database(CONTEXT, e))?;
    let client = db::delete_client(&pool, id)
        .await
        .map_err(|e| ApiError::database(CONTEXT, e))?
        .ok_or(ApiError::ClientNotFound(id))?;

    info!(id, "Client deleted");
    Ok(Json(ClientResponse::with_message(
        "Client deleted successfully",
        client,
    )))
}

// ============================================================================
// Fallback
// ============================================================================

/// JSON 404 for unmatched routes.
pub async fn route_not_found(method: Method, uri: Uri) -> ApiError {
    ApiError::RouteNotFound {
        method: method.to_string(),
        path: uri.path().to_string(),
    }
}
