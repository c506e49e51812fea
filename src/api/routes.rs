//! Route configuration.

use crate::api::handlers;
use crate::state::AppState;
use axum::Router;
use axum::handler::HandlerWithoutStateExt;
use axum::routing::get;
use std::path::Path;
use std::sync::Arc;
use tower_http::services::ServeDir;

/// Creates the API router.
///
/// When `static_dir` is given, unmatched paths are served from it and fall
/// back to the JSON 404.
pub fn create_router(state: Arc<AppState>, static_dir: Option<&Path>) -> Router {
    let router = Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        .route("/api/status", get(handlers::status_page))
        // Clients
        .route(
            "/api/clients",
            get(handlers::list_clients).post(handlers::create_client),
        )
        .route("/api/clients/count", get(handlers::count_clients))
        .route(
            "/api/clients/{id}",
            get(handlers::get_client)
                .put(handlers::update_client)
                .delete(handlers::delete_client),
        )
        .method_not_allowed_fallback(handlers::route_not_found)
        .with_state(state);

    match static_dir {
        Some(dir) => router.fallback_service(
            ServeDir::new(dir)
                .call_fallback_on_method_not_allowed(true)
                .not_found_service(handlers::route_not_found.into_service()),
        ),
        None => router.fallback(handlers::route_not_found),
    }
}
