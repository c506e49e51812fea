//! Client Records Backend Server
//!
//! REST API server for managing client records.

use client_records_backend::api::create_router;
use client_records_backend::config::Config;
use client_records_backend::db::{Client, CreateClientRequest, PoolManager, UpdateClientRequest};
use client_records_backend::error::ErrorResponse;
use client_records_backend::logging::init_tracing;
use client_records_backend::models::{
    ClientCountResponse, ClientListResponse, ClientResponse, HealthResponse,
};
use client_records_backend::state::AppState;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    paths(
        client_records_backend::api::handlers::health_check,
        client_records_backend::api::handlers::status_page,
        client_records_backend::api::handlers::list_clients,
        client_records_backend::api::handlers::count_clients,
        client_records_backend::api::handlers::get_client,
        client_records_backend::api::handlers::create_client,
        client_records_backend::api::handlers::update_client,
        client_records_backend::api::handlers::delete_client,
    ),
    components(
        schemas(
            HealthResponse,
            Client,
            CreateClientRequest,
            UpdateClientRequest,
            ClientListResponse,
            ClientCountResponse,
            ClientResponse,
            ErrorResponse,
        )
    ),
    tags(
        (name = "Health", description = "Health and status endpoints"),
        (name = "Clients", description = "Client record management"),
    ),
    info(
        title = "Client Records API",
        version = "0.1.0",
        description = "REST API for managing client records",
        license(name = "MIT")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env for local development
    dotenvy::dotenv().ok();
    init_tracing();

    let config = Config::from_env()?;
    let db = Arc::new(PoolManager::from_config(&config)?);
    let state = Arc::new(AppState::new(Arc::clone(&db)));

    let host = &config.server.host;
    let port = config.server.port;
    info!("Starting Client Records Backend on {}:{}", host, port);
    info!("Swagger UI available at http://{}:{}/swagger-ui/", host, port);

    let static_dir = config.server.static_dir.as_path();
    let static_dir = if static_dir.is_dir() {
        info!("Serving static files from {}", static_dir.display());
        Some(static_dir)
    } else {
        warn!(
            "Static directory {} not found, serving API only",
            static_dir.display()
        );
        None
    };

    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the router
    let app = create_router(state, static_dir)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http());

    // Start the server
    let addr = format!("{}:{}", host, port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);
    info!("API endpoints: http://{}/api/clients", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close_pool().await;
    info!("Server stopped");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
