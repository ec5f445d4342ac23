// src/bin/api_server.rs

use std::sync::Arc;
use storefront_directory::transport;
use storefront_directory::{AppConfig, MemoryStorage, PgStorage, Storage, StoreService};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env()?;

    // --- Storage Initialization ---
    let storage: Arc<dyn Storage> = match config.database_url.as_deref() {
        Some(url) => {
            info!(max_connections = config.db_max_connections, "connecting to Postgres");
            Arc::new(PgStorage::connect(url, config.db_max_connections).await?)
        }
        None => {
            warn!("DATABASE_URL not set, using in-memory storage (data is lost on exit)");
            Arc::new(MemoryStorage::new())
        }
    };

    // --- Service Initialization ---
    let service = StoreService::new(storage, config.service);
    service.ping().await?;
    info!(
        slug_retry_limit = config.service.slug_retry_limit,
        top_stores_limit = config.service.top_stores_limit,
        "store service initialized"
    );

    // --- API Server Initialization ---
    let app_state = transport::http::AppState::new(service);
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);
    let app = transport::http::create_router(app_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", transport::http::ApiDoc::openapi()))
        .layer(cors);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %config.bind_addr, "API server listening");
    info!("Swagger UI available at /swagger-ui");

    tokio::select! {
        result = axum::serve(listener, app) => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
        }
    }

    Ok(())
}
