// src/bin/api_server.rs

use cardbazaar::infra::config;
use cardbazaar::transport;
use cardbazaar::{AppConfig, CatalogClient, SessionMap, StockCache, StoreService, SyncHealth};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let app_config = AppConfig::from_env();
    tracing::info!(
        exchange_rate = %app_config.exchange_rate,
        operator = %app_config.operator_contact,
        "starting cardbazaar"
    );

    // --- Store Initialization ---
    let sync_health = SyncHealth::default();
    let store = Arc::new(
        StoreService::connect(sync_health.clone(), app_config.operator_contact.clone()).await?,
    );
    tracing::info!("store connected, schema ready");

    // --- Stock replica ---
    let (stock, cache_task) = StockCache::subscribe(store.pool().clone(), sync_health).await?;
    tracing::info!("stock replica subscribed");

    // --- Catalog gateway ---
    let catalog = Arc::new(CatalogClient::new(
        config::catalog_base_url(),
        app_config.exchange_rate,
    ));

    let app_state = transport::http::AppState {
        store,
        sessions: SessionMap::new(),
        catalog,
        stock,
    };

    // --- API Server Initialization ---
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);
    let app = transport::http::create_router(app_state)
        .merge(
            SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", transport::http::ApiDoc::openapi()),
        )
        .layer(cors);

    let bind_addr = config::bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(%bind_addr, "API server listening");

    tokio::select! {
        result = axum::serve(listener, app) => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown signal received");
        }
    }

    cache_task.abort();
    Ok(())
}
