//! Loyalty Platform Service - HTTP API for members, orders, and rewards
//!
//! This is the main entry point for the loyalty service.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use loyalty_service::{create_router, AppState, ServiceConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,loyalty=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Loyalty Platform Service");

    // Load configuration from environment
    let config = ServiceConfig::from_env();

    tracing::info!(
        listen_addr = %config.listen_addr,
        data_dir = %config.data_dir,
        admin_key_configured = %config.admin_api_key.is_some(),
        "Service configuration loaded"
    );

    // Initialize the storage backend
    #[cfg(feature = "rocksdb-backend")]
    let store = {
        tracing::info!(path = %config.data_dir, "Opening RocksDB store");
        Arc::new(loyalty_store::RocksStore::open(&config.data_dir)?)
    };
    #[cfg(not(feature = "rocksdb-backend"))]
    let store = {
        tracing::warn!("Running with the in-memory store - data will not survive a restart");
        Arc::new(loyalty_store::MemoryStore::new())
    };

    // Build app state
    let state = AppState::new(store, config.clone());

    // Create the router
    let app = create_router(state);
    tracing::info!("Router configured with all API endpoints");

    // Start HTTP server
    tracing::info!(listen_addr = %config.listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
