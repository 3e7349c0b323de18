//! Xolbor Service - HTTP API for the Xubor ledger
//!
//! This is the main entry point for the xolbor service.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use xolbor_service::{create_router, open_store, AppState, ServiceConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,xolbor_service=debug,xolbor_store=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Xolbor Service");

    let config = ServiceConfig::from_env();

    tracing::info!(
        listen_addr = %config.listen_addr,
        store_backend = ?config.store_backend,
        starting_bonus = config.starting_bonus,
        admin_configured = config.admin_api_key.is_some(),
        webhook_secret_configured = config.payment_webhook_secret.is_some(),
        "Service configuration loaded"
    );

    let store = open_store(&config)?;
    let state = AppState::new(store, config.clone());

    if config.seed_catalog {
        state.catalog.seed_default_catalog().await?;
    }

    let app = create_router(state);

    tracing::info!(listen_addr = %config.listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
