//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{accounts, catalog, health, purchases, stats, topups, webhooks};
use crate::state::AppState;

/// Maximum concurrent requests for API endpoints.
const API_MAX_CONCURRENT_REQUESTS: usize = 100;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
/// - `GET /v1/catalog/items` - List skins
/// - `GET /v1/catalog/items/:id` - Get a skin
/// - `GET /v1/stats` - Platform counts
///
/// ## Accounts
/// - `POST /v1/accounts` - Register
/// - `POST /v1/auth/login` - Login
/// - `GET /v1/usernames/:username` - Username availability
/// - `GET /v1/accounts/me` - Profile (bearer)
/// - `GET /v1/accounts/me/balance` - Balance (bearer)
/// - `GET /v1/accounts/me/inventory` - Owned skins (bearer)
/// - `GET /v1/accounts/me/transactions` - History (bearer)
/// - `GET /v1/accounts/me/reconciliation` - Ledger check (bearer)
/// - `GET /v1/accounts/me/stats` - Activity summary (bearer)
///
/// ## Wallet (bearer)
/// - `POST /v1/purchases` - Buy a skin
///
/// ## Admin (admin key)
/// - `POST /v1/catalog/items` - Register a skin
/// - `POST /v1/topups` - Credit Xubor to an account
///
/// ## Webhooks (signature verification)
/// - `POST /webhooks/payments` - Payment confirmations
pub fn create_router(state: AppState) -> Router {
    let cors = build_cors_layer(&state.config.cors_origins);
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    let state = Arc::new(state);

    let api_routes = Router::new()
        // Accounts
        .route("/accounts", post(accounts::register))
        .route("/auth/login", post(accounts::login))
        .route("/accounts/me", get(accounts::get_account))
        .route("/accounts/me/balance", get(accounts::get_balance))
        .route("/accounts/me/inventory", get(accounts::get_inventory))
        .route("/accounts/me/transactions", get(accounts::list_transactions))
        .route("/accounts/me/reconciliation", get(accounts::get_reconciliation))
        .route("/accounts/me/stats", get(stats::get_account_stats))
        .route("/usernames/:username", get(accounts::check_username))
        // Catalog
        .route(
            "/catalog/items",
            get(catalog::list_items).post(catalog::create_item),
        )
        .route("/catalog/items/:id", get(catalog::get_item))
        // Wallet
        .route("/purchases", post(purchases::purchase))
        .route("/stats", get(stats::get_stats))
        // Admin
        .route("/topups", post(topups::topup))
        .layer(ConcurrencyLimitLayer::new(API_MAX_CONCURRENT_REQUESTS));

    Router::new()
        .route("/health", get(health::health))
        .nest("/v1", api_routes)
        // Webhooks (no rate limit - retried by the provider)
        .route("/webhooks/payments", post(webhooks::payment_webhook))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(request_timeout_seconds)))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.iter().any(|o| o == "*") {
        layer.allow_origin(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        layer.allow_origin(origins)
    }
}
