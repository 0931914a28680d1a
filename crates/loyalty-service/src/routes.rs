//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post, put};
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{auth, health, members, orders, products, rewards};
use crate::state::AppState;

/// Maximum concurrent requests for API endpoints.
const API_MAX_CONCURRENT_REQUESTS: usize = 100;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
/// - `POST /v1/auth/register` - Register a member with credentials
/// - `POST /v1/auth/login` - Log in
///
/// ## Authenticated (bearer token)
/// - `GET /v1/auth/me` - Profile behind the token
/// - Members, orders, products, rewards, points reads
/// - `POST /v1/orders` - Checkout; `/quote`, `/status`, `/payment`, `/cancel`
/// - `POST /v1/rewards/{id}/redeem` - Exchange points for a reward
///
/// ## Admin (`x-admin-key`)
/// - Member delete, tier update, points adjustment
/// - Product and reward create/update/delete/stock, low-stock listing
pub fn create_router(state: AppState) -> Router {
    // Extract config values before moving state
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    // Build CORS layer
    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    let api_routes = Router::new()
        // Auth
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
        // Members
        .route("/members", get(members::list_members))
        .route(
            "/members/{id}",
            get(members::get_member)
                .put(members::update_member)
                .delete(members::delete_member),
        )
        .route("/members/{id}/points", get(members::get_points))
        .route("/members/{id}/points/adjust", post(members::adjust_points))
        .route("/members/{id}/ledger", get(members::get_ledger))
        .route(
            "/members/{id}/tier",
            get(members::get_tier).put(members::update_tier),
        )
        .route("/members/{id}/redemptions", get(members::get_redemptions))
        // Orders
        .route("/orders", post(orders::create_order).get(orders::list_orders))
        .route("/orders/mine", get(orders::list_my_orders))
        .route("/orders/quote", post(orders::quote_order))
        .route("/orders/{id}", get(orders::get_order))
        .route("/orders/{id}/status", put(orders::update_status))
        .route("/orders/{id}/payment", post(orders::process_payment))
        .route("/orders/{id}/cancel", post(orders::cancel_order))
        // Products
        .route(
            "/products",
            get(products::list_products).post(products::create_product),
        )
        .route("/products/low-stock", get(products::list_low_stock))
        .route(
            "/products/{id}",
            get(products::get_product)
                .put(products::update_product)
                .delete(products::delete_product),
        )
        .route(
            "/products/{id}/stock",
            get(products::get_stock).put(products::set_stock),
        )
        // Rewards
        .route(
            "/rewards",
            get(rewards::list_rewards).post(rewards::create_reward),
        )
        .route(
            "/rewards/{id}",
            get(rewards::get_reward)
                .put(rewards::update_reward)
                .delete(rewards::delete_reward),
        )
        .route("/rewards/{id}/stock", put(rewards::set_stock))
        .route("/rewards/{id}/redeem", post(rewards::redeem_reward))
        .layer(ConcurrencyLimitLayer::new(API_MAX_CONCURRENT_REQUESTS));

    Router::new()
        // Health (public, no rate limit)
        .route("/health", get(health::health))
        // API v1 routes (rate limited)
        .nest("/v1", api_routes)
        // Global middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
