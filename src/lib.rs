// ============================================================================
// FEED FRESHNESS CHECK
// ============================================================================

// - Basic auth with constant-time digest comparison
// - One Firestore document read per request
// - 45 minute freshness window in America/Sao_Paulo
// - Per-request error mapping (the process keeps serving)
// - Structured logging

pub mod auth;
pub mod config;
pub mod dto;
pub mod errors;
pub mod freshness;
pub mod models;
pub mod routes;
pub mod states;
pub mod store;

pub use states::AppState;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

/// Builds the router with all routes and middleware.
pub fn app(state: AppState) -> Router {
    // Protected routes (auth required)
    let protected = Router::new()
        .route("/check", post(routes::check_update))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_basic_auth,
        ));

    Router::new()
        // Public routes (no auth required)
        .route("/health", get(routes::health_check))
        .merge(protected)
        .with_state(state)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}
