//! API Route Configuration

use axum::{middleware, routing::get, Router};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{self, AppState};
use super::middleware::logging_middleware;

/// Create the API router with all routes and middleware
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let v2 = Router::new()
        .route("/pair-details/:address", get(handlers::pair_details_v2))
        .route("/quote", get(handlers::quote_v2));

    let v3 = Router::new()
        .route("/pair-details/:address", get(handlers::pair_details_v3))
        .route("/quote", get(handlers::quote_v3));

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/v2", v2)
        .nest("/v3", v3)
        .with_state(state)
        // Middleware (order matters - bottom runs first)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(middleware::from_fn(logging_middleware))
}
