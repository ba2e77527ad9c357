//! Router configuration for the HTTP API.
//!
//! This module sets up all routes, middleware (CORS, compression, tracing),
//! and creates the axum router ready for serving.

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Dataset CRUD
        .route(
            "/datasets",
            get(handlers::list_datasets).post(handlers::create_dataset),
        )
        .route("/datasets/{dataset_id}", delete(handlers::delete_dataset))
        // Segment panels
        .route("/datasets/{dataset_id}/segment-view", post(handlers::segment_view))
        .route("/datasets/{dataset_id}/summaries", post(handlers::summaries))
        .route("/datasets/{dataset_id}/price-histogram", post(handlers::price_histogram))
        .route("/datasets/{dataset_id}/state-map", post(handlers::state_map))
        // Market simulator
        .route("/market/derive", post(handlers::market_derive))
        .route("/market/solve", post(handlers::market_solve));

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/v1", api_v1)
        // Survey uploads can be large.
        .layer(DefaultBodyLimit::max(50 * 1024 * 1024))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
