use crate::api::{handlers, AppState};
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

/// Build the main API router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health endpoints
        .route("/", get(handlers::health_check))
        .route("/health", get(handlers::health_check))
        // Dataset analytics
        .route("/kpis", get(handlers::dataset_metrics))
        .route("/dataset/metrics", get(handlers::dataset_metrics))
        .route("/dataset/preview", get(handlers::dataset_preview))
        // Model
        .route("/feature-importance", get(handlers::feature_importance))
        .route("/predict", post(handlers::predict))
        // Add state
        .with_state(state)
        // Add middleware
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_response(DefaultOnResponse::new().include_headers(true)),
        )
        .layer(CorsLayer::permissive())
}
