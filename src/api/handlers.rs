use crate::analytics::{DatasetPreview, MetricsResponse};
use crate::api::AppState;
use crate::error::{AppError, Result};
use crate::ml::{FeatureImportance, TOP_IMPORTANCES};
use crate::models::EmployeeRecord;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    Json,
};
use serde::{Deserialize, Serialize};

/// Health check endpoint. The server never starts without a model, so a
/// response implies one is loaded.
pub async fn health_check() -> Result<Json<HealthResponse>> {
    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        model_loaded: true,
    }))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub model_loaded: bool,
}

/// Aggregate dataset statistics
pub async fn dataset_metrics(State(state): State<AppState>) -> Result<Json<MetricsResponse>> {
    let analytics = state.analytics.clone();
    let metrics = tokio::task::spawn_blocking(move || analytics.metrics())
        .await
        .map_err(|e| AppError::Internal(format!("Metrics task failed: {}", e)))??;

    Ok(Json(metrics.into()))
}

#[derive(Debug, Deserialize)]
pub struct PreviewQuery {
    pub n: Option<i64>,
}

/// First rows of the normalized dataset
pub async fn dataset_preview(
    State(state): State<AppState>,
    query: std::result::Result<Query<PreviewQuery>, QueryRejection>,
) -> Result<Json<DatasetPreview>> {
    let Query(params) = query.map_err(|e| AppError::Validation(e.body_text()))?;

    let analytics = state.analytics.clone();
    let preview = tokio::task::spawn_blocking(move || analytics.preview(params.n))
        .await
        .map_err(|e| AppError::Internal(format!("Preview task failed: {}", e)))??;

    Ok(Json(preview))
}

#[derive(Debug, Serialize)]
pub struct FeatureImportanceResponse {
    pub top_importance: Vec<FeatureImportance>,
}

/// Most influential encoded features of the loaded model
pub async fn feature_importance(
    State(state): State<AppState>,
) -> Result<Json<FeatureImportanceResponse>> {
    Ok(Json(FeatureImportanceResponse {
        top_importance: state.inference.feature_importance(TOP_IMPORTANCES),
    }))
}

/// Prediction body; `prediction`/`probability` and the older
/// `left_prediction`/`probability_left` carry the same values
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct PredictResponse {
    pub prediction: u8,
    pub probability: f64,
    pub left_prediction: u8,
    pub probability_left: f64,
    pub threshold: f64,
}

/// Score one employee
pub async fn predict(
    State(state): State<AppState>,
    payload: std::result::Result<Json<EmployeeRecord>, JsonRejection>,
) -> Result<Json<PredictResponse>> {
    let Json(record) = payload.map_err(|e| AppError::Validation(e.body_text()))?;

    let outcome = state.inference.predict(record)?;

    Ok(Json(PredictResponse {
        prediction: outcome.prediction,
        probability: outcome.probability,
        left_prediction: outcome.prediction,
        probability_left: outcome.probability,
        threshold: outcome.threshold,
    }))
}
