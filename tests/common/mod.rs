//! Shared fixtures for integration tests

#![allow(dead_code)]

use axum::{body::Body, http::Request, Router};
use hr_churn::{
    api::{build_router, AppState},
    config::Config,
    error::Result,
    ml::{ChurnModel, EmployeeFeatures, FeatureImportance, InferenceService},
};
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;
use tower::ServiceExt;

/// Deterministic model: leaving probability falls with satisfaction, low
/// salary adds 0.2. Only recognizes normalized category spellings.
pub struct StubModel;

impl ChurnModel for StubModel {
    fn predict_probability(&self, features: &EmployeeFeatures) -> Result<f64> {
        let salary_bump = match features.salary.as_deref() {
            Some("low") => 0.2,
            _ => 0.0,
        };
        Ok((1.0 - features.numeric[0]) * 0.8 + salary_bump)
    }

    fn feature_importances(&self) -> Vec<FeatureImportance> {
        (0..20)
            .map(|i| FeatureImportance {
                feature: format!("feature_{:02}", i),
                importance: (i as f64 + 1.0) / 210.0,
            })
            .collect()
    }
}

pub fn write_csv(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(contents.as_bytes()).expect("write csv");
    file.flush().expect("flush csv");
    file
}

/// Six employees, one per line; `left` = [1, 0, 1, 0, 0, 1]
pub const SAMPLE_CSV: &str = "\
satisfaction_level,last_evaluation,number_project,average_montly_hours,time_spend_company,Work_accident,left,promotion_last_5years,Department,salary
0.38,0.53,2,157,3,0,1,0,sales,low
0.80,0.86,5,262,6,0,0,0, Sales ,medium
0.11,0.88,7,272,4,0,1,0,IT,medium
0.72,0.87,5,223,5,0,0,0,hr,low
0.37,0.52,2,159,3,0,0,0,technical,LOW
0.41,0.50,2,153,3,0,1,0,support,high
";

pub fn app_with_dataset(csv: &NamedTempFile) -> Router {
    let mut config = Config::default();
    config.data.dataset_path = csv.path().to_path_buf();
    let inference = InferenceService::new(Arc::new(StubModel), config.model.decision_threshold)
        .expect("valid threshold");
    build_router(AppState::new(&config, inference))
}

pub async fn get_json(app: Router, uri: &str) -> (u16, serde_json::Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    read_json(response).await
}

pub async fn post_json(app: Router, uri: &str, body: &str) -> (u16, serde_json::Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    read_json(response).await
}

async fn read_json(response: axum::response::Response) -> (u16, serde_json::Value) {
    let status = response.status().as_u16();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}
