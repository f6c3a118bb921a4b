//! HTTP API tests: the router is driven in-process against a temporary
//! dataset file and a deterministic stub model.
mod common;

use common::{app_with_dataset, get_json, post_json, write_csv, SAMPLE_CSV};
use serde_json::json;

const VALID_RECORD: &str = r#"{
    "satisfaction_level": 0.1,
    "last_evaluation": 0.5,
    "number_project": 2,
    "average_monthly_hours": 150,
    "tenure": 3,
    "work_accident": 0,
    "promotion_last_5years": 0,
    "department": "Sales",
    "salary": "Low"
}"#;

#[tokio::test]
async fn test_health_and_root() {
    let csv = write_csv(SAMPLE_CSV);

    for uri in ["/health", "/"] {
        let (status, body) = get_json(app_with_dataset(&csv), uri).await;
        assert_eq!(status, 200);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["model_loaded"], true);
        assert!(body["version"].is_string());
    }
}

#[tokio::test]
async fn test_dataset_metrics() {
    let csv = write_csv(SAMPLE_CSV);
    let (status, body) = get_json(app_with_dataset(&csv), "/dataset/metrics").await;

    assert_eq!(status, 200);
    assert_eq!(body["rows"], 6);
    assert_eq!(body["churn_rate"], 0.5);
    assert_eq!(body["avg_hours"], 204.33);
    assert_eq!(body["avg_projects"], 3.83);
    assert_eq!(body["avg_hours_by_status"], json!({"left": 194.0, "stayed": 214.67}));
    assert_eq!(body["projects_hist"], json!({"2": 3, "5": 2, "7": 1}));
    assert_eq!(body["satisfaction_bins"], json!({"low": 1, "mid": 3, "high": 2}));
    assert_eq!(body["salary_distribution"], json!({"high": 1, "low": 3, "medium": 2}));
    assert_eq!(
        body["top_departments"],
        json!([
            {"department": "sales", "count": 2},
            {"department": "hr", "count": 1},
            {"department": "it", "count": 1},
            {"department": "support", "count": 1},
            {"department": "technical", "count": 1}
        ])
    );
    assert_eq!(body["warnings"], json!([]));
    assert_eq!(body["hours_by_left"], body["avg_hours_by_status"]);
    assert_eq!(body["projects_dist"], body["projects_hist"]);
}

#[tokio::test]
async fn test_kpis_matches_dataset_metrics() {
    let csv = write_csv(SAMPLE_CSV);
    let (_, kpis) = get_json(app_with_dataset(&csv), "/kpis").await;
    let (_, metrics) = get_json(app_with_dataset(&csv), "/dataset/metrics").await;
    assert_eq!(kpis, metrics);
}

#[tokio::test]
async fn test_metrics_degrade_when_columns_missing() {
    let csv = write_csv("Department,salary\nsales,low\nit,high\n");
    let (status, body) = get_json(app_with_dataset(&csv), "/kpis").await;

    assert_eq!(status, 200);
    assert_eq!(body["churn_rate"], 0.0);
    assert_eq!(body["avg_hours"], 0.0);
    assert_eq!(body["projects_hist"], json!({}));
    assert_eq!(body["satisfaction_bins"], json!({"low": 0, "mid": 0, "high": 0}));
    assert_eq!(body["top_departments"][0]["count"], 1);

    let degraded: Vec<&str> = body["warnings"]
        .as_array()
        .unwrap()
        .iter()
        .map(|w| w["metric"].as_str().unwrap())
        .collect();
    assert!(degraded.contains(&"churn_rate"));
    assert!(degraded.contains(&"satisfaction_bins"));
    assert!(!degraded.contains(&"top_departments"));
}

#[tokio::test]
async fn test_missing_dataset_is_server_error() {
    let csv = write_csv(SAMPLE_CSV);
    let app = app_with_dataset(&csv);
    drop(csv);

    let (status, body) = get_json(app, "/kpis").await;
    assert_eq!(status, 500);
    assert_eq!(body["error"]["code"], "DATASET_ERROR");
}

#[tokio::test]
async fn test_preview_default_and_clamps() {
    let csv = write_csv(SAMPLE_CSV);

    let (status, body) = get_json(app_with_dataset(&csv), "/dataset/preview").await;
    assert_eq!(status, 200);
    assert_eq!(body["rows"].as_array().unwrap().len(), 6);
    assert_eq!(body["count"], 6);

    let (_, body) = get_json(app_with_dataset(&csv), "/dataset/preview?n=1000").await;
    assert!(body["rows"].as_array().unwrap().len() <= 500);

    let (_, body) = get_json(app_with_dataset(&csv), "/dataset/preview?n=0").await;
    assert_eq!(body["rows"].as_array().unwrap().len(), 1);

    let (_, body) = get_json(app_with_dataset(&csv), "/dataset/preview?n=2").await;
    assert_eq!(body["rows"].as_array().unwrap().len(), 2);
    assert_eq!(body["rows"][1]["department"], "sales");
    assert_eq!(body["rows"][1]["salary"], "medium");
}

#[tokio::test]
async fn test_preview_uses_normalized_columns() {
    let csv = write_csv(SAMPLE_CSV);
    let (_, body) = get_json(app_with_dataset(&csv), "/dataset/preview?n=1").await;

    let columns: Vec<&str> = body["columns"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c.as_str().unwrap())
        .collect();
    assert!(columns.contains(&"tenure"));
    assert!(columns.contains(&"average_monthly_hours"));
    assert!(columns.contains(&"work_accident"));
    assert!(!columns.contains(&"time_spend_company"));
    assert_eq!(body["rows"][0]["tenure"], 3);
}

#[tokio::test]
async fn test_preview_rejects_non_numeric_n() {
    let csv = write_csv(SAMPLE_CSV);
    let (status, body) = get_json(app_with_dataset(&csv), "/dataset/preview?n=lots").await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_feature_importance_top_15() {
    let csv = write_csv(SAMPLE_CSV);
    let (status, body) = get_json(app_with_dataset(&csv), "/feature-importance").await;

    assert_eq!(status, 200);
    let top = body["top_importance"].as_array().unwrap();
    assert_eq!(top.len(), 15);
    assert_eq!(top[0]["feature"], "feature_19");
    assert_eq!(top[0]["importance"], 0.0952);
    let scores: Vec<f64> = top.iter().map(|e| e["importance"].as_f64().unwrap()).collect();
    assert!(scores.windows(2).all(|w| w[0] >= w[1]));
}

#[tokio::test]
async fn test_predict_returns_both_field_names() {
    let csv = write_csv(SAMPLE_CSV);
    let (status, body) = post_json(app_with_dataset(&csv), "/predict", VALID_RECORD).await;

    assert_eq!(status, 200);
    assert_eq!(body["prediction"], 1);
    assert_eq!(body["left_prediction"], 1);
    assert_eq!(body["probability"], 0.92);
    assert_eq!(body["probability_left"], body["probability"]);
    assert_eq!(body["threshold"], 0.5);
}

#[tokio::test]
async fn test_predict_normalizes_categories() {
    let csv = write_csv(SAMPLE_CSV);
    let normalized = VALID_RECORD
        .replace("\"Sales\"", "\"sales\"")
        .replace("\"Low\"", "\" low \"");

    let (_, raw) = post_json(app_with_dataset(&csv), "/predict", VALID_RECORD).await;
    let (_, clean) = post_json(app_with_dataset(&csv), "/predict", &normalized).await;
    assert_eq!(raw, clean);
}

#[tokio::test]
async fn test_predict_accepts_time_spend_company() {
    let csv = write_csv(SAMPLE_CSV);
    let legacy = VALID_RECORD.replace("\"tenure\"", "\"time_spend_company\"");

    let (status, body) = post_json(app_with_dataset(&csv), "/predict", &legacy).await;
    assert_eq!(status, 200);
    assert_eq!(body["prediction"], 1);
}

#[tokio::test]
async fn test_predict_threshold_rule() {
    let csv = write_csv(SAMPLE_CSV);
    let content = VALID_RECORD
        .replace("\"satisfaction_level\": 0.1", "\"satisfaction_level\": 0.9")
        .replace("\"Low\"", "\"high\"");

    let (status, body) = post_json(app_with_dataset(&csv), "/predict", &content).await;
    assert_eq!(status, 200);
    let probability = body["probability"].as_f64().unwrap();
    assert!((0.0..=1.0).contains(&probability));
    assert_eq!(body["prediction"], u8::from(probability >= 0.5));
    assert_eq!(body["prediction"], 0);
}

#[tokio::test]
async fn test_predict_rejects_out_of_domain_values() {
    let csv = write_csv(SAMPLE_CSV);
    let content = VALID_RECORD
        .replace("\"satisfaction_level\": 0.1", "\"satisfaction_level\": 1.5")
        .replace("\"Low\"", "\"enormous\"");

    let (status, body) = post_json(app_with_dataset(&csv), "/predict", &content).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    let message = body["error"]["message"].as_str().unwrap();
    assert!(message.contains("satisfaction_level"));
    assert!(message.contains("salary"));
}

#[tokio::test]
async fn test_predict_rejects_malformed_body() {
    let csv = write_csv(SAMPLE_CSV);

    for body in ["{not json", r#"{"satisfaction_level": 0.5}"#, r#"{"satisfaction_level": "high"}"#] {
        let (status, response) = post_json(app_with_dataset(&csv), "/predict", body).await;
        assert_eq!(status, 400, "body: {}", body);
        assert_eq!(response["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(response["error"]["status"], 400);
    }
}
