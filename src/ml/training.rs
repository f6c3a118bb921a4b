//! Offline training: dataset file in, fitted [`ModelArtifact`] out

use crate::config::TrainingConfig;
use crate::dataset::{self, Dataset, CATEGORICAL_COLUMNS};
use crate::error::{AppError, Result};
use crate::ml::artifact::ModelArtifact;
use crate::ml::classifier::{BaggedTreeClassifier, Classifier, ForestParams};
use crate::ml::features::{EmployeeFeatures, FeatureEncoder, NUMERIC_FEATURES};
use crate::ml::models::{
    stratified_split_indices, ModelMetadata, ModelMetrics, TrainingDataset, LEFT, STAYED,
};
use std::path::Path;
use tracing::{info, warn};

/// Label column
pub const LABEL_COLUMN: &str = "left";

pub const ALGORITHM: &str = "bagged_decision_trees";

/// Outcome of a training run
pub struct TrainingReport {
    pub artifact: ModelArtifact,
    pub rows_used: usize,
    pub rows_dropped: usize,
    pub train_rows: usize,
    pub holdout_rows: usize,
    pub training_metrics: ModelMetrics,
    /// Metrics on the holdout split, or on the training split when the
    /// holdout came out empty
    pub holdout_metrics: ModelMetrics,
}

/// Fail with [`AppError::MissingColumns`] unless every numeric feature and
/// the label are present
pub fn check_required_columns(dataset: &Dataset) -> Result<()> {
    let mut missing: Vec<String> = NUMERIC_FEATURES
        .iter()
        .chain(std::iter::once(&LABEL_COLUMN))
        .filter(|name| dataset.numeric(name).is_none())
        .map(|name| name.to_string())
        .collect();

    if missing.is_empty() {
        return Ok(());
    }
    missing.sort();
    Err(AppError::MissingColumns {
        missing,
        found: dataset.column_names(),
    })
}

/// Usable rows as features and labels, plus the number of rows dropped for a
/// missing numeric value or a label outside {0, 1}
pub fn extract_rows(dataset: &Dataset) -> Result<(Vec<EmployeeFeatures>, Vec<usize>, usize)> {
    check_required_columns(dataset)?;

    let numeric_columns: Vec<&[Option<f64>]> = NUMERIC_FEATURES
        .iter()
        .filter_map(|name| dataset.numeric(name))
        .collect();
    let labels_column = dataset
        .numeric(LABEL_COLUMN)
        .ok_or_else(|| AppError::Internal("label column vanished".to_string()))?;
    let department = dataset.text("department");
    let salary = dataset.text("salary");

    let mut rows = Vec::with_capacity(dataset.n_rows());
    let mut labels = Vec::with_capacity(dataset.n_rows());
    let mut dropped = 0;

    'rows: for row in 0..dataset.n_rows() {
        let label = match labels_column[row] {
            Some(v) if v == 0.0 => STAYED,
            Some(v) if v == 1.0 => LEFT,
            _ => {
                dropped += 1;
                continue;
            }
        };

        let mut numeric = [0.0; NUMERIC_FEATURES.len()];
        for (slot, column) in numeric.iter_mut().zip(&numeric_columns) {
            match column[row] {
                Some(value) => *slot = value,
                None => {
                    dropped += 1;
                    continue 'rows;
                }
            }
        }

        rows.push(EmployeeFeatures {
            numeric,
            department: department.and_then(|c| c[row].clone()),
            salary: salary.and_then(|c| c[row].clone()),
        });
        labels.push(label);
    }

    Ok((rows, labels, dropped))
}

/// Fit an artifact on `dataset`. The dataset is normalized first, so raw
/// loader output is accepted.
pub fn train(dataset: Dataset, config: &TrainingConfig) -> Result<TrainingReport> {
    let dataset = dataset::normalize(dataset);
    let (rows, labels, rows_dropped) = extract_rows(&dataset)?;

    if rows_dropped > 0 {
        warn!(
            rows_dropped = rows_dropped,
            "Dropped rows with missing features or invalid labels"
        );
    }
    if rows.is_empty() {
        return Err(AppError::Training(
            "No usable rows left after dropping incomplete records".to_string(),
        ));
    }

    let (mut train_idx, mut holdout_idx) =
        stratified_split_indices(&labels, config.test_size, config.seed);
    if train_idx.is_empty() {
        warn!("Holdout split would leave no training rows; training on all rows");
        train_idx = (0..rows.len()).collect();
        holdout_idx.clear();
    }

    let train_rows: Vec<EmployeeFeatures> = train_idx.iter().map(|&i| rows[i].clone()).collect();
    let present: Vec<&str> = CATEGORICAL_COLUMNS
        .iter()
        .copied()
        .filter(|name| dataset.text(name).is_some())
        .collect();
    let encoder = FeatureEncoder::fit(&present, &train_rows);

    let all_features = TrainingDataset::new(encoder.transform_batch(&rows)?, labels);
    let train_set = all_features.select(&train_idx);

    info!(
        rows_used = rows.len(),
        train_rows = train_set.n_samples,
        holdout_rows = holdout_idx.len(),
        n_features = encoder.n_features(),
        "Training churn classifier"
    );

    let params = ForestParams::from(config);
    let mut classifier = BaggedTreeClassifier::new(params.clone());
    let training_metrics = classifier.train(&train_set)?;

    let holdout_metrics = if holdout_idx.is_empty() {
        warn!("Holdout split is empty; reporting training metrics");
        training_metrics.clone()
    } else {
        let holdout = all_features.select(&holdout_idx);
        let predictions = classifier.predict(&holdout.features)?;
        ModelMetrics::calculate(&holdout.labels, &predictions)
    };

    info!(
        accuracy = holdout_metrics.accuracy,
        precision = holdout_metrics.precision,
        recall = holdout_metrics.recall,
        f1_score = holdout_metrics.f1_score,
        "Holdout evaluation complete"
    );

    let metadata = ModelMetadata {
        model_id: uuid::Uuid::new_v4(),
        algorithm: ALGORITHM.to_string(),
        trained_at: chrono::Utc::now(),
        n_training_samples: train_set.n_samples,
        feature_names: encoder.feature_names(),
        validation_metrics: holdout_metrics.clone(),
        hyperparameters: params.hyperparameters(),
    };

    Ok(TrainingReport {
        artifact: ModelArtifact::new(metadata, encoder, classifier)?,
        rows_used: rows.len(),
        rows_dropped,
        train_rows: train_set.n_samples,
        holdout_rows: holdout_idx.len(),
        training_metrics,
        holdout_metrics,
    })
}

/// Load, train and persist. Nothing is written unless training succeeds.
pub fn train_from_file(
    dataset_path: &Path,
    artifact_path: &Path,
    config: &TrainingConfig,
) -> Result<TrainingReport> {
    let raw = dataset::load_csv(dataset_path)?;
    let report = train(raw, config)?;
    report.artifact.save(artifact_path)?;
    Ok(report)
}
