use ndarray::{Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Label value for an employee who left
pub const LEFT: usize = 1;

/// Label value for an employee who stayed
pub const STAYED: usize = 0;

/// Encoded training data
#[derive(Debug, Clone)]
pub struct TrainingDataset {
    /// Feature matrix (n_samples × n_features)
    pub features: Array2<f64>,

    /// Churn labels (0 = stayed, 1 = left)
    pub labels: Vec<usize>,

    /// Number of samples
    pub n_samples: usize,

    /// Number of features
    pub n_features: usize,
}

impl TrainingDataset {
    pub fn new(features: Array2<f64>, labels: Vec<usize>) -> Self {
        let n_samples = features.nrows();
        let n_features = features.ncols();
        Self {
            features,
            labels,
            n_samples,
            n_features,
        }
    }

    /// Rows per class, indexed by label
    pub fn class_counts(&self) -> [usize; 2] {
        let mut counts = [0usize; 2];
        for &label in &self.labels {
            if label <= LEFT {
                counts[label] += 1;
            }
        }
        counts
    }

    /// Subset by row indices
    pub fn select(&self, indices: &[usize]) -> TrainingDataset {
        TrainingDataset::new(
            self.features.select(Axis(0), indices),
            indices.iter().map(|&i| self.labels[i]).collect(),
        )
    }
}

/// Row indices for a stratified train/holdout split. Each class contributes
/// `round(class_size * test_size)` rows to the holdout; both index lists come
/// back sorted.
pub fn stratified_split_indices(
    labels: &[usize],
    test_size: f64,
    seed: u64,
) -> (Vec<usize>, Vec<usize>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut test = Vec::new();

    for class in [STAYED, LEFT] {
        let mut members: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter(|&(_, &label)| label == class)
            .map(|(i, _)| i)
            .collect();
        members.shuffle(&mut rng);

        let n_test = ((members.len() as f64) * test_size).round() as usize;
        let n_test = n_test.min(members.len());
        test.extend_from_slice(&members[..n_test]);
        train.extend_from_slice(&members[n_test..]);
    }

    train.sort_unstable();
    test.sort_unstable();
    (train, test)
}

/// Binary classification metrics for the "left" class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    /// Accuracy
    pub accuracy: f64,

    /// Precision
    pub precision: f64,

    /// Recall
    pub recall: f64,

    /// F1 score
    pub f1_score: f64,

    /// Confusion matrix counts
    pub confusion: ConfusionMatrix,

    /// Samples scored
    pub support: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub true_negative: usize,
    pub false_positive: usize,
    pub false_negative: usize,
    pub true_positive: usize,
}

impl ModelMetrics {
    pub fn new() -> Self {
        Self {
            accuracy: 0.0,
            precision: 0.0,
            recall: 0.0,
            f1_score: 0.0,
            confusion: ConfusionMatrix::default(),
            support: 0,
        }
    }

    /// Score predictions against true labels
    pub fn calculate(y_true: &[usize], y_pred: &[usize]) -> Self {
        let n_samples = y_true.len();
        if n_samples == 0 {
            return Self::new();
        }

        let mut confusion = ConfusionMatrix::default();
        for (&t, &p) in y_true.iter().zip(y_pred.iter()) {
            match (t == LEFT, p == LEFT) {
                (false, false) => confusion.true_negative += 1,
                (false, true) => confusion.false_positive += 1,
                (true, false) => confusion.false_negative += 1,
                (true, true) => confusion.true_positive += 1,
            }
        }

        let tp = confusion.true_positive as f64;
        let fp = confusion.false_positive as f64;
        let fn_count = confusion.false_negative as f64;

        let accuracy = (confusion.true_positive + confusion.true_negative) as f64 / n_samples as f64;
        let precision = if tp + fp > 0.0 { tp / (tp + fp) } else { 0.0 };
        let recall = if tp + fn_count > 0.0 {
            tp / (tp + fn_count)
        } else {
            0.0
        };
        let f1_score = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };

        Self {
            accuracy,
            precision,
            recall,
            f1_score,
            confusion,
            support: n_samples,
        }
    }
}

impl Default for ModelMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Model metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Unique id of this training run
    pub model_id: uuid::Uuid,

    /// Algorithm name
    pub algorithm: String,

    /// Training timestamp
    pub trained_at: chrono::DateTime<chrono::Utc>,

    /// Number of training samples
    pub n_training_samples: usize,

    /// Encoded feature names, in input order
    pub feature_names: Vec<String>,

    /// Holdout metrics
    pub validation_metrics: ModelMetrics,

    /// Hyperparameters
    pub hyperparameters: HashMap<String, String>,
}

/// A feature's share of the classifier's decisions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}
