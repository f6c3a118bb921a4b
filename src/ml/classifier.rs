use crate::config::TrainingConfig;
use crate::error::{AppError, Result};
use crate::ml::models::{ModelMetrics, TrainingDataset, LEFT};
use linfa::traits::{Fit, Predict};
use linfa::DatasetBase;
use linfa_trees::{DecisionTree, SplitQuality};
use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Trait for churn classifiers
pub trait Classifier: Send + Sync {
    /// Train the classifier, returning metrics on the training data
    fn train(&mut self, dataset: &TrainingDataset) -> Result<ModelMetrics>;

    /// Probability of the "left" class for each row
    fn predict_proba(&self, features: &Array2<f64>) -> Result<Array1<f64>>;

    /// Hard labels at the 0.5 cut-off
    fn predict(&self, features: &Array2<f64>) -> Result<Vec<usize>> {
        Ok(self
            .predict_proba(features)?
            .iter()
            .map(|&p| usize::from(p >= 0.5))
            .collect())
    }

    /// Learned per-feature importance, aligned with the input columns
    fn feature_importances(&self) -> Option<Vec<f64>>;

    /// Width of the input vector the classifier was trained on
    fn n_features(&self) -> usize;

    /// Check if model is trained
    fn is_trained(&self) -> bool;
}

/// Hyperparameters of the bagged tree ensemble
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_trees: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub seed: u64,
    pub balanced_class_weight: bool,
    /// Draw a bootstrap sample per tree; without it every tree sees all rows
    pub bootstrap: bool,
}

impl ForestParams {
    pub fn hyperparameters(&self) -> HashMap<String, String> {
        [
            ("n_trees", self.n_trees.to_string()),
            (
                "max_depth",
                self.max_depth
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "none".to_string()),
            ),
            ("min_samples_split", self.min_samples_split.to_string()),
            ("seed", self.seed.to_string()),
            (
                "balanced_class_weight",
                self.balanced_class_weight.to_string(),
            ),
            ("bootstrap", self.bootstrap.to_string()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }
}

impl Default for ForestParams {
    fn default() -> Self {
        Self::from(&TrainingConfig::default())
    }
}

impl From<&TrainingConfig> for ForestParams {
    fn from(config: &TrainingConfig) -> Self {
        Self {
            n_trees: config.n_trees,
            max_depth: config.max_depth,
            min_samples_split: config.min_samples_split,
            seed: config.seed,
            balanced_class_weight: config.balanced_class_weight,
            bootstrap: true,
        }
    }
}

/// Bagged ensemble of CART trees (Gini impurity). The probability of leaving
/// is the fraction of trees voting "left".
///
/// Rows are bootstrapped per tree but every split considers all features;
/// linfa-trees has no per-split feature sampling.
#[derive(Serialize, Deserialize)]
pub struct BaggedTreeClassifier {
    params: ForestParams,
    trees: Vec<DecisionTree<f64, usize>>,
    importances: Vec<f64>,
    n_features: usize,
}

impl BaggedTreeClassifier {
    pub fn new(params: ForestParams) -> Self {
        Self {
            params,
            trees: Vec::new(),
            importances: Vec::new(),
            n_features: 0,
        }
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Per-class sample weights. Balanced weights are scaled so the majority
    /// class weighs 1.0, keeping `min_samples_split` meaningful as a count.
    fn class_weights(&self, dataset: &TrainingDataset) -> [f32; 2] {
        if !self.params.balanced_class_weight {
            return [1.0, 1.0];
        }
        let counts = dataset.class_counts();
        let majority = counts.iter().copied().max().unwrap_or(0) as f32;
        let mut weights = [1.0f32; 2];
        for (weight, &count) in weights.iter_mut().zip(counts.iter()) {
            if count > 0 {
                *weight = majority / count as f32;
            }
        }
        weights
    }

    fn fit_tree(
        &self,
        tree_idx: usize,
        dataset: &TrainingDataset,
        class_weights: [f32; 2],
    ) -> Result<DecisionTree<f64, usize>> {
        let n = dataset.n_samples;
        let indices: Vec<usize> = if self.params.bootstrap {
            let mut rng = StdRng::seed_from_u64(self.params.seed.wrapping_add(tree_idx as u64));
            (0..n).map(|_| rng.gen_range(0..n)).collect()
        } else {
            (0..n).collect()
        };

        let records = dataset.features.select(Axis(0), &indices);
        let targets: Array1<usize> = indices.iter().map(|&i| dataset.labels[i]).collect();
        let weights: Array1<f32> = indices
            .iter()
            .map(|&i| class_weights[dataset.labels[i].min(LEFT)])
            .collect();

        let sample = DatasetBase::new(records, targets).with_weights(weights);

        DecisionTree::<f64, usize>::params()
            .split_quality(SplitQuality::Gini)
            .max_depth(self.params.max_depth)
            .min_weight_split(self.params.min_samples_split.max(2) as f32)
            .min_weight_leaf(1.0)
            .fit(&sample)
            .map_err(|e| AppError::Training(format!("Failed to fit tree {}: {}", tree_idx, e)))
    }

    fn average_importances(trees: &[DecisionTree<f64, usize>], n_features: usize) -> Vec<f64> {
        let mut totals = vec![0.0; n_features];
        for tree in trees {
            for (total, value) in totals.iter_mut().zip(tree.feature_importance()) {
                if value.is_finite() {
                    *total += value;
                }
            }
        }

        let sum: f64 = totals.iter().sum();
        if sum > 0.0 {
            totals.iter_mut().for_each(|v| *v /= sum);
        }
        totals
    }
}

impl Classifier for BaggedTreeClassifier {
    fn train(&mut self, dataset: &TrainingDataset) -> Result<ModelMetrics> {
        if dataset.n_samples == 0 {
            return Err(AppError::Training(
                "No samples provided for training".to_string(),
            ));
        }
        if self.params.n_trees == 0 {
            return Err(AppError::Training(
                "Ensemble needs at least one tree".to_string(),
            ));
        }

        let class_weights = self.class_weights(dataset);
        debug!(
            n_trees = self.params.n_trees,
            n_samples = dataset.n_samples,
            n_features = dataset.n_features,
            weight_stayed = class_weights[0],
            weight_left = class_weights[1],
            "Fitting tree ensemble"
        );

        let trees = (0..self.params.n_trees)
            .into_par_iter()
            .map(|tree_idx| self.fit_tree(tree_idx, dataset, class_weights))
            .collect::<Result<Vec<_>>>()?;

        self.importances = Self::average_importances(&trees, dataset.n_features);
        self.trees = trees;
        self.n_features = dataset.n_features;

        let predictions = self.predict(&dataset.features)?;
        Ok(ModelMetrics::calculate(&dataset.labels, &predictions))
    }

    fn predict_proba(&self, features: &Array2<f64>) -> Result<Array1<f64>> {
        if !self.is_trained() {
            return Err(AppError::Internal("Model not trained".to_string()));
        }
        if features.ncols() != self.n_features {
            return Err(AppError::Internal(format!(
                "Expected {} features, got {}",
                self.n_features,
                features.ncols()
            )));
        }

        let mut votes = Array1::<f64>::zeros(features.nrows());
        for tree in &self.trees {
            let predictions: Array1<usize> = tree.predict(features);
            for (vote, &label) in votes.iter_mut().zip(predictions.iter()) {
                if label == LEFT {
                    *vote += 1.0;
                }
            }
        }

        Ok(votes / self.trees.len() as f64)
    }

    fn feature_importances(&self) -> Option<Vec<f64>> {
        if self.is_trained() {
            Some(self.importances.clone())
        } else {
            None
        }
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn is_trained(&self) -> bool {
        !self.trees.is_empty()
    }
}
