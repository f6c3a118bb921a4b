use crate::analytics::round_to;
use crate::error::{AppError, Result};
use crate::ml::artifact::ChurnModel;
use crate::ml::models::FeatureImportance;
use crate::models::EmployeeRecord;
use serde::Serialize;
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::debug;

/// Decimal places of returned probabilities
pub const PROBABILITY_PRECISION: u32 = 4;

/// Default number of entries of the feature-importance ranking
pub const TOP_IMPORTANCES: usize = 15;

/// Scored prediction for one employee
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PredictionOutcome {
    /// 1 when the employee is predicted to leave
    pub prediction: u8,
    /// Probability of leaving, rounded to 4 decimals
    pub probability: f64,
    pub threshold: f64,
}

/// Serves predictions from a model loaded once at startup
#[derive(Clone)]
pub struct InferenceService {
    model: Arc<dyn ChurnModel>,
    threshold: f64,
}

impl InferenceService {
    pub fn new(model: Arc<dyn ChurnModel>, threshold: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(AppError::Configuration(format!(
                "decision threshold must be within [0, 1], got {}",
                threshold
            )));
        }
        Ok(Self { model, threshold })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Validate, normalize and score one record. Invalid records never reach
    /// the model.
    pub fn predict(&self, record: EmployeeRecord) -> Result<PredictionOutcome> {
        let features = record.into_features()?;
        let raw = self.model.predict_probability(&features)?;
        if !raw.is_finite() {
            return Err(AppError::Internal(format!(
                "model returned a non-finite probability: {}",
                raw
            )));
        }

        let probability = round_to(raw.clamp(0.0, 1.0), PROBABILITY_PRECISION);
        let prediction = u8::from(probability >= self.threshold);

        debug!(
            probability = probability,
            prediction = prediction,
            department = features.department.as_deref().unwrap_or(""),
            "Prediction served"
        );

        Ok(PredictionOutcome {
            prediction,
            probability,
            threshold: self.threshold,
        })
    }

    /// Highest `top_n` importances, descending, rounded to 4 decimals
    pub fn feature_importance(&self, top_n: usize) -> Vec<FeatureImportance> {
        let mut ranked = self.model.feature_importances();
        ranked.sort_by(|a, b| {
            b.importance
                .partial_cmp(&a.importance)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.feature.cmp(&b.feature))
        });
        ranked.truncate(top_n);
        for entry in &mut ranked {
            entry.importance = round_to(entry.importance, PROBABILITY_PRECISION);
        }
        ranked
    }
}
