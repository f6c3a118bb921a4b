//! Churn model: feature encoding, classifier, persisted artifact, offline
//! training and the serving-side inference service.
//!
//! The encoder fitted during training travels inside the artifact, so the
//! inference path always encodes records with the training column layout.

pub mod artifact;
pub mod classifier;
pub mod features;
pub mod models;
pub mod service;
pub mod training;

pub use artifact::{ChurnModel, ModelArtifact, ARTIFACT_FORMAT_VERSION};
pub use classifier::{BaggedTreeClassifier, Classifier, ForestParams};
pub use features::{CategoricalEncoding, EmployeeFeatures, FeatureEncoder, NUMERIC_FEATURES};
pub use models::{
    ConfusionMatrix, FeatureImportance, ModelMetadata, ModelMetrics, TrainingDataset,
};
pub use service::{InferenceService, PredictionOutcome, TOP_IMPORTANCES};
pub use training::{train, train_from_file, TrainingReport};
