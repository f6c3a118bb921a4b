use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Dataset location and preview limits
    #[serde(default)]
    pub data: DataConfig,

    /// Model artifact configuration
    #[serde(default)]
    pub model: ModelConfig,

    /// Offline training parameters
    #[serde(default)]
    pub training: TrainingConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from file and environment
    pub fn load() -> std::result::Result<Self, config::ConfigError> {
        let config_path =
            std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config/default.toml".to_string());

        config::Config::builder()
            // Start with default values
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            // Override with config file if it exists
            .add_source(config::File::with_name(&config_path).required(false))
            // Override with environment variables (prefix: HR_CHURN_)
            .add_source(
                config::Environment::with_prefix("HR_CHURN")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Reject settings the services cannot run with
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.model.decision_threshold) {
            return Err(AppError::Configuration(format!(
                "model.decision_threshold must be within [0, 1], got {}",
                self.model.decision_threshold
            )));
        }
        if !(self.training.test_size > 0.0 && self.training.test_size < 1.0) {
            return Err(AppError::Configuration(format!(
                "training.test_size must be within (0, 1), got {}",
                self.training.test_size
            )));
        }
        if self.training.n_trees == 0 {
            return Err(AppError::Configuration(
                "training.n_trees must be at least 1".to_string(),
            ));
        }
        if self.data.preview_max_rows == 0 {
            return Err(AppError::Configuration(
                "data.preview_max_rows must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server host
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// CSV file backing analytics and training
    #[serde(default = "default_dataset_path")]
    pub dataset_path: PathBuf,

    /// Rows returned by the preview endpoint when `n` is omitted
    #[serde(default = "default_preview_rows")]
    pub preview_default_rows: usize,

    /// Upper clamp for the preview endpoint
    #[serde(default = "default_preview_max_rows")]
    pub preview_max_rows: usize,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dataset_path: default_dataset_path(),
            preview_default_rows: default_preview_rows(),
            preview_max_rows: default_preview_max_rows(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Serialized model artifact
    #[serde(default = "default_artifact_path")]
    pub artifact_path: PathBuf,

    /// Probability at or above which an employee is predicted to leave
    #[serde(default = "default_threshold")]
    pub decision_threshold: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            artifact_path: default_artifact_path(),
            decision_threshold: default_threshold(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Trees in the bagged ensemble
    #[serde(default = "default_n_trees")]
    pub n_trees: usize,

    /// Maximum tree depth (unbounded when absent)
    #[serde(default)]
    pub max_depth: Option<usize>,

    /// Minimum samples required to split a node
    #[serde(default = "default_min_samples_split")]
    pub min_samples_split: usize,

    /// Fraction of rows held out for evaluation
    #[serde(default = "default_test_size")]
    pub test_size: f64,

    /// Seed for the split and bootstrap sampling
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Weight classes inversely to their frequency
    #[serde(default = "default_true")]
    pub balanced_class_weight: bool,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            n_trees: default_n_trees(),
            max_depth: None,
            min_samples_split: default_min_samples_split(),
            test_size: default_test_size(),
            seed: default_seed(),
            balanced_class_weight: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
        }
    }
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_dataset_path() -> PathBuf {
    PathBuf::from("data/HR_capstone_dataset.csv")
}

fn default_preview_rows() -> usize {
    50
}

fn default_preview_max_rows() -> usize {
    500
}

fn default_artifact_path() -> PathBuf {
    PathBuf::from("models/churn_forest.bin")
}

fn default_threshold() -> f64 {
    0.5
}

fn default_n_trees() -> usize {
    300
}

fn default_min_samples_split() -> usize {
    2
}

fn default_test_size() -> f64 {
    0.2
}

fn default_seed() -> u64 {
    42
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        let config = Config::default();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.model.decision_threshold, 0.5);
        assert_eq!(config.data.preview_default_rows, 50);
        assert_eq!(config.data.preview_max_rows, 500);
        assert_eq!(config.training.seed, 42);
        assert_eq!(config.training.n_trees, 300);
        assert!(config.training.balanced_class_weight);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_embedded_defaults_parse() {
        let config: Config = config::Config::builder()
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.server.port, 8000);
        assert_eq!(config.training.n_trees, 300);
        assert!(config.training.max_depth.is_none());
        assert_eq!(
            config.model.artifact_path,
            PathBuf::from("models/churn_forest.bin")
        );
    }

    #[test]
    fn test_validate_rejects_bad_threshold() {
        let mut config = Config::default();
        config.model.decision_threshold = 1.5;
        assert!(matches!(
            config.validate(),
            Err(AppError::Configuration(_))
        ));
    }

    #[test]
    fn test_validate_rejects_bad_split() {
        let mut config = Config::default();
        config.training.test_size = 1.0;
        assert!(config.validate().is_err());

        config.training.test_size = 0.2;
        config.training.n_trees = 0;
        assert!(config.validate().is_err());
    }
}
