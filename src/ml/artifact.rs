use crate::error::{AppError, Result};
use crate::ml::classifier::{BaggedTreeClassifier, Classifier};
use crate::ml::features::{EmployeeFeatures, FeatureEncoder};
use crate::ml::models::{FeatureImportance, ModelMetadata};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// Bumped whenever the serialized layout changes
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// A fitted churn model as the serving path sees it
pub trait ChurnModel: Send + Sync {
    /// Probability in [0, 1] that the employee leaves
    fn predict_probability(&self, features: &EmployeeFeatures) -> Result<f64>;

    /// Per encoded feature importance, in encoded column order
    fn feature_importances(&self) -> Vec<FeatureImportance>;
}

/// Encoder and classifier fitted together, plus the metadata of the run that
/// produced them. Immutable once built.
#[derive(Serialize, Deserialize)]
pub struct ModelArtifact {
    format_version: u32,
    metadata: ModelMetadata,
    encoder: FeatureEncoder,
    classifier: BaggedTreeClassifier,
}

impl ModelArtifact {
    pub fn new(
        metadata: ModelMetadata,
        encoder: FeatureEncoder,
        classifier: BaggedTreeClassifier,
    ) -> Result<Self> {
        let artifact = Self {
            format_version: ARTIFACT_FORMAT_VERSION,
            metadata,
            encoder,
            classifier,
        };
        artifact.check_consistency().map_err(AppError::Training)?;
        Ok(artifact)
    }

    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    pub fn encoder(&self) -> &FeatureEncoder {
        &self.encoder
    }

    pub fn n_trees(&self) -> usize {
        self.classifier.n_trees()
    }

    fn check_consistency(&self) -> std::result::Result<(), String> {
        if !self.classifier.is_trained() {
            return Err("classifier is not trained".to_string());
        }
        if self.encoder.n_features() != self.classifier.n_features() {
            return Err(format!(
                "encoder produces {} features but classifier expects {}",
                self.encoder.n_features(),
                self.classifier.n_features()
            ));
        }
        Ok(())
    }

    /// Write the artifact to `path`. The bytes land in a sibling temp file
    /// first and are renamed into place, so readers never see a partial file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let tmp_path = temp_sibling(path);
        let write = || -> Result<()> {
            let file = fs::File::create(&tmp_path)?;
            let mut writer = BufWriter::new(file);
            bincode::serialize_into(&mut writer, self)?;
            writer.flush()?;
            Ok(())
        };

        if let Err(e) = write() {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }
        fs::rename(&tmp_path, path)?;

        info!(
            path = %path.display(),
            model_id = %self.metadata.model_id,
            "Model artifact saved"
        );
        Ok(())
    }

    /// Read an artifact saved by [`ModelArtifact::save`]. Every failure is
    /// reported as [`AppError::ArtifactLoad`].
    pub fn load(path: &Path) -> Result<Self> {
        let file = fs::File::open(path).map_err(|e| {
            AppError::ArtifactLoad(format!("cannot open {}: {}", path.display(), e))
        })?;

        let artifact: ModelArtifact = bincode::deserialize_from(BufReader::new(file))
            .map_err(|e| {
                AppError::ArtifactLoad(format!("cannot decode {}: {}", path.display(), e))
            })?;

        if artifact.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(AppError::ArtifactLoad(format!(
                "unsupported artifact format version {} (expected {})",
                artifact.format_version, ARTIFACT_FORMAT_VERSION
            )));
        }
        artifact
            .check_consistency()
            .map_err(AppError::ArtifactLoad)?;

        info!(
            path = %path.display(),
            model_id = %artifact.metadata.model_id,
            trees = artifact.n_trees(),
            features = artifact.encoder.n_features(),
            "Model artifact loaded"
        );
        Ok(artifact)
    }
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(format!(".tmp-{}", std::process::id()));
    path.with_file_name(name)
}

impl ChurnModel for ModelArtifact {
    fn predict_probability(&self, features: &EmployeeFeatures) -> Result<f64> {
        let row = self.encoder.transform(features);
        let matrix = Array2::from_shape_vec((1, row.len()), row)
            .map_err(|e| AppError::Internal(format!("Failed to create feature array: {}", e)))?;

        let probabilities = self.classifier.predict_proba(&matrix)?;
        let p = probabilities
            .first()
            .copied()
            .ok_or_else(|| AppError::Internal("Classifier returned no probability".to_string()))?;
        Ok(p.clamp(0.0, 1.0))
    }

    fn feature_importances(&self) -> Vec<FeatureImportance> {
        let scores = self.classifier.feature_importances().unwrap_or_default();
        self.encoder
            .feature_names()
            .into_iter()
            .zip(scores)
            .map(|(feature, importance)| FeatureImportance {
                feature,
                importance,
            })
            .collect()
    }
}
