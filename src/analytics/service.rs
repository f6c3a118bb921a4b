use crate::analytics::metrics::DatasetMetrics;
use crate::config::DataConfig;
use crate::dataset::{self, Dataset};
use crate::error::Result;
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::debug;

/// First rows of the normalized dataset
#[derive(Debug, Clone, Serialize)]
pub struct DatasetPreview {
    pub rows: Vec<Map<String, Value>>,
    pub columns: Vec<String>,
    /// Rows in the whole dataset
    pub count: usize,
}

/// Read-only queries over the dataset file. The file is re-read and
/// re-normalized on every call, so edits show up immediately.
#[derive(Debug, Clone)]
pub struct AnalyticsService {
    dataset_path: PathBuf,
    preview_default_rows: usize,
    preview_max_rows: usize,
}

impl AnalyticsService {
    pub fn new(config: &DataConfig) -> Self {
        Self {
            dataset_path: config.dataset_path.clone(),
            preview_default_rows: config.preview_default_rows,
            preview_max_rows: config.preview_max_rows.max(1),
        }
    }

    pub fn dataset_path(&self) -> &Path {
        &self.dataset_path
    }

    /// Load and normalize the backing file
    pub fn load(&self) -> Result<Dataset> {
        let raw = dataset::load_csv(&self.dataset_path)?;
        Ok(dataset::normalize(raw))
    }

    pub fn metrics(&self) -> Result<DatasetMetrics> {
        let dataset = self.load()?;
        let metrics = DatasetMetrics::compute(&dataset);
        debug!(
            rows = metrics.rows,
            warnings = metrics.warnings.len(),
            "Dataset metrics computed"
        );
        Ok(metrics)
    }

    /// Requested row count clamped to `[1, preview_max_rows]`
    pub fn preview_rows(&self, requested: Option<i64>) -> usize {
        let max = self.preview_max_rows as i64;
        requested
            .unwrap_or(self.preview_default_rows as i64)
            .clamp(1, max) as usize
    }

    pub fn preview(&self, requested: Option<i64>) -> Result<DatasetPreview> {
        let n = self.preview_rows(requested);
        let dataset = self.load()?;
        let rows = (0..n.min(dataset.n_rows()))
            .map(|row| dataset.row_json(row))
            .collect();

        Ok(DatasetPreview {
            rows,
            columns: dataset.column_names(),
            count: dataset.n_rows(),
        })
    }
}
