//! Dataset-level churn metrics

use crate::analytics::statistics::{
    binary_rate, integer_histogram, mean, mean_by_flag, round_to, top_n, value_counts,
    SatisfactionBins,
};
use crate::dataset::Dataset;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// Decimal places for rates
pub const RATE_PRECISION: u32 = 4;

/// Decimal places for averages
pub const MEAN_PRECISION: u32 = 2;

/// Length of the department ranking
pub const TOP_DEPARTMENTS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentCount {
    pub department: String,
    pub count: u64,
}

/// A statistic that was degraded because its input columns are absent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingColumnWarning {
    pub metric: String,
    pub missing_columns: Vec<String>,
}

/// Aggregate statistics over the normalized dataset. Every metric degrades to
/// its default independently when its columns are absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetMetrics {
    pub rows: usize,
    pub churn_rate: f64,
    pub avg_hours: f64,
    pub avg_projects: f64,
    /// Keys `left` and `stayed`
    pub avg_hours_by_status: BTreeMap<String, f64>,
    pub projects_hist: BTreeMap<i64, u64>,
    pub satisfaction_bins: SatisfactionBins,
    pub top_departments: Vec<DepartmentCount>,
    pub salary_distribution: BTreeMap<String, u64>,
    pub warnings: Vec<MissingColumnWarning>,
}

impl DatasetMetrics {
    /// Compute every metric; `dataset` must already be normalized
    pub fn compute(dataset: &Dataset) -> Self {
        let mut warnings = Vec::new();
        let mut need = |metric: &str, columns: &[&str]| -> bool {
            let missing: Vec<String> = columns
                .iter()
                .filter(|c| !dataset.has_column(c))
                .map(|c| c.to_string())
                .collect();
            if missing.is_empty() {
                return true;
            }
            warn!(metric = metric, missing = ?missing, "Metric degraded: columns absent");
            warnings.push(MissingColumnWarning {
                metric: metric.to_string(),
                missing_columns: missing,
            });
            false
        };

        let churn_rate = if need("churn_rate", &["left"]) {
            dataset.numeric("left").and_then(binary_rate).unwrap_or(0.0)
        } else {
            0.0
        };

        let avg_hours = if need("avg_hours", &["average_monthly_hours"]) {
            dataset
                .numeric("average_monthly_hours")
                .and_then(mean)
                .unwrap_or(0.0)
        } else {
            0.0
        };

        let avg_projects = if need("avg_projects", &["number_project"]) {
            dataset.numeric("number_project").and_then(mean).unwrap_or(0.0)
        } else {
            0.0
        };

        let mut avg_hours_by_status = BTreeMap::new();
        if need("avg_hours_by_status", &["average_monthly_hours", "left"]) {
            if let (Some(hours), Some(left)) =
                (dataset.numeric("average_monthly_hours"), dataset.numeric("left"))
            {
                for (flag, value) in mean_by_flag(hours, left) {
                    let label = if flag == 1 { "left" } else { "stayed" };
                    avg_hours_by_status.insert(label.to_string(), round_to(value, MEAN_PRECISION));
                }
            }
        }

        let projects_hist = if need("projects_hist", &["number_project"]) {
            dataset
                .numeric("number_project")
                .map(integer_histogram)
                .unwrap_or_default()
        } else {
            BTreeMap::new()
        };

        let satisfaction_bins = if need("satisfaction_bins", &["satisfaction_level"]) {
            dataset
                .numeric("satisfaction_level")
                .map(SatisfactionBins::from_values)
                .unwrap_or_default()
        } else {
            SatisfactionBins::default()
        };

        let top_departments = if need("top_departments", &["department"]) {
            dataset
                .text("department")
                .map(|values| top_n(values, TOP_DEPARTMENTS))
                .unwrap_or_default()
                .into_iter()
                .map(|(department, count)| DepartmentCount { department, count })
                .collect()
        } else {
            Vec::new()
        };

        let salary_distribution = if need("salary_distribution", &["salary"]) {
            dataset
                .text("salary")
                .map(|values| {
                    value_counts(values)
                        .into_iter()
                        .map(|(salary, count)| (salary.to_string(), count))
                        .collect()
                })
                .unwrap_or_default()
        } else {
            BTreeMap::new()
        };

        Self {
            rows: dataset.n_rows(),
            churn_rate: round_to(churn_rate, RATE_PRECISION),
            avg_hours: round_to(avg_hours, MEAN_PRECISION),
            avg_projects: round_to(avg_projects, MEAN_PRECISION),
            avg_hours_by_status,
            projects_hist,
            satisfaction_bins,
            top_departments,
            salary_distribution,
            warnings,
        }
    }
}

/// Wire shape of [`DatasetMetrics`]: the canonical fields plus the legacy
/// names older clients read
#[derive(Debug, Clone, Serialize)]
pub struct MetricsResponse {
    #[serde(flatten)]
    pub metrics: DatasetMetrics,
    pub hours_by_left: BTreeMap<String, f64>,
    pub projects_dist: BTreeMap<i64, u64>,
}

impl From<DatasetMetrics> for MetricsResponse {
    fn from(metrics: DatasetMetrics) -> Self {
        Self {
            hours_by_left: metrics.avg_hours_by_status.clone(),
            projects_dist: metrics.projects_hist.clone(),
            metrics,
        }
    }
}
