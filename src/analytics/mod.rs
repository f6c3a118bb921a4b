//! Descriptive churn analytics over the employee dataset
//!
//! Every query reads the dataset file fresh, normalizes it and computes its
//! statistics. A statistic whose input columns are missing degrades to an
//! empty or zero value and is listed in the response `warnings`; the rest of
//! the response is unaffected.
//!
//! # Precision
//!
//! - Rates (churn rate): 4 decimals
//! - Means (hours, projects): 2 decimals

mod metrics;
mod service;
mod statistics;

pub use metrics::{
    DatasetMetrics, DepartmentCount, MetricsResponse, MissingColumnWarning, MEAN_PRECISION,
    RATE_PRECISION, TOP_DEPARTMENTS,
};
pub use service::{AnalyticsService, DatasetPreview};
pub use statistics::{
    integer_histogram, mean, mean_by_flag, round_to, top_n, value_counts, SatisfactionBins,
};
