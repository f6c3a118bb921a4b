use crate::error::{AppError, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// Numeric model inputs, in encoded order
pub const NUMERIC_FEATURES: [&str; 7] = [
    "satisfaction_level",
    "last_evaluation",
    "number_project",
    "average_monthly_hours",
    "tenure",
    "work_accident",
    "promotion_last_5years",
];

/// One employee in the normalized form shared by training and serving
#[derive(Debug, Clone, PartialEq)]
pub struct EmployeeFeatures {
    /// Values aligned with [`NUMERIC_FEATURES`]
    pub numeric: [f64; 7],
    pub department: Option<String>,
    pub salary: Option<String>,
}

impl EmployeeFeatures {
    /// Categorical value by column name
    pub fn category(&self, column: &str) -> Option<&str> {
        match column {
            "department" => self.department.as_deref(),
            "salary" => self.salary.as_deref(),
            _ => None,
        }
    }
}

/// One-hot vocabulary for a categorical column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalEncoding {
    pub column: String,
    /// Sorted ascending
    pub categories: Vec<String>,
}

/// Turns [`EmployeeFeatures`] into the classifier's input vector: one-hot
/// blocks for each categorical column, then the numeric features.
///
/// Fitted once at training time and stored in the model artifact, so the
/// serving path reproduces the training column order exactly. Categories not
/// seen during fitting encode as an all-zero block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureEncoder {
    categorical: Vec<CategoricalEncoding>,
    numeric: Vec<String>,
}

impl FeatureEncoder {
    /// Learn the category vocabularies of `columns` from the training rows
    pub fn fit(columns: &[&str], rows: &[EmployeeFeatures]) -> Self {
        let categorical = columns
            .iter()
            .map(|column| {
                let categories: BTreeSet<&str> =
                    rows.iter().filter_map(|row| row.category(column)).collect();
                CategoricalEncoding {
                    column: column.to_string(),
                    categories: categories.into_iter().map(str::to_string).collect(),
                }
            })
            .collect();

        Self {
            categorical,
            numeric: NUMERIC_FEATURES.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn categorical(&self) -> &[CategoricalEncoding] {
        &self.categorical
    }

    /// Total width of the encoded vector
    pub fn n_features(&self) -> usize {
        self.categorical
            .iter()
            .map(|c| c.categories.len())
            .sum::<usize>()
            + self.numeric.len()
    }

    /// Encoded column names, e.g. `department_sales`, then numeric names
    pub fn feature_names(&self) -> Vec<String> {
        self.categorical
            .iter()
            .flat_map(|c| {
                c.categories
                    .iter()
                    .map(move |category| format!("{}_{}", c.column, category))
            })
            .chain(self.numeric.iter().cloned())
            .collect()
    }

    /// Encode one employee
    pub fn transform(&self, features: &EmployeeFeatures) -> Vec<f64> {
        let mut encoded = Vec::with_capacity(self.n_features());

        for encoding in &self.categorical {
            let offset = encoded.len();
            encoded.resize(offset + encoding.categories.len(), 0.0);

            let Some(value) = features.category(&encoding.column) else {
                continue;
            };
            match encoding.categories.binary_search_by(|c| c.as_str().cmp(value)) {
                Ok(idx) => encoded[offset + idx] = 1.0,
                Err(_) => debug!(
                    column = %encoding.column,
                    value = %value,
                    "Unknown category encoded as zeros"
                ),
            }
        }

        encoded.extend_from_slice(&features.numeric);
        encoded
    }

    /// Encode many employees into an `(n_rows, n_features)` matrix
    pub fn transform_batch(&self, rows: &[EmployeeFeatures]) -> Result<Array2<f64>> {
        let n_features = self.n_features();
        let data: Vec<f64> = rows.iter().flat_map(|row| self.transform(row)).collect();

        Array2::from_shape_vec((rows.len(), n_features), data)
            .map_err(|e| AppError::Internal(format!("Failed to create feature array: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn employee(department: &str, salary: &str) -> EmployeeFeatures {
        EmployeeFeatures {
            numeric: [0.5, 0.7, 3.0, 180.0, 4.0, 0.0, 1.0],
            department: Some(department.to_string()),
            salary: Some(salary.to_string()),
        }
    }

    fn fitted() -> FeatureEncoder {
        let rows = vec![
            employee("sales", "low"),
            employee("it", "high"),
            employee("sales", "medium"),
        ];
        FeatureEncoder::fit(&["department", "salary"], &rows)
    }

    #[test]
    fn test_feature_names_order() {
        let encoder = fitted();
        assert_eq!(
            encoder.feature_names(),
            vec![
                "department_it",
                "department_sales",
                "salary_high",
                "salary_low",
                "salary_medium",
                "satisfaction_level",
                "last_evaluation",
                "number_project",
                "average_monthly_hours",
                "tenure",
                "work_accident",
                "promotion_last_5years",
            ]
        );
        assert_eq!(encoder.n_features(), 12);
    }

    #[test]
    fn test_transform_one_hot_then_numeric() {
        let encoder = fitted();
        let encoded = encoder.transform(&employee("sales", "medium"));

        assert_eq!(encoded.len(), 12);
        assert_eq!(&encoded[..5], &[0.0, 1.0, 0.0, 0.0, 1.0]);
        assert_eq!(&encoded[5..], &[0.5, 0.7, 3.0, 180.0, 4.0, 0.0, 1.0]);
    }

    #[test]
    fn test_unknown_and_missing_categories_encode_as_zeros() {
        let encoder = fitted();
        let mut row = employee("marketing", "low");
        row.salary = None;

        let encoded = encoder.transform(&row);
        assert!(encoded[..5].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_fit_without_categorical_columns() {
        let encoder = FeatureEncoder::fit(&[], &[employee("sales", "low")]);
        assert_eq!(encoder.n_features(), NUMERIC_FEATURES.len());
        assert_eq!(encoder.transform(&employee("sales", "low")).len(), 7);
    }

    #[test]
    fn test_transform_batch_shape() {
        let encoder = fitted();
        let matrix = encoder
            .transform_batch(&[employee("it", "low"), employee("sales", "high")])
            .unwrap();
        assert_eq!(matrix.shape(), &[2, 12]);
        assert_eq!(matrix[[0, 0]], 1.0);
        assert_eq!(matrix[[1, 1]], 1.0);
    }
}
