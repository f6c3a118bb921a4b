//! In-memory columnar table

use crate::error::{AppError, Result};
use serde_json::Value;

/// Cell storage for one column. `None` marks a missing value.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Numeric(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Numeric(values) => values.len(),
            ColumnData::Text(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// JSON value of one cell (`null` when missing)
    pub fn json_at(&self, row: usize) -> Value {
        match self {
            ColumnData::Numeric(values) => values
                .get(row)
                .copied()
                .flatten()
                .and_then(|v| {
                    if v.fract() == 0.0 && v.abs() < i64::MAX as f64 {
                        Some(Value::from(v as i64))
                    } else {
                        serde_json::Number::from_f64(v).map(Value::Number)
                    }
                })
                .unwrap_or(Value::Null),
            ColumnData::Text(values) => values
                .get(row)
                .cloned()
                .flatten()
                .map(Value::String)
                .unwrap_or(Value::Null),
        }
    }
}

/// A named column
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn numeric(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            data: ColumnData::Numeric(values),
        }
    }

    pub fn text(name: impl Into<String>, values: Vec<Option<String>>) -> Self {
        Self {
            name: name.into(),
            data: ColumnData::Text(values),
        }
    }
}

/// Ordered collection of equally long columns
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    columns: Vec<Column>,
    n_rows: usize,
}

impl Dataset {
    /// Build a dataset, checking that every column has the same length
    pub fn from_columns(columns: Vec<Column>) -> Result<Self> {
        let n_rows = columns.first().map(|c| c.data.len()).unwrap_or(0);
        if let Some(bad) = columns.iter().find(|c| c.data.len() != n_rows) {
            return Err(AppError::Dataset(format!(
                "column '{}' has {} rows, expected {}",
                bad.name,
                bad.data.len(),
                n_rows
            )));
        }
        Ok(Self { columns, n_rows })
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// First column with the given name
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Values of a numeric column; `None` if absent or not numeric
    pub fn numeric(&self, name: &str) -> Option<&[Option<f64>]> {
        match self.column(name).map(|c| &c.data) {
            Some(ColumnData::Numeric(values)) => Some(values),
            _ => None,
        }
    }

    /// Values of a text column; `None` if absent or not text
    pub fn text(&self, name: &str) -> Option<&[Option<String>]> {
        match self.column(name).map(|c| &c.data) {
            Some(ColumnData::Text(values)) => Some(values),
            _ => None,
        }
    }

    /// One row as a JSON object keyed by column name
    pub fn row_json(&self, row: usize) -> serde_json::Map<String, Value> {
        self.columns
            .iter()
            .map(|c| (c.name.clone(), c.data.json_at(row)))
            .collect()
    }

    /// Reassemble columns taken out with [`Dataset::into_columns`]; lengths
    /// must not have changed in between.
    pub(crate) fn from_parts(columns: Vec<Column>, n_rows: usize) -> Self {
        debug_assert!(columns.iter().all(|c| c.data.len() == n_rows));
        Self { columns, n_rows }
    }

    pub(crate) fn into_columns(self) -> Vec<Column> {
        self.columns
    }
}
