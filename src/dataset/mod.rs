//! Tabular employee dataset: loading and normalization
//!
//! The dataset file is externally supplied and may be messy. Loading is
//! permissive: every cell starts as text, and [`normalize`] turns the raw table
//! into the canonical form every consumer relies on (lowercase column names,
//! the `tenure` alias resolved, numeric columns coerced with unparsable values
//! degraded to missing, categorical columns trimmed and lowercased).

mod loader;
mod normalize;
mod table;

pub use loader::{load_csv, read_csv};
pub use normalize::{
    normalize, normalize_category, normalize_column_name, parse_numeric, CATEGORICAL_COLUMNS,
    HOURS_MISSPELLING, NUMERIC_COLUMNS, TENURE_ALIAS,
};
pub use table::{Column, ColumnData, Dataset};
