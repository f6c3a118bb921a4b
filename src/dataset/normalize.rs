use crate::dataset::table::{Column, ColumnData, Dataset};

/// Columns coerced to numbers
pub const NUMERIC_COLUMNS: [&str; 8] = [
    "satisfaction_level",
    "last_evaluation",
    "number_project",
    "average_monthly_hours",
    "tenure",
    "work_accident",
    "promotion_last_5years",
    "left",
];

/// Columns coerced to trimmed lowercase strings
pub const CATEGORICAL_COLUMNS: [&str; 2] = ["department", "salary"];

/// Historical name of `tenure`
pub const TENURE_ALIAS: &str = "time_spend_company";

/// Known misspelling of `average_monthly_hours`
pub const HOURS_MISSPELLING: &str = "average_montly_hours";

/// Canonicalize a dataset. Every step is idempotent, so normalizing twice
/// yields the same dataset as normalizing once.
pub fn normalize(dataset: Dataset) -> Dataset {
    let n_rows = dataset.n_rows();
    let mut columns = dataset.into_columns();

    for column in &mut columns {
        column.name = normalize_column_name(&column.name);
    }

    rename_if_absent(&mut columns, HOURS_MISSPELLING, "average_monthly_hours");
    rename_if_absent(&mut columns, TENURE_ALIAS, "tenure");

    for column in &mut columns {
        if NUMERIC_COLUMNS.contains(&column.name.as_str()) {
            coerce_numeric(&mut column.data);
        } else if CATEGORICAL_COLUMNS.contains(&column.name.as_str()) {
            coerce_categorical(&mut column.data);
        }
    }

    Dataset::from_parts(columns, n_rows)
}

/// Trim and lowercase a column name
pub fn normalize_column_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Trim and lowercase a categorical value; empty values are missing.
///
/// Serving and training both go through this function so the encoder never
/// sees a legitimate category in a different spelling.
pub fn normalize_category(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_lowercase())
    }
}

/// Parse a cell as a finite number; anything else is missing
pub fn parse_numeric(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

fn rename_if_absent(columns: &mut [Column], from: &str, to: &str) {
    if columns.iter().any(|c| c.name == to) {
        return;
    }
    if let Some(column) = columns.iter_mut().find(|c| c.name == from) {
        column.name = to.to_string();
    }
}

fn coerce_numeric(data: &mut ColumnData) {
    if let ColumnData::Text(values) = data {
        let parsed = values
            .iter()
            .map(|v| v.as_deref().and_then(parse_numeric))
            .collect();
        *data = ColumnData::Numeric(parsed);
    }
}

fn coerce_categorical(data: &mut ColumnData) {
    let normalized = match data {
        ColumnData::Text(values) => values
            .iter()
            .map(|v| v.as_deref().and_then(normalize_category))
            .collect(),
        ColumnData::Numeric(values) => values
            .iter()
            .map(|v| v.and_then(|n| normalize_category(&n.to_string())))
            .collect(),
    };
    *data = ColumnData::Text(normalized);
}
