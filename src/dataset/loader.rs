use crate::dataset::table::{Column, Dataset};
use crate::error::{AppError, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

/// Load a CSV file as a raw (all-text) dataset
pub fn load_csv(path: &Path) -> Result<Dataset> {
    let file = File::open(path)
        .map_err(|e| AppError::Dataset(format!("cannot open {}: {}", path.display(), e)))?;
    let dataset = read_csv(file)?;

    debug!(
        path = %path.display(),
        rows = dataset.n_rows(),
        columns = dataset.n_columns(),
        "Dataset loaded"
    );

    Ok(dataset)
}

/// Read CSV from any reader. Ragged rows are tolerated: absent cells become
/// missing values and surplus cells are ignored.
pub fn read_csv<R: Read>(reader: R) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .byte_headers()?
        .iter()
        .map(|h| String::from_utf8_lossy(h).into_owned())
        .collect();

    let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
    let mut skipped = 0usize;

    for record in reader.byte_records() {
        let record = match record {
            Ok(record) => record,
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => {
                skipped += 1;
                debug!(error = %e, "Skipping unreadable CSV record");
                continue;
            }
        };

        for (idx, column) in cells.iter_mut().enumerate() {
            column.push(
                record
                    .get(idx)
                    .map(|field| String::from_utf8_lossy(field).into_owned()),
            );
        }
    }

    if skipped > 0 {
        warn!(skipped, "Skipped unreadable CSV records");
    }

    let columns = headers
        .into_iter()
        .zip(cells)
        .map(|(name, values)| Column::text(name, values))
        .collect();

    Dataset::from_columns(columns)
}
