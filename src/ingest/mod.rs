//! Tabular input loading
//!
//! Reads a header-row CSV file into a [`RawTable`]. Values are not coerced
//! here beyond the cell-level parse (`""` -> missing, numeric text ->
//! number); schema handling belongs to the feature preparer.

use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::types::{CellValue, RawTable};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("cannot open {}: {}", .0.display(), .1)]
    Open(PathBuf, std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("input has no header row")]
    MissingHeader,
}

/// Load a CSV file from disk.
pub fn read_csv_file(path: &Path) -> Result<RawTable, IngestError> {
    let file = std::fs::File::open(path).map_err(|e| IngestError::Open(path.to_path_buf(), e))?;
    let table = read_csv(file)?;
    debug!(
        path = %path.display(),
        rows = table.row_count(),
        columns = table.column_names().len(),
        "Loaded CSV input"
    );
    Ok(table)
}

/// Parse CSV from any reader. Ragged rows are a hard error.
pub fn read_csv<R: Read>(reader: R) -> Result<RawTable, IngestError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    if headers.is_empty() || headers.iter().all(String::is_empty) {
        return Err(IngestError::MissingHeader);
    }

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        rows.push(record.iter().map(CellValue::parse).collect());
    }

    Ok(RawTable::from_rows(&headers, rows))
}
