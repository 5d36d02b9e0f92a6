//! CSV table loader.
//!
//! Reads a comma-separated file whose first row is the header. Cells are
//! kept as text exactly as written; only zero-length fields become
//! [`Cell::Empty`]. Headers are trimmed and stripped of a leading UTF-8
//! byte-order mark, which Census exports commonly carry.

use std::path::Path;

use crate::{Cell, RawTable, TableError};

/// Loads a CSV file into a [`RawTable`].
///
/// # Errors
///
/// Returns [`TableError`] if the file cannot be opened or a record cannot be
/// parsed.
pub fn load_csv(path: &Path) -> Result<RawTable, TableError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)?;

    let columns: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_owned())
        .collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        rows.push(record.iter().map(text_cell).collect());
    }

    log::debug!(
        "Loaded {} rows x {} columns from {}",
        rows.len(),
        columns.len(),
        path.display()
    );

    Ok(RawTable::new(columns, rows))
}

/// Converts one CSV field into a cell.
fn text_cell(field: &str) -> Cell {
    if field.is_empty() {
        Cell::Empty
    } else {
        Cell::Text(field.to_owned())
    }
}
