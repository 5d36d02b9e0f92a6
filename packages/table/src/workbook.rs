//! Excel/ODS workbook loader backed by `calamine`.
//!
//! Only the first worksheet is read. Its first row becomes the header;
//! blank header cells are named `Unnamed: <index>` so every column stays
//! addressable.

use std::path::Path;

use calamine::{Data, Reader as _, open_workbook_auto};

use crate::{Cell, RawTable, TableError};

/// Loads the first worksheet of a workbook into a [`RawTable`].
///
/// # Errors
///
/// Returns [`TableError::Workbook`] if the file cannot be opened or parsed
/// (including malformed document metadata), or
/// [`TableError::EmptyWorkbook`] if there is no worksheet or header row.
pub fn load_workbook(path: &Path) -> Result<RawTable, TableError> {
    let mut workbook = open_workbook_auto(path).map_err(|source| TableError::Workbook {
        path: path.to_path_buf(),
        source,
    })?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| TableError::EmptyWorkbook {
            path: path.to_path_buf(),
        })?
        .map_err(|source| TableError::Workbook {
            path: path.to_path_buf(),
            source,
        })?;

    let mut rows_iter = range.rows();
    let header = rows_iter.next().ok_or_else(|| TableError::EmptyWorkbook {
        path: path.to_path_buf(),
    })?;

    let columns: Vec<String> = header
        .iter()
        .enumerate()
        .map(|(i, data)| header_name(data, i))
        .collect();

    let rows: Vec<Vec<Cell>> = rows_iter
        .map(|row| row.iter().map(data_cell).collect())
        .collect();

    log::debug!(
        "Loaded {} rows x {} columns from {}",
        rows.len(),
        columns.len(),
        path.display()
    );

    Ok(RawTable::new(columns, rows))
}

/// Renders a header cell as a column name.
fn header_name(data: &Data, index: usize) -> String {
    let name = match data_cell(data) {
        Cell::Empty => String::new(),
        Cell::Text(s) => s.trim().to_owned(),
        Cell::Number(v) => v.to_string(),
    };
    if name.is_empty() {
        format!("Unnamed: {index}")
    } else {
        name
    }
}

/// Converts a `calamine` cell into a [`Cell`].
fn data_cell(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Empty,
        #[allow(clippy::cast_precision_loss)]
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => {
            if s.is_empty() {
                Cell::Empty
            } else {
                Cell::Text(s.clone())
            }
        }
    }
}
