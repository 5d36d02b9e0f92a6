#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Raw table loading for loosely structured spreadsheet exports.
//!
//! A [`RawTable`] is a verbatim, in-memory copy of one input file: a header
//! row of column names plus rows of [`Cell`]s. No schema is applied here;
//! locating the interesting rows and columns is left to the extractors.
//! File handles are owned by the loader functions and released before the
//! table is returned.

pub mod csv_file;
pub mod workbook;

use std::fmt;
use std::path::{Path, PathBuf};

/// Errors that can occur while loading a raw table.
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    /// I/O error (file open/read).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The workbook could not be opened or its first sheet could not be read.
    #[error("Failed to read workbook {}: {source}", path.display())]
    Workbook {
        /// Path of the workbook.
        path: PathBuf,
        /// Underlying reader error.
        source: calamine::Error,
    },

    /// The workbook has no worksheets, or its first sheet has no header row.
    #[error("Workbook {} contains no readable worksheet", path.display())]
    EmptyWorkbook {
        /// Path of the workbook.
        path: PathBuf,
    },

    /// The file extension is not a supported table format.
    #[error("Unsupported table format: {}", path.display())]
    UnsupportedFormat {
        /// Path of the file.
        path: PathBuf,
    },
}

/// A single cell as loaded from the source file.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// Missing or blank cell.
    Empty,
    /// Text exactly as it appeared in the file.
    Text(String),
    /// A value the source format stored as a number.
    Number(f64),
}

impl Cell {
    /// Whether the cell holds no value.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Returns the text content, if this is a text cell.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Reads the cell as a number the way a typed loader would: numeric
    /// cells pass through and text cells that are a plain number (after
    /// trimming) are accepted. Anything else yields `None`.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            Self::Text(s) => s.trim().parse::<f64>().ok(),
            Self::Empty => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Text(s) => f.write_str(s),
            Self::Number(v) => write!(f, "{v}"),
        }
    }
}

/// Shared blank cell returned for out-of-range lookups.
static EMPTY_CELL: Cell = Cell::Empty;

/// An in-memory 2-D table with named columns.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl RawTable {
    /// Builds a table from a header and rows. Rows shorter than the header
    /// are padded with [`Cell::Empty`]; longer rows are truncated.
    #[must_use]
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, Cell::Empty);
                row
            })
            .collect();
        Self { columns, rows }
    }

    /// Column names in file order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Data rows in file order (header excluded).
    #[must_use]
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    /// Returns the index of the column named exactly `name`.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Whether a column named exactly `name` exists.
    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Returns the cell at (`row`, `column`), or [`Cell::Empty`] when out
    /// of range.
    #[must_use]
    pub fn cell(&self, row: usize, column: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .unwrap_or(&EMPTY_CELL)
    }

    /// Number of data rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no data rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Loads a table from a file, dispatching on its extension.
///
/// Supported formats:
/// * `.csv`          – comma-separated text with a header row
/// * `.xls` / `.xlsx` / `.xlsm` / `.xlsb` / `.ods` – first worksheet, first
///   row as header
///
/// # Errors
///
/// Returns [`TableError`] if the format is unsupported or the file cannot
/// be read.
pub fn load(path: &Path) -> Result<RawTable, TableError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => csv_file::load_csv(path),
        "xls" | "xlsx" | "xlsm" | "xlsb" | "ods" => workbook::load_workbook(path),
        _ => Err(TableError::UnsupportedFormat {
            path: path.to_path_buf(),
        }),
    }
}
