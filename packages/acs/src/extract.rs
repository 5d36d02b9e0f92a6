//! Median-row extraction from wide-by-geography ACS exports.
//!
//! The export layout:
//!
//! ```text
//! Label (Grouping) | Hennepin County, Minnesota!!Estimate | Hennepin County, Minnesota!!Margin of Error | ...
//! Median household income ... | 96,339 | ±1,012 | ...
//! ```
//!
//! The row is found by its label text, the `!!Estimate` columns are kept,
//! and each becomes a [`MetricRecord`].

use std::path::Path;

use housing_affordability_models::{MetricId, MetricRecord};
use housing_geography_models::GeographyKey;
use housing_table::{Cell, RawTable};

use crate::AcsError;

/// Column holding the statistic label for each row.
pub const LABEL_COLUMN: &str = "Label (Grouping)";

/// Separator between the geography label and the column kind.
pub const SEPARATOR: &str = "!!";

/// Suffix marking an estimate column (as opposed to `!!Margin of Error`).
pub const ESTIMATE_SUFFIX: &str = "!!Estimate";

/// Case-insensitive label text that identifies the row of interest.
const MEDIAN_MARKER: &str = "median";

/// A text cell that could not be read as a number.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot parse {raw:?} as a number")]
pub struct ValueParseError {
    /// The cell text as it appeared in the file.
    pub raw: String,
}

/// Loads an ACS export and extracts one record per geography.
///
/// # Errors
///
/// Returns [`AcsError::Table`] if the file cannot be loaded and
/// [`AcsError::Schema`] if it lacks the label column, data rows, or estimate
/// columns.
pub fn extract(path: &Path, year: u16, metric: MetricId) -> Result<Vec<MetricRecord>, AcsError> {
    let table = housing_table::load(path).map_err(|source| AcsError::Table {
        path: path.to_path_buf(),
        source,
    })?;
    extract_table(&table, path, year, metric)
}

/// Extracts records from an already-loaded table. `origin` is used only in
/// errors and log messages.
///
/// # Errors
///
/// Returns [`AcsError::Schema`] if the label column is missing, the table
/// has no rows, or no column ends with [`ESTIMATE_SUFFIX`].
pub fn extract_table(
    table: &RawTable,
    origin: &Path,
    year: u16,
    metric: MetricId,
) -> Result<Vec<MetricRecord>, AcsError> {
    let label_idx = table
        .column_index(LABEL_COLUMN)
        .ok_or_else(|| AcsError::Schema {
            path: origin.to_path_buf(),
            message: format!(
                "expected '{LABEL_COLUMN}' column, found columns: {:?}",
                table.columns()
            ),
        })?;

    let row_idx = select_row(table, label_idx).ok_or_else(|| AcsError::Schema {
        path: origin.to_path_buf(),
        message: "table has no data rows".to_string(),
    })?;

    let estimate_cols = estimate_columns(table.columns());
    if estimate_cols.is_empty() {
        return Err(AcsError::Schema {
            path: origin.to_path_buf(),
            message: format!(
                "no '{ESTIMATE_SUFFIX}' columns found; columns: {:?}",
                table.columns()
            ),
        });
    }

    let records = estimate_cols
        .into_iter()
        .map(|(col_idx, geography)| {
            let value = match normalize_value(table.cell(row_idx, col_idx)) {
                Ok(value) => value,
                Err(e) => {
                    log::warn!(
                        "{} {year} {metric} '{geography}': {e}, treating as missing",
                        origin.display()
                    );
                    None
                }
            };
            MetricRecord {
                year,
                geography: GeographyKey::new(geography),
                metric,
                value,
            }
        })
        .collect::<Vec<_>>();

    log::debug!(
        "{}: extracted {} {metric} records for {year}",
        origin.display(),
        records.len()
    );

    Ok(records)
}

/// Picks the row of interest: the first whose label contains "median"
/// (case-insensitive), else the first row. Returns `None` only for an
/// empty table.
#[must_use]
pub fn select_row(table: &RawTable, label_idx: usize) -> Option<usize> {
    if table.is_empty() {
        return None;
    }

    let found = (0..table.len()).find(|&row| {
        table
            .cell(row, label_idx)
            .to_string()
            .to_lowercase()
            .contains(MEDIAN_MARKER)
    });

    Some(found.unwrap_or_else(|| {
        log::warn!("No 'Median' row found, falling back to the first row");
        0
    }))
}

/// Returns `(column index, geography label)` for every estimate column, in
/// column order.
#[must_use]
pub fn estimate_columns(columns: &[String]) -> Vec<(usize, &str)> {
    columns
        .iter()
        .enumerate()
        .filter(|(_, name)| name.ends_with(ESTIMATE_SUFFIX))
        .map(|(i, name)| (i, geography_from_column(name)))
        .collect()
}

/// Returns the text before the first [`SEPARATOR`] in a column name.
#[must_use]
pub fn geography_from_column(column: &str) -> &str {
    column.split(SEPARATOR).next().unwrap_or(column)
}

/// Normalizes a raw cell into an optional number.
///
/// Blank cells and text that is empty after removing thousands separators
/// and surrounding whitespace are absent (`Ok(None)`), never zero.
///
/// # Errors
///
/// Returns [`ValueParseError`] for text that is not a number once cleaned
/// (e.g. `"-"`, `"N"`, `"250,000+"`).
pub fn normalize_value(cell: &Cell) -> Result<Option<f64>, ValueParseError> {
    match cell {
        Cell::Empty => Ok(None),
        Cell::Number(v) => Ok(Some(*v)),
        Cell::Text(raw) => {
            let cleaned = raw.replace(',', "");
            let cleaned = cleaned.trim();
            if cleaned.is_empty() {
                return Ok(None);
            }
            cleaned
                .parse::<f64>()
                .map(Some)
                .map_err(|_| ValueParseError { raw: raw.clone() })
        }
    }
}
