#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! ACS five-year estimate loading.
//!
//! Census "wide-by-geography" CSV exports put one row per statistic and two
//! columns per geography (`<Geo>!!Estimate` and `<Geo>!!Margin of Error`).
//! [`locate`] finds the export for a (year, table) pair on disk and
//! [`extract`] pivots the median row into one [`MetricRecord`] per
//! geography.

pub mod extract;
pub mod locate;

use std::path::{Path, PathBuf};

use housing_affordability_models::{MetricId, MetricRecord};
use housing_table::TableError;

pub use extract::{ValueParseError, extract, extract_table, normalize_value};
pub use locate::locate;

/// Errors that can occur while locating or extracting an ACS table.
#[derive(Debug, thiserror::Error)]
pub enum AcsError {
    /// The year directory or a matching export file does not exist.
    #[error("Not found: {message} ({})", path.display())]
    NotFound {
        /// Directory or file that was searched.
        path: PathBuf,
        /// Description of what was missing.
        message: String,
    },

    /// A mandatory column is missing or the table has no usable data.
    #[error("Schema error in {}: {message}", path.display())]
    Schema {
        /// File being extracted.
        path: PathBuf,
        /// Description of what was wrong.
        message: String,
    },

    /// The file could not be loaded as a table.
    #[error("Failed to load {}: {source}", path.display())]
    Table {
        /// File being loaded.
        path: PathBuf,
        /// Underlying loader error.
        source: TableError,
    },
}

/// Locates and extracts one metric table for one year.
///
/// # Errors
///
/// Returns [`AcsError`] if the export cannot be found, loaded, or does not
/// have the expected shape.
pub fn load_metric(
    data_root: &Path,
    year: u16,
    metric: MetricId,
) -> Result<Vec<MetricRecord>, AcsError> {
    let path = locate(data_root, year, metric.table_id())?;
    log::info!(
        "Loading {} ({}) for {year} from {}",
        metric,
        metric.table_id(),
        path.display()
    );
    extract(&path, year, metric)
}
