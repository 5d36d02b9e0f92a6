#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! HUD Fair Market Rent benchmarks.
//!
//! Each fiscal year ships as its own workbook with its own column names.
//! [`columns`] picks the geography, two-bedroom rent, and county columns,
//! [`expansion`] maps county rows onto the ACS geographies they stand for,
//! and [`extract`] ties both together one year at a time.

pub mod columns;
pub mod expansion;
pub mod extract;

use std::path::PathBuf;

use housing_table::TableError;

pub use columns::{ColumnPolicy, ColumnRole, StrategyKind};
pub use expansion::{ExpansionError, ExpansionRule, ExpansionTable};
pub use extract::{BenchmarkReport, extract, extract_table, load_benchmarks, try_extract};

/// Why a benchmark year contributed no records.
#[derive(Debug, thiserror::Error)]
pub enum BenchmarkSkip {
    /// No file is configured for the year.
    #[error("No benchmark file configured for {year}")]
    MissingConfig {
        /// Fiscal year.
        year: u16,
    },

    /// The configured file does not exist.
    #[error("Benchmark file for {year} not found: {}", path.display())]
    MissingFile {
        /// Fiscal year.
        year: u16,
        /// Configured path.
        path: PathBuf,
    },

    /// The file exists but could not be read as a table.
    #[error("Cannot read benchmark file for {year} ({}): {source}", path.display())]
    UnreadableWorkbook {
        /// Fiscal year.
        year: u16,
        /// Workbook path.
        path: PathBuf,
        /// Underlying loader error.
        source: TableError,
    },

    /// No column plausibly holds one of the required fields.
    #[error(
        "No plausible {role} column in benchmark file for {year} ({}), columns: {columns:?}",
        path.display()
    )]
    NoPlausibleColumn {
        /// Fiscal year.
        year: u16,
        /// Workbook path.
        path: PathBuf,
        /// Field that could not be matched.
        role: ColumnRole,
        /// Header row as found.
        columns: Vec<String>,
    },
}

impl BenchmarkSkip {
    /// The fiscal year that was skipped.
    #[must_use]
    pub const fn year(&self) -> u16 {
        match self {
            Self::MissingConfig { year }
            | Self::MissingFile { year, .. }
            | Self::UnreadableWorkbook { year, .. }
            | Self::NoPlausibleColumn { year, .. } => *year,
        }
    }
}
