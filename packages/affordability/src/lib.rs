#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Housing affordability time series.
//!
//! Combines ACS five-year medians (income, home value, rent) with HUD Fair
//! Market Rent benchmarks into one [`AffordabilityRecord`] per
//! (year, geography). Settings come from a [`PipelineConfig`]; [`run`]
//! performs the whole pipeline.
//!
//! [`AffordabilityRecord`]: housing_affordability_models::AffordabilityRecord

pub mod config;
pub mod reconcile;

use housing_acs::AcsError;

pub use config::{ConfigError, PipelineConfig, YearSpec};
pub use reconcile::{RunOutput, join_benchmarks, join_metrics, reconcile, run};

/// Errors that can occur while reconciling.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// A mandatory ACS table could not be located or extracted.
    #[error(transparent)]
    Acs(#[from] AcsError),

    /// The settings or requested years are unusable.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
