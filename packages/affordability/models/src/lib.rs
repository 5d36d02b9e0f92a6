#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Record types flowing through the affordability pipeline.
//!
//! The ACS side produces [`MetricRecord`]s, the HUD side produces
//! [`BenchmarkRecord`]s, and the reconciler folds both into
//! [`AffordabilityRecord`]s, the only type visible to callers.

use housing_geography_models::GeographyKey;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// One of the three ACS median metrics.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MetricId {
    /// Median household income (table `B19013`).
    Income,
    /// Median value of owner-occupied housing units (table `B25077`).
    HomeValue,
    /// Median gross rent (table `B25064`).
    Rent,
}

impl MetricId {
    /// All metrics in join order. Income comes first because its iteration
    /// order determines output order.
    pub const ALL: &[Self] = &[Self::Income, Self::HomeValue, Self::Rent];

    /// ACS detailed table identifier for this metric.
    #[must_use]
    pub const fn table_id(self) -> &'static str {
        match self {
            Self::Income => "B19013",
            Self::HomeValue => "B25077",
            Self::Rent => "B25064",
        }
    }

    /// Output column name for this metric.
    #[must_use]
    pub const fn column_name(self) -> &'static str {
        match self {
            Self::Income => "median_household_income",
            Self::HomeValue => "median_home_value",
            Self::Rent => "median_gross_rent",
        }
    }

    /// Looks up a metric by its ACS table identifier.
    #[must_use]
    pub fn from_table_id(table_id: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|metric| metric.table_id().eq_ignore_ascii_case(table_id))
    }
}

/// A single ACS estimate for one geography in one year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    /// Survey year (five-year estimate end year).
    pub year: u16,
    /// Geography label taken from the estimate column header.
    pub geography: GeographyKey,
    /// Which metric this estimate belongs to.
    pub metric: MetricId,
    /// The estimate, `None` when the cell was blank or unparseable.
    pub value: Option<f64>,
}

/// A HUD Fair Market Rent value mapped onto a canonical geography.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkRecord {
    /// Fiscal year of the benchmark file.
    pub year: u16,
    /// Canonical (ACS-style) geography label.
    pub geography: GeographyKey,
    /// Two-bedroom Fair Market Rent, carried verbatim from the source cell.
    pub benchmark_value: f64,
}

/// The reconciled, tidy output row.
///
/// Field order is the stable output column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffordabilityRecord {
    /// Survey year.
    pub year: u16,
    /// Geography label.
    pub geography: GeographyKey,
    /// Median household income.
    pub median_household_income: Option<f64>,
    /// Median home value.
    pub median_home_value: Option<f64>,
    /// Median monthly gross rent.
    pub median_gross_rent: Option<f64>,
    /// HUD two-bedroom Fair Market Rent, when a benchmark matched.
    pub hud_fmr_2br: Option<f64>,
    /// `median_home_value / median_household_income`.
    pub price_to_income: Option<f64>,
    /// `median_gross_rent * 12 / median_household_income`.
    pub rent_to_income: Option<f64>,
}

impl AffordabilityRecord {
    /// Output column names, in serialization order.
    pub const COLUMNS: &[&str] = &[
        "year",
        "geography",
        "median_household_income",
        "median_home_value",
        "median_gross_rent",
        "hud_fmr_2br",
        "price_to_income",
        "rent_to_income",
    ];

    /// Builds a record from the three joined metrics and derives both ratios.
    #[must_use]
    pub fn new(
        year: u16,
        geography: GeographyKey,
        income: Option<f64>,
        home_value: Option<f64>,
        rent: Option<f64>,
    ) -> Self {
        Self {
            year,
            geography,
            median_household_income: income,
            median_home_value: home_value,
            median_gross_rent: rent,
            hud_fmr_2br: None,
            price_to_income: price_to_income(home_value, income),
            rent_to_income: rent_to_income(rent, income),
        }
    }
}

/// Divides `numerator` by `denominator`, yielding `None` when either side is
/// absent, the denominator is zero, or the result is not finite.
#[must_use]
pub fn ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    let numerator = numerator?;
    let denominator = denominator?;
    if denominator == 0.0 {
        return None;
    }
    Some(numerator / denominator).filter(|v| v.is_finite())
}

/// Home value divided by household income.
#[must_use]
pub fn price_to_income(home_value: Option<f64>, income: Option<f64>) -> Option<f64> {
    ratio(home_value, income)
}

/// Annualized rent divided by household income.
#[must_use]
pub fn rent_to_income(monthly_rent: Option<f64>, income: Option<f64>) -> Option<f64> {
    ratio(monthly_rent.map(|rent| rent * 12.0), income)
}
