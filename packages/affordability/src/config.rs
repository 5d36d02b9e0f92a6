//! Pipeline settings loaded from TOML.
//!
//! ```toml
//! data_root = "data/raw"
//! years = { start = 2013, end = 2023 }
//! geography_match = "exact"
//!
//! [geographies]
//! hennepin_county = "Hennepin County, Minnesota"
//!
//! [benchmark_files]
//! 2020 = "2020/FY20_4050_FMRs_rev.xlsx"
//!
//! [[expansions]]
//! county_contains = "hennepin"
//! geographies = ["Hennepin County, Minnesota", "Minneapolis city, Minnesota"]
//! ```
//!
//! A relative `data_root` resolves against the settings file's directory.
//! Relative benchmark paths resolve against `data_root`.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use housing_geography_models::{AllowList, GeographyMatch};
use housing_hud::{ExpansionRule, ExpansionTable};
use serde::Deserialize;

/// Errors that can occur while loading pipeline settings.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The settings file could not be read.
    #[error("Failed to read config {}: {source}", path.display())]
    Io {
        /// Settings file path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The settings file is not valid TOML or has the wrong shape.
    #[error("Failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),

    /// The settings parsed but are unusable.
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Years to process: an inclusive range or an explicit list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum YearSpec {
    /// `{ start = 2013, end = 2023 }`, both ends included.
    Range {
        /// First year.
        start: u16,
        /// Last year.
        end: u16,
    },
    /// `[2019, 2021]`, processed in the listed order.
    List(Vec<u16>),
}

impl YearSpec {
    /// Expands to the ordered list of years.
    #[must_use]
    pub fn to_vec(&self) -> Vec<u16> {
        match self {
            Self::Range { start, end } => (*start..=*end).collect(),
            Self::List(years) => years.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    data_root: PathBuf,
    years: YearSpec,
    #[serde(default)]
    geography_match: GeographyMatch,
    #[serde(default)]
    geographies: BTreeMap<String, String>,
    #[serde(default)]
    benchmark_files: BTreeMap<String, PathBuf>,
    expansions: Option<Vec<ExpansionRule>>,
}

/// Validated pipeline settings.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Root directory holding one sub-directory per survey year.
    pub data_root: PathBuf,
    /// Years to process, in output order.
    pub years: Vec<u16>,
    /// How geography labels are compared in the allow-list and benchmark join.
    pub geography_match: GeographyMatch,
    /// `short_key → ACS geography label` for every geography to keep.
    pub geographies: BTreeMap<String, String>,
    /// Benchmark workbook per fiscal year, already resolved against
    /// `data_root`.
    pub benchmark_files: BTreeMap<u16, PathBuf>,
    /// County expansion rules for benchmark rows.
    pub expansions: ExpansionTable,
}

impl PipelineConfig {
    /// Reads and validates a settings file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read, parsed, or
    /// validated.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Self::parse(&text, base)
    }

    /// Parses and validates settings from TOML text. A relative
    /// `data_root` is kept as written.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the text cannot be parsed or validated.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Self::parse(text, Path::new(""))
    }

    fn parse(text: &str, base: &Path) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(text)?;

        if let YearSpec::Range { start, end } = raw.years
            && start > end
        {
            return Err(ConfigError::Invalid(format!(
                "year range is inverted ({start} > {end})"
            )));
        }
        let years = raw.years.to_vec();
        if years.is_empty() {
            return Err(ConfigError::Invalid("no years configured".to_string()));
        }
        let mut seen = BTreeSet::new();
        if let Some(year) = years.iter().find(|year| !seen.insert(**year)) {
            return Err(ConfigError::Invalid(format!(
                "year {year} is listed more than once"
            )));
        }

        if raw.geographies.is_empty() {
            return Err(ConfigError::Invalid(
                "no geographies configured".to_string(),
            ));
        }
        if let Some((key, _)) = raw
            .geographies
            .iter()
            .find(|(_, label)| label.trim().is_empty())
        {
            return Err(ConfigError::Invalid(format!(
                "geography '{key}' has an empty label"
            )));
        }

        let data_root = base.join(raw.data_root);

        let mut benchmark_files = BTreeMap::new();
        for (year, path) in raw.benchmark_files {
            let year: u16 = year.trim().parse().map_err(|_| {
                ConfigError::Invalid(format!("benchmark_files key '{year}' is not a year"))
            })?;
            benchmark_files.insert(year, data_root.join(path));
        }

        let expansions = match raw.expansions {
            Some(rules) => {
                ExpansionTable::new(rules).map_err(|e| ConfigError::Invalid(e.to_string()))?
            }
            None => ExpansionTable::embedded(),
        };

        Ok(Self {
            data_root,
            years,
            geography_match: raw.geography_match,
            geographies: raw.geographies,
            benchmark_files,
            expansions,
        })
    }

    /// Allow-list built from the configured geographies and match mode.
    #[must_use]
    pub fn allow_list(&self) -> AllowList {
        AllowList::new(self.geographies.clone(), self.geography_match)
    }
}
