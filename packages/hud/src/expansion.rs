//! County → canonical geography expansion.
//!
//! A HUD row describes one county, but the output is keyed by ACS
//! geographies, which include cities. An [`ExpansionTable`] lists which
//! county rows feed which ACS geographies. Rules are data, loaded from TOML,
//! so adding a geography never needs a code change.
//!
//! ```toml
//! [[expansions]]
//! county_contains = "hennepin"
//! geographies = ["Hennepin County, Minnesota", "Minneapolis city, Minnesota"]
//! ```

use housing_geography_models::GeographyKey;
use serde::Deserialize;

/// Rules embedded at compile time, used when no table is configured.
const DEFAULT_EXPANSIONS: &str = include_str!("../expansions/minnesota.toml");

/// Errors that can occur while building an expansion table.
#[derive(Debug, thiserror::Error)]
pub enum ExpansionError {
    /// The TOML text could not be parsed.
    #[error("Failed to parse expansion table: {0}")]
    Toml(#[from] toml::de::Error),

    /// A rule is unusable.
    #[error("Invalid expansion rule #{index}: {message}")]
    InvalidRule {
        /// Zero-based rule position.
        index: usize,
        /// Description of the problem.
        message: String,
    },
}

/// One county-substring predicate and the geographies it expands to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExpansionRule {
    /// Case-insensitive substring matched against the county name.
    pub county_contains: String,
    /// Canonical geographies that receive the row's benchmark value.
    pub geographies: Vec<String>,
}

impl ExpansionRule {
    /// Whether this rule applies to `county_name`.
    #[must_use]
    pub fn matches(&self, county_name: &str) -> bool {
        county_name
            .to_lowercase()
            .contains(&self.county_contains.to_lowercase())
    }
}

#[derive(Debug, Deserialize)]
struct ExpansionFile {
    #[serde(default)]
    expansions: Vec<ExpansionRule>,
}

/// An ordered set of [`ExpansionRule`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpansionTable {
    rules: Vec<ExpansionRule>,
}

impl Default for ExpansionTable {
    fn default() -> Self {
        Self::embedded()
    }
}

impl ExpansionTable {
    /// Builds a table from rules, rejecting blank predicates and rules with
    /// no target geographies.
    ///
    /// # Errors
    ///
    /// Returns [`ExpansionError::InvalidRule`] for the first unusable rule.
    pub fn new(rules: Vec<ExpansionRule>) -> Result<Self, ExpansionError> {
        for (index, rule) in rules.iter().enumerate() {
            if rule.county_contains.trim().is_empty() {
                return Err(ExpansionError::InvalidRule {
                    index,
                    message: "county_contains is empty".to_string(),
                });
            }
            if rule.geographies.is_empty() {
                return Err(ExpansionError::InvalidRule {
                    index,
                    message: format!("'{}' maps to no geographies", rule.county_contains),
                });
            }
        }
        Ok(Self { rules })
    }

    /// Parses a table from TOML text with an `[[expansions]]` array.
    ///
    /// # Errors
    ///
    /// Returns [`ExpansionError`] if the TOML is malformed or a rule is
    /// invalid.
    pub fn from_toml(text: &str) -> Result<Self, ExpansionError> {
        let file: ExpansionFile = toml::from_str(text)?;
        Self::new(file.expansions)
    }

    /// The rules shipped with the crate.
    ///
    /// # Panics
    ///
    /// Panics if the embedded TOML is malformed (it is fixed at compile
    /// time and covered by tests).
    #[must_use]
    pub fn embedded() -> Self {
        Self::from_toml(DEFAULT_EXPANSIONS)
            .unwrap_or_else(|e| panic!("Failed to parse embedded expansions: {e}"))
    }

    /// Rules in evaluation order.
    #[must_use]
    pub fn rules(&self) -> &[ExpansionRule] {
        &self.rules
    }

    /// Returns every geography the county expands to, in rule order.
    /// Empty when no rule matches.
    #[must_use]
    pub fn expand(&self, county_name: &str) -> Vec<GeographyKey> {
        self.rules
            .iter()
            .filter(|rule| rule.matches(county_name))
            .flat_map(|rule| rule.geographies.iter().map(|g| GeographyKey::new(g.as_str())))
            .collect()
    }
}
