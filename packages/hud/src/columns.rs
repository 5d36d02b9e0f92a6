//! Column discovery for HUD Fair Market Rent workbooks.
//!
//! HUD renames columns between fiscal years (`areaname`/`fmr_2` in recent
//! files, `Areaname`, `FMR2`, `fmr2br`, ... in older ones). Rather than a
//! fixed mapping, a [`ColumnPolicy`] holds an ordered list of
//! [`SelectionStrategy`]s; the first one that resolves both the geography
//! and the benchmark value column wins.

use strum_macros::{AsRefStr, Display};

/// Which field a column search was looking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum ColumnRole {
    /// Area / geography name column.
    Geography,
    /// Two-bedroom Fair Market Rent column.
    BenchmarkValue,
    /// County name column used for geography expansion.
    County,
}

/// How a [`SelectionStrategy`] matches column names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum StrategyKind {
    /// Known column names, compared exactly.
    Exact,
    /// Keyword search over lowercased column names.
    Keyword,
}

/// Matches a single column name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnMatcher {
    /// Column named exactly this (case-sensitive).
    Exact(String),
    /// Column whose lowercased name contains any of these keywords.
    Contains(Vec<String>),
}

impl ColumnMatcher {
    /// Builds an [`Self::Exact`] matcher.
    #[must_use]
    pub fn exact(name: &str) -> Self {
        Self::Exact(name.to_string())
    }

    /// Builds a [`Self::Contains`] matcher. Keywords are lowercased.
    #[must_use]
    pub fn contains(keywords: &[&str]) -> Self {
        Self::Contains(keywords.iter().map(|k| k.to_lowercase()).collect())
    }

    /// Returns the index of the first column this matcher accepts.
    #[must_use]
    pub fn find(&self, columns: &[String]) -> Option<usize> {
        match self {
            Self::Exact(name) => columns.iter().position(|c| c == name),
            Self::Contains(keywords) => columns.iter().position(|c| {
                let lower = c.to_lowercase();
                keywords.iter().any(|k| lower.contains(k.as_str()))
            }),
        }
    }
}

/// Resolves the geography and value columns together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionStrategy {
    /// Matching style, reported in log messages.
    pub kind: StrategyKind,
    /// Matcher for the geography-name column.
    pub geography: ColumnMatcher,
    /// Matcher for the benchmark value column.
    pub value: ColumnMatcher,
}

impl SelectionStrategy {
    /// Resolves both columns, or reports the first role that had no
    /// candidate.
    ///
    /// # Errors
    ///
    /// Returns the [`ColumnRole`] that could not be matched.
    pub fn resolve(&self, columns: &[String]) -> Result<(usize, usize), ColumnRole> {
        let geography = self.geography.find(columns).ok_or(ColumnRole::Geography)?;
        let value = self.value.find(columns).ok_or(ColumnRole::BenchmarkValue)?;
        Ok((geography, value))
    }
}

/// Column indices chosen for one workbook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectedColumns {
    /// Area name column.
    pub geography: usize,
    /// Benchmark value column.
    pub value: usize,
    /// County name column.
    pub county: usize,
    /// Kind of the strategy that resolved geography and value.
    pub strategy: StrategyKind,
}

/// Ordered column-selection policy for a benchmark workbook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnPolicy {
    /// Geography/value strategies in priority order.
    pub strategies: Vec<SelectionStrategy>,
    /// County column matchers in priority order.
    pub county: Vec<ColumnMatcher>,
}

impl Default for ColumnPolicy {
    fn default() -> Self {
        Self::hud_fmr()
    }
}

impl ColumnPolicy {
    /// Policy for HUD county-level Fair Market Rent files.
    ///
    /// 1. Exact `areaname` + `fmr_2`
    /// 2. First column containing `name`/`area`, first column containing
    ///    `2br`/`2 br`/`fmr2`/`fmr_2`
    ///
    /// The county column is `countyname`, else the first containing
    /// `county`.
    #[must_use]
    pub fn hud_fmr() -> Self {
        Self {
            strategies: vec![
                SelectionStrategy {
                    kind: StrategyKind::Exact,
                    geography: ColumnMatcher::exact("areaname"),
                    value: ColumnMatcher::exact("fmr_2"),
                },
                SelectionStrategy {
                    kind: StrategyKind::Keyword,
                    geography: ColumnMatcher::contains(&["name", "area"]),
                    value: ColumnMatcher::contains(&["2br", "2 br", "fmr2", "fmr_2"]),
                },
            ],
            county: vec![
                ColumnMatcher::exact("countyname"),
                ColumnMatcher::contains(&["county"]),
            ],
        }
    }

    /// Selects columns for a workbook header.
    ///
    /// # Errors
    ///
    /// Returns the [`ColumnRole`] that no strategy could resolve. When every
    /// strategy fails, the role reported is the one the last strategy
    /// missed.
    pub fn select(&self, columns: &[String]) -> Result<SelectedColumns, ColumnRole> {
        let mut last_missing = ColumnRole::Geography;
        let mut resolved = None;

        for strategy in &self.strategies {
            match strategy.resolve(columns) {
                Ok(pair) => {
                    resolved = Some((pair, strategy.kind));
                    break;
                }
                Err(role) => last_missing = role,
            }
        }

        let ((geography, value), strategy) = resolved.ok_or(last_missing)?;

        let county = self
            .county
            .iter()
            .find_map(|matcher| matcher.find(columns))
            .ok_or(ColumnRole::County)?;

        Ok(SelectedColumns {
            geography,
            value,
            county,
            strategy,
        })
    }
}
