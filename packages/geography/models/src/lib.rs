#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Canonical geography keys shared by the ACS and HUD pipelines.
//!
//! Both pipelines emit a [`GeographyKey`] and the reconciler joins on it.
//! Joining is exact string equality by default. [`GeographyMatch::Normalized`]
//! opts into [`normalize_geography`] so that "Hennepin County, MN" and
//! "Hennepin County, Minnesota" compare equal.

pub mod states;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Punctuation that carries no meaning in a geography label.
static PUNCTUATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.,;:'\x{2019}\-]+").expect("valid regex"));

/// Human-readable geography label used as the join key between pipelines
/// (e.g. `"Otter Tail County, Minnesota"`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GeographyKey(String);

impl GeographyKey {
    /// Creates a key from any string-like value, verbatim.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the key text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GeographyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for GeographyKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for GeographyKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for GeographyKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// How two geography labels are compared when joining or filtering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeographyMatch {
    /// Byte-for-byte string equality.
    #[default]
    Exact,
    /// Equality after [`normalize_geography`].
    Normalized,
}

impl GeographyMatch {
    /// Returns the comparison form of `name` under this mode.
    #[must_use]
    pub fn match_key(self, name: &str) -> String {
        match self {
            Self::Exact => name.to_string(),
            Self::Normalized => normalize_geography(name),
        }
    }
}

/// Normalizes a geography label for loose comparison.
///
/// The pipeline:
/// 1. Expand a trailing two-letter state abbreviation after the last comma
///    ("Hennepin County, MN" → "Hennepin County, Minnesota")
/// 2. Lowercase
/// 3. Strip punctuation
/// 4. Collapse whitespace
#[must_use]
pub fn normalize_geography(input: &str) -> String {
    let expanded = match input.rsplit_once(',') {
        Some((head, tail)) => match states::state_name(tail.trim()) {
            Some(full) => format!("{head}, {full}"),
            None => input.to_string(),
        },
        None => input.to_string(),
    };

    let lower = expanded.to_lowercase();
    let no_punct = PUNCTUATION_RE.replace_all(&lower, " ");
    no_punct.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// The set of geographies kept in the final output.
///
/// Built from the configured mapping of short key → ACS geography label.
#[derive(Debug, Clone)]
pub struct AllowList {
    mode: GeographyMatch,
    labels: BTreeMap<String, String>,
    match_keys: BTreeSet<String>,
}

impl AllowList {
    /// Builds an allow-list from `short_key → label` pairs.
    #[must_use]
    pub fn new(labels: BTreeMap<String, String>, mode: GeographyMatch) -> Self {
        let match_keys = labels.values().map(|label| mode.match_key(label)).collect();
        Self {
            mode,
            labels,
            match_keys,
        }
    }

    /// Builds an allow-list from bare labels, keyed by themselves.
    #[must_use]
    pub fn from_labels<I, S>(labels: I, mode: GeographyMatch) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels = labels
            .into_iter()
            .map(|label| {
                let label = label.into();
                (label.clone(), label)
            })
            .collect();
        Self::new(labels, mode)
    }

    /// Whether `geography` is allowed under this list's match mode.
    #[must_use]
    pub fn contains(&self, geography: &GeographyKey) -> bool {
        self.match_keys
            .contains(&self.mode.match_key(geography.as_str()))
    }

    /// Returns the comparison mode.
    #[must_use]
    pub const fn mode(&self) -> GeographyMatch {
        self.mode
    }

    /// Returns the configured `short_key → label` pairs.
    #[must_use]
    pub const fn labels(&self) -> &BTreeMap<String, String> {
        &self.labels
    }

    /// Number of allowed geographies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether no geography is allowed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
