//! Source file discovery for ACS exports.
//!
//! Exports live under `<data_root>/<year>/` and are named
//! `ACSDT5Y<year>.<table_id>-<suffix>.csv` by data.census.gov. The suffix
//! varies between downloads, so matching is by prefix.

use std::path::{Path, PathBuf};

use crate::AcsError;

/// Returns the filename prefix of a five-year detailed-table export.
#[must_use]
pub fn file_prefix(year: u16, table_id: &str) -> String {
    format!("ACSDT5Y{year}.{table_id}")
}

/// Finds the CSV export for `table_id` in the directory for `year`.
///
/// When several files match, a warning is logged and the first by file name
/// is used. Callers that need a specific file must keep only one candidate
/// in the directory.
///
/// # Errors
///
/// Returns [`AcsError::NotFound`] if the year directory is missing or holds
/// no matching file.
pub fn locate(data_root: &Path, year: u16, table_id: &str) -> Result<PathBuf, AcsError> {
    let year_dir = data_root.join(year.to_string());
    if !year_dir.is_dir() {
        return Err(AcsError::NotFound {
            path: year_dir,
            message: format!("expected year directory for {year}"),
        });
    }

    let prefix = file_prefix(year, table_id);
    let entries = std::fs::read_dir(&year_dir).map_err(|e| AcsError::NotFound {
        path: year_dir.clone(),
        message: format!("cannot list year directory: {e}"),
    })?;

    let mut matches: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|name| is_match(name, &prefix))
        })
        .collect();

    if matches.is_empty() {
        return Err(AcsError::NotFound {
            path: year_dir,
            message: format!("no ACS CSV for year {year} and table {table_id}"),
        });
    }

    matches.sort();
    let chosen = matches.remove(0);

    if !matches.is_empty() {
        log::warn!(
            "Multiple files for {year} {table_id} ({} candidates), using {}",
            matches.len() + 1,
            chosen.display()
        );
    }

    Ok(chosen)
}

/// Whether `file_name` matches `<prefix>*.csv`.
fn is_match(file_name: &str, prefix: &str) -> bool {
    file_name.starts_with(prefix)
        && Path::new(file_name)
            .extension()
            .is_some_and(|ext| ext == "csv")
}
