//! Per-year benchmark extraction.
//!
//! Every failure here is local to one fiscal year: it is logged, reported
//! as a [`BenchmarkSkip`], and the year contributes no records. Nothing in
//! this module aborts a multi-year load.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use housing_affordability_models::BenchmarkRecord;
use housing_table::RawTable;

use crate::BenchmarkSkip;
use crate::columns::{ColumnPolicy, StrategyKind};
use crate::expansion::ExpansionTable;

/// Records and skipped years from a multi-year load.
#[derive(Debug, Default)]
pub struct BenchmarkReport {
    /// Benchmark records for every year that loaded, in year order.
    pub records: Vec<BenchmarkRecord>,
    /// Years that contributed nothing and why.
    pub skipped: Vec<BenchmarkSkip>,
}

impl BenchmarkReport {
    /// Years that were skipped, in load order.
    #[must_use]
    pub fn skipped_years(&self) -> Vec<u16> {
        self.skipped.iter().map(BenchmarkSkip::year).collect()
    }
}

/// Extracts one year's benchmark records, logging and returning nothing on
/// any failure.
#[must_use]
pub fn extract(path: &Path, year: u16, expansions: &ExpansionTable) -> Vec<BenchmarkRecord> {
    try_extract(path, year, &ColumnPolicy::default(), expansions).unwrap_or_else(|skip| {
        log::warn!("{skip}");
        Vec::new()
    })
}

/// Extracts one year's benchmark records.
///
/// # Errors
///
/// Returns [`BenchmarkSkip::UnreadableWorkbook`] if the file cannot be
/// loaded, or [`BenchmarkSkip::NoPlausibleColumn`] if the column policy
/// finds no candidate for a required field.
pub fn try_extract(
    path: &Path,
    year: u16,
    policy: &ColumnPolicy,
    expansions: &ExpansionTable,
) -> Result<Vec<BenchmarkRecord>, BenchmarkSkip> {
    let table = housing_table::load(path).map_err(|source| BenchmarkSkip::UnreadableWorkbook {
        year,
        path: path.to_path_buf(),
        source,
    })?;
    extract_table(&table, path, year, policy, expansions)
}

/// Extracts records from an already-loaded table. `origin` is used only in
/// errors and log messages.
///
/// # Errors
///
/// Returns [`BenchmarkSkip::NoPlausibleColumn`] if the column policy finds
/// no candidate for a required field.
pub fn extract_table(
    table: &RawTable,
    origin: &Path,
    year: u16,
    policy: &ColumnPolicy,
    expansions: &ExpansionTable,
) -> Result<Vec<BenchmarkRecord>, BenchmarkSkip> {
    let selected = policy
        .select(table.columns())
        .map_err(|role| BenchmarkSkip::NoPlausibleColumn {
            year,
            path: origin.to_path_buf(),
            role,
            columns: table.columns().to_vec(),
        })?;

    let columns = table.columns();
    if selected.strategy == StrategyKind::Exact {
        log::debug!(
            "{}: using '{}' / '{}' (county '{}')",
            origin.display(),
            columns[selected.geography],
            columns[selected.value],
            columns[selected.county]
        );
    } else {
        log::info!(
            "{}: no exact columns, {} match chose '{}' / '{}' (county '{}')",
            origin.display(),
            selected.strategy,
            columns[selected.geography],
            columns[selected.value],
            columns[selected.county]
        );
    }

    let mut records = Vec::new();
    for row in 0..table.len() {
        let county_name = table.cell(row, selected.county).to_string();
        let geographies = expansions.expand(&county_name);
        if geographies.is_empty() {
            continue;
        }

        let Some(benchmark_value) = table.cell(row, selected.value).as_f64() else {
            log::debug!(
                "{}: row {row} ({county_name}) has no numeric benchmark value, skipping",
                origin.display()
            );
            continue;
        };

        log::trace!(
            "{year} '{}' ({county_name}) -> {} geographies",
            table.cell(row, selected.geography),
            geographies.len()
        );

        records.extend(geographies.into_iter().map(|geography| BenchmarkRecord {
            year,
            geography,
            benchmark_value,
        }));
    }

    log::info!(
        "{}: {} benchmark records for {year}",
        origin.display(),
        records.len()
    );

    Ok(records)
}

/// Loads benchmark records for `years` from explicitly mapped files.
///
/// Years with no configured file, a missing file, an unreadable workbook,
/// or no plausible columns are skipped and reported; the remaining years
/// still load. A year listed more than once loads once.
#[must_use]
pub fn load_benchmarks(
    files: &BTreeMap<u16, PathBuf>,
    years: &[u16],
    policy: &ColumnPolicy,
    expansions: &ExpansionTable,
) -> BenchmarkReport {
    let mut report = BenchmarkReport::default();
    let mut seen = BTreeSet::new();

    for &year in years {
        if !seen.insert(year) {
            log::warn!("Benchmark year {year} requested more than once, loading it once");
            continue;
        }

        let result = match files.get(&year) {
            None => Err(BenchmarkSkip::MissingConfig { year }),
            Some(path) if !path.exists() => Err(BenchmarkSkip::MissingFile {
                year,
                path: path.clone(),
            }),
            Some(path) => try_extract(path, year, policy, expansions),
        };

        match result {
            Ok(records) => report.records.extend(records),
            Err(skip) => {
                log::warn!("{skip}");
                report.skipped.push(skip);
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use housing_geography_models::GeographyKey;
    use housing_table::Cell;

    use super::*;
    use crate::columns::ColumnRole;

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    fn fmr_table() -> RawTable {
        RawTable::new(
            vec![
                "fips2010".to_string(),
                "areaname".to_string(),
                "countyname".to_string(),
                "fmr_2".to_string(),
            ],
            vec![
                vec![
                    text("2711199999"),
                    text("Otter Tail County, MN"),
                    text("Otter Tail County"),
                    Cell::Number(812.0),
                ],
                vec![
                    text("2712399999"),
                    text("Minneapolis-St. Paul-Bloomington, MN-WI HUD Metro FMR Area"),
                    text("Ramsey County"),
                    Cell::Number(1_262.0),
                ],
                vec![
                    text("2705399999"),
                    text("Minneapolis-St. Paul-Bloomington, MN-WI HUD Metro FMR Area"),
                    text("Hennepin County"),
                    Cell::Number(1_262.0),
                ],
            ],
        )
    }

    #[test]
    fn expands_mapped_counties() {
        let records = extract_table(
            &fmr_table(),
            Path::new("FY20_4050_FMRs_rev.xlsx"),
            2020,
            &ColumnPolicy::default(),
            &ExpansionTable::embedded(),
        )
        .unwrap();

        assert_eq!(records.len(), 4);
        let otter: Vec<&BenchmarkRecord> = records
            .iter()
            .filter(|r| (r.benchmark_value - 812.0).abs() < f64::EPSILON)
            .collect();
        assert_eq!(otter.len(), 2);
        assert_eq!(
            otter[0].geography,
            GeographyKey::from("Otter Tail County, Minnesota")
        );
        assert_eq!(
            otter[1].geography,
            GeographyKey::from("Fergus Falls city, Minnesota")
        );
        assert!(records.iter().all(|r| r.year == 2020));
    }

    #[test]
    fn unmapped_rows_are_dropped() {
        let records = extract_table(
            &fmr_table(),
            Path::new("fmr.xlsx"),
            2020,
            &ColumnPolicy::default(),
            &ExpansionTable::embedded(),
        )
        .unwrap();
        assert!(
            records
                .iter()
                .all(|r| !r.geography.as_str().contains("Ramsey"))
        );
    }

    #[test]
    fn text_number_is_accepted_and_blank_is_skipped() {
        let table = RawTable::new(
            vec!["Areaname".to_string(), "countyname".to_string(), "FMR2".to_string()],
            vec![
                vec![text("Otter Tail County, MN"), text("Otter Tail County"), text("795")],
                vec![text("Hennepin County, MN"), text("Hennepin County"), Cell::Empty],
            ],
        );
        let records = extract_table(
            &table,
            Path::new("FY2014_4050_RevFinal.xls"),
            2014,
            &ColumnPolicy::default(),
            &ExpansionTable::embedded(),
        )
        .unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| (r.benchmark_value - 795.0).abs() < f64::EPSILON));
    }

    #[test]
    fn no_plausible_column_skips_year() {
        let table = RawTable::new(
            vec!["countyname".to_string(), "areaname".to_string(), "rent".to_string()],
            vec![vec![text("Hennepin County"), text("x"), Cell::Number(1.0)]],
        );
        let err = extract_table(
            &table,
            Path::new("fmr.xlsx"),
            2016,
            &ColumnPolicy::default(),
            &ExpansionTable::embedded(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            BenchmarkSkip::NoPlausibleColumn {
                year: 2016,
                role: ColumnRole::BenchmarkValue,
                ..
            }
        ));
    }

    fn write_fmr_workbook(path: &Path, county: &str, value: f64) {
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "areaname").unwrap();
        sheet.write_string(0, 1, "countyname").unwrap();
        sheet.write_string(0, 2, "fmr_2").unwrap();
        sheet.write_string(1, 0, "Hennepin County, MN").unwrap();
        sheet.write_string(1, 1, county).unwrap();
        sheet.write_number(1, 2, value).unwrap();
        workbook.save(path).unwrap();
    }

    #[test]
    fn unreadable_year_does_not_affect_other_years() {
        let dir = tempfile::tempdir().unwrap();
        let good_2021 = dir.path().join("FY21_4050_FMRs_rev.xlsx");
        let bad_2022 = dir.path().join("FY22_FMRs_revised.xlsx");
        let good_2023 = dir.path().join("FY23_FMRs_revised.xlsx");
        write_fmr_workbook(&good_2021, "Hennepin County", 1_300.0);
        std::fs::write(&bad_2022, b"\x00\x01 not a workbook").unwrap();
        write_fmr_workbook(&good_2023, "Hennepin County", 1_500.0);

        let files = BTreeMap::from([
            (2021, good_2021),
            (2022, bad_2022),
            (2023, good_2023),
        ]);
        let report = load_benchmarks(
            &files,
            &[2021, 2022, 2023],
            &ColumnPolicy::default(),
            &ExpansionTable::embedded(),
        );

        assert_eq!(report.skipped_years(), vec![2022]);
        assert!(matches!(
            report.skipped[0],
            BenchmarkSkip::UnreadableWorkbook { year: 2022, .. }
        ));
        let years: Vec<u16> = report.records.iter().map(|r| r.year).collect();
        assert_eq!(years, vec![2021, 2021, 2023, 2023]);
    }

    #[test]
    fn repeated_year_loads_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("FY20_4050_FMRs_rev.xlsx");
        write_fmr_workbook(&path, "Hennepin County", 1_262.0);

        let files = BTreeMap::from([(2020, path)]);
        let report = load_benchmarks(
            &files,
            &[2020, 2020],
            &ColumnPolicy::default(),
            &ExpansionTable::embedded(),
        );

        assert_eq!(report.records.len(), 2);
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn missing_config_and_missing_file_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let files = BTreeMap::from([(2019, dir.path().join("FY2019_4050_FMRs_rev2.xlsx"))]);
        let report = load_benchmarks(
            &files,
            &[2018, 2019],
            &ColumnPolicy::default(),
            &ExpansionTable::embedded(),
        );

        assert!(report.records.is_empty());
        assert!(matches!(
            report.skipped[0],
            BenchmarkSkip::MissingConfig { year: 2018 }
        ));
        assert!(matches!(
            report.skipped[1],
            BenchmarkSkip::MissingFile { year: 2019, .. }
        ));
    }

    #[test]
    fn extract_returns_empty_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.xlsx");
        std::fs::write(&path, b"garbage").unwrap();
        assert!(extract(&path, 2023, &ExpansionTable::embedded()).is_empty());
    }
}
