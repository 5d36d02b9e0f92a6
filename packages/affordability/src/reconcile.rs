//! Joins ACS metrics and HUD benchmarks into tidy affordability records.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

use housing_affordability_models::{AffordabilityRecord, BenchmarkRecord, MetricId, MetricRecord};
use housing_geography_models::{AllowList, GeographyMatch};
use housing_hud::{BenchmarkSkip, ColumnPolicy};

use crate::ReconcileError;
use crate::config::{ConfigError, PipelineConfig};

/// Result of a full pipeline run.
#[derive(Debug, Default)]
pub struct RunOutput {
    /// Reconciled records in output order.
    pub records: Vec<AffordabilityRecord>,
    /// Benchmark years that contributed nothing.
    pub skipped_benchmarks: Vec<BenchmarkSkip>,
}

/// Loads the three ACS metrics for every year, inner-joins them, and keeps
/// the allow-listed geographies.
///
/// Output follows `years` order, then the income table's column order
/// within each year. A year listed more than once is reconciled once. `hud_fmr_2br` is left empty; see [`join_benchmarks`].
///
/// # Errors
///
/// Returns [`ReconcileError::Acs`] if any metric table for any year cannot
/// be located or extracted, and [`ReconcileError::Config`] if `years` is
/// empty.
pub fn reconcile(
    config: &PipelineConfig,
    years: &[u16],
    allow_list: &AllowList,
) -> Result<Vec<AffordabilityRecord>, ReconcileError> {
    if years.is_empty() {
        return Err(ConfigError::Invalid("no years requested".to_string()).into());
    }

    let mut records = Vec::new();
    let mut processed = BTreeSet::new();

    for &year in years {
        if !processed.insert(year) {
            log::warn!("{year} requested more than once, reconciling it once");
            continue;
        }

        let income = housing_acs::load_metric(&config.data_root, year, MetricId::Income)?;
        let home_value = housing_acs::load_metric(&config.data_root, year, MetricId::HomeValue)?;
        let rent = housing_acs::load_metric(&config.data_root, year, MetricId::Rent)?;

        let joined = join_metrics(year, &income, &home_value, &rent);
        let joined_count = joined.len();
        let start = records.len();
        records.extend(
            joined
                .into_iter()
                .filter(|record| allow_list.contains(&record.geography)),
        );
        log::debug!(
            "{year}: {joined_count} geographies joined, {} kept after allow-list",
            records.len() - start
        );
    }

    let mode = allow_list.mode();
    let seen: BTreeSet<String> = records
        .iter()
        .map(|r| mode.match_key(r.geography.as_str()))
        .collect();
    let missing: Vec<&String> = allow_list
        .labels()
        .values()
        .filter(|label| !seen.contains(&mode.match_key(label)))
        .collect();
    if !missing.is_empty() {
        log::warn!("Configured geographies with no ACS data in any year: {missing:?}");
    }

    Ok(records)
}

/// Inner-joins the three metric tables of one year on geography.
///
/// A geography absent from any of the three tables is dropped. Records
/// whose `year` differs from `year` are ignored. Output follows the income
/// table's order; ratios are derived on construction.
#[must_use]
pub fn join_metrics(
    year: u16,
    income: &[MetricRecord],
    home_value: &[MetricRecord],
    rent: &[MetricRecord],
) -> Vec<AffordabilityRecord> {
    let home_by_geo = index_values(year, home_value);
    let rent_by_geo = index_values(year, rent);

    let mut dropped = 0_usize;
    let joined: Vec<AffordabilityRecord> = income
        .iter()
        .filter(|record| record.year == year)
        .filter_map(|record| {
            let geography = record.geography.as_str();
            let (Some(home), Some(rent)) = (home_by_geo.get(geography), rent_by_geo.get(geography))
            else {
                log::debug!("{year}: '{geography}' missing from a metric table, dropping");
                dropped += 1;
                return None;
            };
            Some(AffordabilityRecord::new(
                year,
                record.geography.clone(),
                record.value,
                *home,
                *rent,
            ))
        })
        .collect();

    if dropped > 0 {
        log::info!("{year}: dropped {dropped} geographies not present in all three tables");
    }

    joined
}

fn index_values(year: u16, records: &[MetricRecord]) -> BTreeMap<&str, Option<f64>> {
    let mut by_geo = BTreeMap::new();
    for record in records.iter().filter(|r| r.year == year) {
        match by_geo.entry(record.geography.as_str()) {
            Entry::Vacant(entry) => {
                entry.insert(record.value);
            }
            Entry::Occupied(_) => {
                log::warn!(
                    "{year}: duplicate {} estimate for '{}', keeping the first",
                    record.metric,
                    record.geography
                );
            }
        }
    }
    by_geo
}

/// Left-joins benchmark values onto records by (year, geography).
///
/// Records without a matching benchmark keep `hud_fmr_2br = None`. When
/// several benchmarks map to the same (year, geography), the first one wins
/// and a warning is logged, so no record is duplicated.
#[must_use]
pub fn join_benchmarks(
    records: Vec<AffordabilityRecord>,
    benchmarks: &[BenchmarkRecord],
    mode: GeographyMatch,
) -> Vec<AffordabilityRecord> {
    let mut by_key: BTreeMap<(u16, String), f64> = BTreeMap::new();
    for benchmark in benchmarks {
        let key = (benchmark.year, mode.match_key(benchmark.geography.as_str()));
        match by_key.entry(key) {
            Entry::Vacant(entry) => {
                entry.insert(benchmark.benchmark_value);
            }
            Entry::Occupied(entry) => {
                if (entry.get() - benchmark.benchmark_value).abs() > f64::EPSILON {
                    log::warn!(
                        "{}: conflicting benchmark values for '{}' ({} vs {}), keeping the first",
                        benchmark.year,
                        benchmark.geography,
                        entry.get(),
                        benchmark.benchmark_value
                    );
                }
            }
        }
    }

    records
        .into_iter()
        .map(|mut record| {
            let key = (record.year, mode.match_key(record.geography.as_str()));
            record.hud_fmr_2br = by_key.get(&key).copied();
            record
        })
        .collect()
}

/// Runs the whole pipeline for `config`: ACS reconciliation over the
/// configured years, then the benchmark join when benchmark files are
/// configured.
///
/// # Errors
///
/// Returns [`ReconcileError`] if ACS reconciliation fails. Benchmark
/// problems never fail the run; they are returned in
/// [`RunOutput::skipped_benchmarks`].
pub fn run(config: &PipelineConfig) -> Result<RunOutput, ReconcileError> {
    let allow_list = config.allow_list();
    let records = reconcile(config, &config.years, &allow_list)?;
    log::info!(
        "Reconciled {} records across {} years",
        records.len(),
        config.years.len()
    );

    if config.benchmark_files.is_empty() {
        log::info!("No benchmark files configured, skipping benchmark join");
        return Ok(RunOutput {
            records,
            skipped_benchmarks: Vec::new(),
        });
    }

    let report = housing_hud::load_benchmarks(
        &config.benchmark_files,
        &config.years,
        &ColumnPolicy::default(),
        &config.expansions,
    );
    log::info!(
        "Loaded {} benchmark records, skipped {} years",
        report.records.len(),
        report.skipped.len()
    );

    let records = join_benchmarks(records, &report.records, config.geography_match);
    let matched = records.iter().filter(|r| r.hud_fmr_2br.is_some()).count();
    log::info!("{matched} of {} records have a benchmark", records.len());

    Ok(RunOutput {
        records,
        skipped_benchmarks: report.skipped,
    })
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use housing_acs::AcsError;

    use super::*;

    fn metric(year: u16, geo: &str, metric: MetricId, value: f64) -> MetricRecord {
        MetricRecord {
            year,
            geography: geo.into(),
            metric,
            value: Some(value),
        }
    }

    const HENNEPIN: &str = "Hennepin County, Minnesota";
    const OTTER_TAIL: &str = "Otter Tail County, Minnesota";
    const MINNEAPOLIS: &str = "Minneapolis city, Minnesota";

    #[test]
    fn inner_join_drops_geography_missing_from_rent() {
        let income = vec![
            metric(2020, HENNEPIN, MetricId::Income, 50_000.0),
            metric(2020, OTTER_TAIL, MetricId::Income, 40_000.0),
        ];
        let home = vec![
            metric(2020, OTTER_TAIL, MetricId::HomeValue, 150_000.0),
            metric(2020, HENNEPIN, MetricId::HomeValue, 200_000.0),
        ];
        let rent = vec![metric(2020, HENNEPIN, MetricId::Rent, 1_000.0)];

        let joined = join_metrics(2020, &income, &home, &rent);
        assert_eq!(joined.len(), 1);
        assert_eq!(joined[0].geography.as_str(), HENNEPIN);
        assert!((joined[0].price_to_income.unwrap() - 4.0).abs() < f64::EPSILON);
        assert!((joined[0].rent_to_income.unwrap() - 0.24).abs() < 1e-12);
    }

    #[test]
    fn join_keeps_income_order_and_absent_values() {
        let income = vec![
            metric(2021, OTTER_TAIL, MetricId::Income, 40_000.0),
            MetricRecord {
                year: 2021,
                geography: HENNEPIN.into(),
                metric: MetricId::Income,
                value: None,
            },
        ];
        let home = vec![
            metric(2021, HENNEPIN, MetricId::HomeValue, 300_000.0),
            metric(2021, OTTER_TAIL, MetricId::HomeValue, 160_000.0),
        ];
        let rent = vec![
            metric(2021, HENNEPIN, MetricId::Rent, 1_200.0),
            metric(2021, OTTER_TAIL, MetricId::Rent, 800.0),
        ];

        let joined = join_metrics(2021, &income, &home, &rent);
        let geos: Vec<&str> = joined.iter().map(|r| r.geography.as_str()).collect();
        assert_eq!(geos, vec![OTTER_TAIL, HENNEPIN]);
        assert_eq!(joined[1].median_household_income, None);
        assert_eq!(joined[1].price_to_income, None);
        assert_eq!(joined[1].rent_to_income, None);
    }

    fn record(year: u16, geo: &str) -> AffordabilityRecord {
        AffordabilityRecord::new(year, geo.into(), Some(1.0), Some(1.0), Some(1.0))
    }

    #[test]
    fn benchmark_left_join() {
        let records = vec![
            record(2020, HENNEPIN),
            record(2020, OTTER_TAIL),
            record(2021, HENNEPIN),
        ];
        let benchmarks = vec![
            BenchmarkRecord {
                year: 2020,
                geography: HENNEPIN.into(),
                benchmark_value: 1_262.0,
            },
            BenchmarkRecord {
                year: 2022,
                geography: HENNEPIN.into(),
                benchmark_value: 1_400.0,
            },
        ];

        let joined = join_benchmarks(records, &benchmarks, GeographyMatch::Exact);
        assert_eq!(joined.len(), 3);
        assert_eq!(joined[0].hud_fmr_2br, Some(1_262.0));
        assert_eq!(joined[1].hud_fmr_2br, None);
        assert_eq!(joined[2].hud_fmr_2br, None);
    }

    #[test]
    fn duplicate_benchmarks_do_not_duplicate_records() {
        let benchmarks = vec![
            BenchmarkRecord {
                year: 2020,
                geography: HENNEPIN.into(),
                benchmark_value: 1_262.0,
            },
            BenchmarkRecord {
                year: 2020,
                geography: HENNEPIN.into(),
                benchmark_value: 1_300.0,
            },
        ];
        let joined = join_benchmarks(vec![record(2020, HENNEPIN)], &benchmarks, GeographyMatch::Exact);
        assert_eq!(joined.len(), 1);
        assert_eq!(joined[0].hud_fmr_2br, Some(1_262.0));
    }

    #[test]
    fn normalized_benchmark_join() {
        let benchmarks = vec![BenchmarkRecord {
            year: 2020,
            geography: "Hennepin County, MN".into(),
            benchmark_value: 1_262.0,
        }];
        let exact = join_benchmarks(vec![record(2020, HENNEPIN)], &benchmarks, GeographyMatch::Exact);
        assert_eq!(exact[0].hud_fmr_2br, None);

        let normalized = join_benchmarks(
            vec![record(2020, HENNEPIN)],
            &benchmarks,
            GeographyMatch::Normalized,
        );
        assert_eq!(normalized[0].hud_fmr_2br, Some(1_262.0));
    }

    fn write_acs(root: &Path, year: u16, table_id: &str, label: &str, values: &[(&str, &str)]) {
        let dir = root.join(year.to_string());
        std::fs::create_dir_all(&dir).unwrap();
        let mut header = vec!["Label (Grouping)".to_string()];
        let mut row = vec![format!("\"{label}\"")];
        for (geo, value) in values {
            header.push(format!("\"{geo}!!Estimate\""));
            header.push(format!("\"{geo}!!Margin of Error\""));
            row.push(format!("\"{value}\""));
            row.push("\"±1\"".to_string());
        }
        let text = format!("{}\n{}\n", header.join(","), row.join(","));
        std::fs::write(dir.join(format!("ACSDT5Y{year}.{table_id}-Data.csv")), text).unwrap();
    }

    fn write_year(root: &Path, year: u16, rent_geos: &[(&str, &str)]) {
        write_acs(
            root,
            year,
            "B19013",
            "Median household income in the past 12 months",
            &[(HENNEPIN, "50,000"), (OTTER_TAIL, "40,000"), (MINNEAPOLIS, "45,000")],
        );
        write_acs(
            root,
            year,
            "B25077",
            "Median value (dollars)",
            &[(HENNEPIN, "200,000"), (OTTER_TAIL, "150,000"), (MINNEAPOLIS, "180,000")],
        );
        write_acs(root, year, "B25064", "Median gross rent", rent_geos);
    }

    fn config_for(root: &Path, years: &[u16], geos: &[&str]) -> PipelineConfig {
        let geographies = geos
            .iter()
            .map(|g| ((*g).to_string(), (*g).to_string()))
            .collect();
        PipelineConfig {
            data_root: root.to_path_buf(),
            years: years.to_vec(),
            geography_match: GeographyMatch::Exact,
            geographies,
            benchmark_files: BTreeMap::new(),
            expansions: housing_hud::ExpansionTable::embedded(),
        }
    }

    #[test]
    fn reconcile_filters_to_allow_list_in_year_order() {
        let dir = tempfile::tempdir().unwrap();
        let rent = [(HENNEPIN, "1,000"), (OTTER_TAIL, "800"), (MINNEAPOLIS, "1,100")];
        write_year(dir.path(), 2019, &rent);
        write_year(dir.path(), 2020, &rent);

        let config = config_for(dir.path(), &[2020, 2019], &[HENNEPIN, OTTER_TAIL]);
        let records = reconcile(&config, &config.years, &config.allow_list()).unwrap();

        let keys: Vec<(u16, &str)> = records
            .iter()
            .map(|r| (r.year, r.geography.as_str()))
            .collect();
        assert_eq!(
            keys,
            vec![
                (2020, HENNEPIN),
                (2020, OTTER_TAIL),
                (2019, HENNEPIN),
                (2019, OTTER_TAIL),
            ]
        );
        assert!(records.iter().all(|r| r.geography.as_str() != MINNEAPOLIS));
        assert_eq!(records[0].median_household_income, Some(50_000.0));
    }

    #[test]
    fn repeated_year_is_reconciled_once() {
        let dir = tempfile::tempdir().unwrap();
        let rent = [(HENNEPIN, "1,000"), (OTTER_TAIL, "800"), (MINNEAPOLIS, "1,100")];
        write_year(dir.path(), 2020, &rent);

        let config = config_for(dir.path(), &[2020], &[HENNEPIN]);
        let records = reconcile(&config, &[2020, 2020], &config.allow_list()).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].year, 2020);
        assert_eq!(records[0].geography.as_str(), HENNEPIN);
    }

    #[test]
    fn missing_metric_table_propagates() {
        let dir = tempfile::tempdir().unwrap();
        write_acs(
            dir.path(),
            2018,
            "B19013",
            "Median household income",
            &[(HENNEPIN, "50,000")],
        );

        let config = config_for(dir.path(), &[2018], &[HENNEPIN]);
        let err = reconcile(&config, &config.years, &config.allow_list()).unwrap_err();
        assert!(matches!(err, ReconcileError::Acs(AcsError::NotFound { .. })));
    }

    #[test]
    fn empty_year_list_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path(), &[2018], &[HENNEPIN]);
        let err = reconcile(&config, &[], &config.allow_list()).unwrap_err();
        assert!(matches!(err, ReconcileError::Config(_)));
    }

    #[test]
    fn run_joins_benchmarks_and_reports_skips() {
        let dir = tempfile::tempdir().unwrap();
        let rent = [(HENNEPIN, "1,000"), (OTTER_TAIL, "800"), (MINNEAPOLIS, "1,100")];
        write_year(dir.path(), 2020, &rent);
        write_year(dir.path(), 2021, &rent);

        let fmr = dir.path().join("2020").join("fmr_2020.csv");
        std::fs::write(
            &fmr,
            "areaname,countyname,fmr_2\n\
             \"Minneapolis-St. Paul-Bloomington, MN-WI HUD Metro FMR Area\",Hennepin County,1262\n\
             \"Otter Tail County, MN\",Otter Tail County,812\n",
        )
        .unwrap();

        let mut config = config_for(
            dir.path(),
            &[2020, 2021],
            &[HENNEPIN, OTTER_TAIL, MINNEAPOLIS],
        );
        config.benchmark_files.insert(2020, fmr);

        let output = run(&config).unwrap();
        assert_eq!(output.records.len(), 6);

        let fmr_2020: Vec<(&str, Option<f64>)> = output
            .records
            .iter()
            .filter(|r| r.year == 2020)
            .map(|r| (r.geography.as_str(), r.hud_fmr_2br))
            .collect();
        assert_eq!(
            fmr_2020,
            vec![
                (HENNEPIN, Some(1_262.0)),
                (OTTER_TAIL, Some(812.0)),
                (MINNEAPOLIS, Some(1_262.0)),
            ]
        );
        assert!(
            output
                .records
                .iter()
                .filter(|r| r.year == 2021)
                .all(|r| r.hud_fmr_2br.is_none())
        );

        assert_eq!(output.skipped_benchmarks.len(), 1);
        assert_eq!(output.skipped_benchmarks[0].year(), 2021);
    }
}
