#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the housing affordability pipeline.
//!
//! Reads a TOML settings file, reconciles ACS medians with HUD Fair Market
//! Rent benchmarks, and writes the tidy table as CSV. Log verbosity is
//! controlled with `RUST_LOG`.

mod output;

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};
use housing_affordability::PipelineConfig;

#[derive(Parser)]
#[command(name = "housing", about = "Housing affordability reconciliation")]
struct Cli {
    /// Path to the TOML settings file
    #[arg(long, global = true, default_value = "housing.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile all configured years and write CSV (the default)
    Run {
        /// Write CSV to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
        /// Fail if any benchmark year was skipped
        #[arg(long)]
        strict: bool,
    },
    /// List the configured geographies
    Geographies,
    /// List the configured years and their benchmark files
    Years,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let config = PipelineConfig::from_path(&cli.config)?;
    log::debug!("Loaded settings from {}", cli.config.display());

    match cli.command.unwrap_or(Commands::Run {
        output: None,
        strict: false,
    }) {
        Commands::Run { output, strict } => {
            let start = Instant::now();
            let result = housing_affordability::run(&config)?;

            if strict && !result.skipped_benchmarks.is_empty() {
                for skip in &result.skipped_benchmarks {
                    log::error!("{skip}");
                }
                let years: Vec<String> = result
                    .skipped_benchmarks
                    .iter()
                    .map(|skip| skip.year().to_string())
                    .collect();
                return Err(format!(
                    "Benchmark years skipped in strict mode: {}",
                    years.join(", ")
                )
                .into());
            }

            if let Some(path) = output {
                let file = File::create(&path)?;
                output::write_records(BufWriter::new(file), &result.records)?;
                log::info!(
                    "Wrote {} records to {}",
                    result.records.len(),
                    path.display()
                );
            } else {
                output::write_records(std::io::stdout().lock(), &result.records)?;
            }

            log::info!("Done in {:.1}s", start.elapsed().as_secs_f64());
        }
        Commands::Geographies => {
            println!("{:<24} LABEL", "KEY");
            println!("{}", "-".repeat(60));
            for (key, label) in &config.geographies {
                println!("{key:<24} {label}");
            }
            println!();
            println!("Match mode: {:?}", config.geography_match);
        }
        Commands::Years => {
            println!("{:<6} BENCHMARK FILE", "YEAR");
            println!("{}", "-".repeat(60));
            for year in &config.years {
                match config.benchmark_files.get(year) {
                    Some(path) if path.exists() => println!("{year:<6} {}", path.display()),
                    Some(path) => println!("{year:<6} {} (missing)", path.display()),
                    None => println!("{year:<6} -"),
                }
            }
        }
    }

    Ok(())
}
