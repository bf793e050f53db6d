//! covid-tracker CLI - reshape the raw time-series CSVs into a JSON snapshot
//!
//! ```bash
//! covid-tracker                                  # ./Data/raw → ./Data/formated/data_v1.json
//! covid-tracker --data-dir raw --output out.json # same pipeline, other locations
//! covid-tracker --period 10 --pretty             # 10-day doubling period, indented JSON
//! ```
//!
//! A failed write is reported but does not change the exit status; a
//! missing or unreadable source does.

use clap::Parser;
use covid_tracker::{run, PipelineOptions};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "covid-tracker")]
#[command(about = "Reshape infection, death and recovery CSVs into per-country statistics", long_about = None)]
struct Cli {
    /// Directory holding Cases_raw.csv, Death_raw.csv and Recovered_raw.csv
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Snapshot output file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Days spanned by the doubling lookback
    #[arg(long)]
    period: Option<u32>,

    /// Indent the JSON output
    #[arg(long)]
    pretty: bool,

    /// Abort on rows without a country
    #[arg(long)]
    strict: bool,

    /// Skip schema validation of the snapshot
    #[arg(long)]
    no_validate: bool,
}

impl Cli {
    fn into_options(self) -> PipelineOptions {
        let defaults = PipelineOptions::default();
        PipelineOptions {
            data_dir: self.data_dir.unwrap_or(defaults.data_dir),
            output_path: self.output.unwrap_or(defaults.output_path),
            doubling_period: self.period.unwrap_or(defaults.doubling_period),
            pretty: self.pretty,
            strict_rows: self.strict,
            validate_output: !self.no_validate,
            ..defaults
        }
    }
}

#[tokio::main]
async fn main() {
    let options = Cli::parse().into_options();

    match run(&options).await {
        Ok(outcome) => {
            let rejected: usize = outcome.sources.iter().map(|s| s.rejected_rows).sum();
            eprintln!(
                "\n✨ {} countries, {} rows rejected{}",
                outcome.snapshot.len(),
                rejected,
                if outcome.written.is_ok() { "" } else { " (snapshot not written)" }
            );
        }
        Err(e) => {
            eprintln!("❌ Error: {}", e);
            std::process::exit(1);
        }
    }
}
