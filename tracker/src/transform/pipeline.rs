//! High-level pipeline: read → blueprint → reshape → derive → write.
//!
//! # Example
//!
//! ```rust,ignore
//! use covid_tracker::{run, PipelineOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let outcome = run(&PipelineOptions::default()).await?;
//!     println!("{} countries", outcome.snapshot.len());
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::blueprint::build_blueprint;
use super::derive::derive_all;
use super::reshape::{reshape, ReshapeReport};
use crate::error::{PipelineError, PipelineResult, SinkResult};
use crate::logs::{log_error, log_info, log_info_indent, log_success, log_warning, log_warning_indent};
use crate::models::{Metric, Snapshot};
use crate::parser::{read_source, SourceTable};
use crate::sink::write_snapshot;

/// Options for a pipeline run.
///
/// The defaults reproduce the parameterless invocation: sources under
/// `./Data/raw`, snapshot at `./Data/formated/data_v1.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineOptions {
    /// Directory holding the three source tables
    pub data_dir: PathBuf,
    pub infected_file: String,
    pub deaths_file: String,
    pub recovered_file: String,

    /// Where the snapshot is written
    pub output_path: PathBuf,

    /// Days spanned by the doubling lookback
    pub doubling_period: u32,

    /// Indented JSON instead of compact
    pub pretty: bool,

    /// Abort on the first malformed row instead of skipping it
    pub strict_rows: bool,

    /// Check the snapshot against the embedded schema before writing
    pub validate_output: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./Data/raw"),
            infected_file: "Cases_raw.csv".to_string(),
            deaths_file: "Death_raw.csv".to_string(),
            recovered_file: "Recovered_raw.csv".to_string(),
            output_path: PathBuf::from("./Data/formated/data_v1.json"),
            doubling_period: 5,
            pretty: false,
            strict_rows: false,
            validate_output: true,
        }
    }
}

impl PipelineOptions {
    /// Path of the table feeding `metric`.
    pub fn source_path(&self, metric: Metric) -> PathBuf {
        let file = match metric {
            Metric::Infected => &self.infected_file,
            Metric::Deaths => &self.deaths_file,
            Metric::Recovered => &self.recovered_file,
        };
        self.data_dir.join(file)
    }
}

/// The three parsed tables.
#[derive(Debug, Clone)]
pub struct SourceTables {
    pub infected: SourceTable,
    pub deaths: SourceTable,
    pub recovered: SourceTable,
}

impl SourceTables {
    pub fn get(&self, metric: Metric) -> &SourceTable {
        match metric {
            Metric::Infected => &self.infected,
            Metric::Deaths => &self.deaths,
            Metric::Recovered => &self.recovered,
        }
    }
}

/// Per-source facts for the run summary.
#[derive(Debug, Clone, Serialize)]
pub struct SourceSummary {
    pub metric: Metric,
    pub path: PathBuf,
    pub encoding: String,
    pub delimiter: char,
    pub row_count: usize,
    pub rejected_rows: usize,
}

/// Result of a completed run.
///
/// `written` carries the sink result: a failed write does not fail the run,
/// but it is never hidden from the caller.
#[derive(Debug)]
pub struct PipelineOutcome {
    pub snapshot: Snapshot,
    pub sources: Vec<SourceSummary>,
    pub reshape: Vec<ReshapeReport>,
    pub written: SinkResult<PathBuf>,
}

/// Read the three tables concurrently.
///
/// The first failure aborts the whole read; there is no partial result.
pub async fn read_sources(options: &PipelineOptions) -> PipelineResult<SourceTables> {
    let infected_path = options.source_path(Metric::Infected);
    let deaths_path = options.source_path(Metric::Deaths);
    let recovered_path = options.source_path(Metric::Recovered);

    let (infected, deaths, recovered) = tokio::try_join!(
        read_source(&infected_path),
        read_source(&deaths_path),
        read_source(&recovered_path)
    )
    .map_err(|e| {
        log_error(e.to_string());
        e
    })?;

    Ok(SourceTables {
        infected,
        deaths,
        recovered,
    })
}

/// Report rejected rows; under `strict` the first one is fatal.
fn check_rejected(tables: &SourceTables, strict: bool) -> PipelineResult<()> {
    for metric in Metric::ALL {
        let table = tables.get(metric);
        let Some(first) = table.rejected.first() else {
            continue;
        };
        if strict {
            log_error(first.to_string());
            return Err(PipelineError::MalformedRow(first.clone()));
        }
        log_warning(format!(
            "{} rows rejected in {}",
            table.rejected.len(),
            table.path.display()
        ));
        for row in table.rejected.iter().take(3) {
            log_warning_indent(format!("line {}: {}", row.line, row.reason), 1);
        }
    }
    Ok(())
}

/// Blueprint, reshape and derive. Pure: no IO.
///
/// The key space comes from the infection table only. Derivation starts
/// once all three tables are folded in.
pub fn build_snapshot(tables: &SourceTables, doubling_period: f64) -> (Snapshot, Vec<ReshapeReport>) {
    let mut snapshot = build_blueprint(&tables.infected.rows);
    log_success(format!("{} countries in blueprint", snapshot.len()));

    let reports: Vec<ReshapeReport> = Metric::ALL
        .iter()
        .map(|&metric| reshape(tables.get(metric), &mut snapshot, metric))
        .collect();

    derive_all(&mut snapshot, doubling_period);
    (snapshot, reports)
}

fn print_reshape_report(report: &ReshapeReport) {
    let label = report.metric.map(|m| m.label()).unwrap_or("?");
    log_info(format!(
        "{}: {} rows merged over {} dates ({} sub-national)",
        label, report.merged_rows, report.date_columns, report.subregion_rows
    ));
    if report.dropped_rows > 0 {
        let sample: Vec<&str> = report.dropped_countries.iter().take(5).map(String::as_str).collect();
        log_warning_indent(
            format!(
                "{} rows dropped, country not in infection table: {}",
                report.dropped_rows,
                sample.join(", ")
            ),
            1,
        );
    }
    if !report.invalid_date_headers.is_empty() {
        log_warning_indent(
            format!("skipped impossible dates: {}", report.invalid_date_headers.join(", ")),
            1,
        );
    }
    if let Some(first) = report.malformed_cells.first() {
        log_warning_indent(
            format!(
                "{} cells not counted (first: line {}, column '{}', value '{}')",
                report.malformed_cells.len(),
                first.line,
                first.header,
                first.value
            ),
            1,
        );
    }
    if let Some(first) = report.overflowed_cells.first() {
        log_warning_indent(
            format!(
                "{} cells not counted, sum exceeds u64 (first: line {}, column '{}')",
                report.overflowed_cells.len(),
                first.line,
                first.header
            ),
            1,
        );
    }
}

fn summarize(tables: &SourceTables) -> Vec<SourceSummary> {
    Metric::ALL
        .iter()
        .map(|&metric| {
            let table = tables.get(metric);
            SourceSummary {
                metric,
                path: table.path.clone(),
                encoding: table.encoding.clone(),
                delimiter: table.delimiter,
                row_count: table.rows.len(),
                rejected_rows: table.rejected.len(),
            }
        })
        .collect()
}

/// Run the whole pipeline once.
///
/// Source failures (and malformed rows under `strict_rows`) abort the run.
/// A failed write is logged and returned in [`PipelineOutcome::written`].
pub async fn run(options: &PipelineOptions) -> PipelineResult<PipelineOutcome> {
    log_info(format!("📖 Reading sources from {}", options.data_dir.display()));
    let tables = read_sources(options).await?;
    let sources = summarize(&tables);
    for s in &sources {
        log_info_indent(
            format!(
                "{}: {} rows ({}, '{}')",
                s.path.display(),
                s.row_count,
                s.encoding,
                s.delimiter
            ),
            1,
        );
    }

    check_rejected(&tables, options.strict_rows)?;

    log_info("⚙️  Reshaping and deriving...");
    let (snapshot, reshape) = build_snapshot(&tables, f64::from(options.doubling_period));
    for report in &reshape {
        print_reshape_report(report);
    }

    let written = write_output(&options.output_path, &snapshot, options).await;

    Ok(PipelineOutcome {
        snapshot,
        sources,
        reshape,
        written,
    })
}

async fn write_output(path: &Path, snapshot: &Snapshot, options: &PipelineOptions) -> SinkResult<PathBuf> {
    let result = write_snapshot(path, snapshot, options.pretty, options.validate_output).await;
    match &result {
        Ok(p) => log_success(format!("💾 Snapshot written to {}", p.display())),
        Err(e) => log_error(e.to_string()),
    }
    result
}
