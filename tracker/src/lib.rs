//! # covid-tracker - per-country COVID-19 statistics from time-series CSVs
//!
//! Reads the infection, death and recovery tables (one row per country or
//! sub-region, one column per reporting date), reshapes them into a
//! per-country structure and derives running totals, mortality rate and
//! doubling time.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  3 × CSV    │────▶│   Parser    │────▶│  Blueprint  │────▶│  Reshape +  │────▶│  Snapshot   │
//! │ (raw, JHU)  │     │ (validated) │     │ (key space) │     │   Derive    │     │   (JSON)    │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use covid_tracker::{run, PipelineOptions};
//!
//! #[tokio::main]
//! async fn main() {
//!     let outcome = run(&PipelineOptions::default()).await.unwrap();
//!     println!("{} countries", outcome.snapshot.len());
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types per stage
//! - [`logs`] - Progress logs with subscribers
//! - [`models`] - Country records, derived values, snapshot
//! - [`parser`] - CSV reading with auto-detection and row validation
//! - [`transform`] - Blueprint, reshape, derivation and the pipeline
//! - [`validation`] - Snapshot JSON Schema validation
//! - [`sink`] - Snapshot writing and loading

// Core modules
pub mod error;
pub mod logs;
pub mod models;

// Reading
pub mod parser;

// Transformation
pub mod transform;

// Output
pub mod sink;
pub mod validation;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    MalformedRow,
    PipelineError,
    PipelineResult,
    SinkError,
    SourceError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    CountryRecord,
    DailyCounts,
    DateSeries,
    Derived,
    Indeterminacy,
    Metric,
    Snapshot,
};

// =============================================================================
// Re-exports - Parsing
// =============================================================================

pub use parser::{
    decode_content,
    detect_delimiter,
    detect_encoding,
    parse_bytes_auto,
    parse_table,
    read_source,
    SourceRow,
    SourceTable,
};

// =============================================================================
// Re-exports - Transformation
// =============================================================================

pub use transform::{
    build_blueprint,
    derive_all,
    doubling_time,
    mortality_rate,
    normalize_country_key,
    parse_date_header,
    reshape,
    ReshapeReport,
    DOUBLING_LOOKBACK,
};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::pipeline::{
    build_snapshot,
    read_sources,
    run,
    PipelineOptions,
    PipelineOutcome,
    SourceSummary,
    SourceTables,
};

// =============================================================================
// Re-exports - Output
// =============================================================================

pub use sink::{load_snapshot, write_snapshot};
pub use validation::validate_snapshot;
