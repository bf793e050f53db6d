//! Error types for the covid-tracker pipeline.
//!
//! One enum per stage, aggregated into [`PipelineError`]:
//!
//! - [`SourceError`] - reading and framing the three source tables
//! - [`MalformedRow`] - a record rejected at the reader boundary
//! - [`SinkError`] - serialising, validating or writing the snapshot
//! - [`PipelineError`] - top-level orchestration errors
//!
//! Indeterminate arithmetic (division by zero, log of a non-positive ratio)
//! is not an error here: it is carried as [`crate::models::Derived::Indeterminate`].

use std::path::PathBuf;
use thiserror::Error;

// =============================================================================
// Source Errors
// =============================================================================

/// Errors while reading a source table. All of them abort the run.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The path could not be opened or read.
    #[error("Source unavailable: {}: {source}", path.display())]
    Unavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The CSV framing itself is broken.
    #[error("Invalid CSV in {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    /// No header row.
    #[error("CSV file is empty: {}", path.display())]
    EmptyFile { path: PathBuf },

    /// A required column is absent under every accepted alias.
    #[error("Missing column '{column}' in {}", path.display())]
    MissingColumn { path: PathBuf, column: String },
}

// =============================================================================
// Row Errors
// =============================================================================

/// A record that cannot be keyed.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Malformed row at {}:{line}: {reason}", path.display())]
pub struct MalformedRow {
    pub path: PathBuf,
    /// 1-based line number, header included.
    pub line: usize,
    pub reason: String,
}

// =============================================================================
// Sink Errors
// =============================================================================

/// Errors while producing the output artifact.
#[derive(Debug, Error)]
pub enum SinkError {
    /// IO error.
    #[error("Failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON error.
    #[error("Snapshot JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The snapshot does not match the embedded schema.
    #[error("Snapshot failed schema validation: {errors:?}")]
    Schema { errors: Vec<String> },
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline errors.
///
/// Returned by [`crate::transform::pipeline::run`]. Sink failures are not
/// part of it: they are reported through the pipeline outcome instead.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Reading a source failed.
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// A row was rejected while `strict_rows` is enabled.
    #[error("{0}")]
    MalformedRow(#[from] MalformedRow),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for source reading.
pub type SourceResult<T> = Result<T, SourceError>;

/// Result type for the sink.
pub type SinkResult<T> = Result<T, SinkError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
