//! JSON Schema validation for the output snapshot.
//!
//! The schema is embedded at compile time from
//! `schemas/country-snapshot.json` (Draft 7). It pins the key alphabet,
//! the three metric maps and the number-or-indeterminate shape of the
//! derived fields, so a NaN sneaking into the output is caught before the
//! file is written.
//!
//! # Example
//!
//! ```rust,ignore
//! use serde_json::json;
//! use covid_tracker::validate_snapshot;
//!
//! let snapshot = json!({
//!     "foo": {
//!         "date": { "infected": { "2020-01-22": 10 }, "deaths": {}, "recovered": {} },
//!         "total_infected": 10,
//!         "mortality_rate": { "indeterminate": "missing_metric" }
//!     }
//! });
//! assert!(validate_snapshot(&snapshot).is_ok());
//! ```

use serde_json::Value;

const SNAPSHOT_SCHEMA: &str = include_str!("../../schemas/country-snapshot.json");

/// Validate `data` against a JSON schema.
///
/// Returns every error message when invalid.
pub fn validate(schema: &Value, data: &Value) -> Result<(), Vec<String>> {
    let validator = jsonschema::draft7::new(schema)
        .map_err(|e| vec![format!("Invalid schema: {}", e)])?;

    let errors: Vec<String> = validator
        .iter_errors(data)
        .map(|e| e.to_string())
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn snapshot_schema() -> Result<Value, Vec<String>> {
    serde_json::from_str(SNAPSHOT_SCHEMA).map_err(|e| vec![format!("Invalid embedded schema: {}", e)])
}

/// Validate a serialised snapshot against the embedded schema.
pub fn validate_snapshot(data: &Value) -> Result<(), Vec<String>> {
    validate(&snapshot_schema()?, data)
}
