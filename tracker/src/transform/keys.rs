//! Key and cell normalisation shared by every stage.
//!
//! The blueprint builder and the reshaper must agree on country keys, so
//! both go through [`normalize_country_key`] and nothing else.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

/// `M/DD/YY` or `MM/DD/YY`
static DATE_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{1,2}/[0-9]{2}/[0-9]{2}$").expect("valid date header pattern"));

/// Whole part, optionally followed by a fraction
static COUNT_CELL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]+)(?:\.[0-9]*)?$").expect("valid count cell pattern"));

/// Output date format
pub const ISO_DATE: &str = "%Y-%m-%d";

/// Lowercase the name and replace every character outside `[a-z0-9]` with `_`.
///
/// Idempotent: the output only contains characters it leaves untouched.
pub fn normalize_country_key(country: &str) -> String {
    country
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Whether a column header names a reporting date.
pub fn is_date_header(header: &str) -> bool {
    DATE_HEADER.is_match(header)
}

/// Convert a `M/DD/YY` header into `YYYY-MM-DD`.
///
/// Returns `None` for non-date headers and for headers that match the
/// pattern but name no calendar date (e.g. `2/30/20`).
pub fn parse_date_header(header: &str) -> Option<String> {
    if !is_date_header(header) {
        return None;
    }
    NaiveDate::parse_from_str(header, "%m/%d/%y")
        .ok()
        .map(|d| d.format(ISO_DATE).to_string())
}

/// Parse a count cell.
///
/// Accepts plain digits with an optional `.digits` fraction, which is
/// discarded. Exponents, signs, blanks and whole parts wider than `u64`
/// yield `None`.
pub fn parse_count(value: &str) -> Option<u64> {
    let caps = COUNT_CELL.captures(value.trim())?;
    caps.get(1)?.as_str().parse::<u64>().ok()
}
