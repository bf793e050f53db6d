//! Transformation module.
//!
//! - Keys: country-key and date-header normalisation shared by every stage
//! - Blueprint: the country key space, from the infection table
//! - Reshape: dated columns folded into per-country series
//! - Derive: totals, mortality rate, doubling time
//! - Pipeline: orchestration of the stages above

pub mod blueprint;
pub mod derive;
pub mod keys;
pub mod pipeline;
pub mod reshape;

pub use blueprint::build_blueprint;
pub use derive::{derive_all, doubling_time, mortality_rate, DOUBLING_LOOKBACK};
pub use keys::{normalize_country_key, parse_date_header};
pub use pipeline::*;
pub use reshape::{reshape, MalformedCell, ReshapeReport};
