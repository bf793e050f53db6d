//! Domain models for the covid-tracker pipeline.
//!
//! - [`Metric`] - which source table a count came from
//! - [`DateSeries`] - per-metric mapping from ISO date to cumulative count
//! - [`CountryRecord`] - one country's series plus derived statistics
//! - [`Derived`] - a derived statistic or the reason it is indeterminate
//! - [`Snapshot`] - the full country set, keyed by normalised country key

use serde::{Deserialize, Serialize};
use std::collections::btree_map::{self, BTreeMap};
use std::fmt;

// =============================================================================
// Metric
// =============================================================================

/// The three time-series tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Infected,
    Deaths,
    Recovered,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Infected, Metric::Deaths, Metric::Recovered];

    pub fn label(&self) -> &'static str {
        match self {
            Metric::Infected => "infected",
            Metric::Deaths => "deaths",
            Metric::Recovered => "recovered",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Date Series
// =============================================================================

/// Cumulative counts keyed by `YYYY-MM-DD`.
///
/// ISO keys sort lexically in calendar order, so iteration is chronological.
pub type DailyCounts = BTreeMap<String, u64>;

/// The `date` object of a country record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DateSeries {
    #[serde(default)]
    pub infected: DailyCounts,
    #[serde(default)]
    pub deaths: DailyCounts,
    #[serde(default)]
    pub recovered: DailyCounts,
}

impl DateSeries {
    pub fn get(&self, metric: Metric) -> &DailyCounts {
        match metric {
            Metric::Infected => &self.infected,
            Metric::Deaths => &self.deaths,
            Metric::Recovered => &self.recovered,
        }
    }

    pub fn get_mut(&mut self, metric: Metric) -> &mut DailyCounts {
        match metric {
            Metric::Infected => &mut self.infected,
            Metric::Deaths => &mut self.deaths,
            Metric::Recovered => &mut self.recovered,
        }
    }

    /// Add `value` to the cell, creating it when absent.
    ///
    /// Returns `false`, leaving the cell untouched, when the sum would not
    /// fit in a `u64`.
    pub fn accumulate(&mut self, metric: Metric, date: &str, value: u64) -> bool {
        let cell = self.get_mut(metric).entry(date.to_string()).or_insert(0);
        match cell.checked_add(value) {
            Some(sum) => {
                *cell = sum;
                true
            }
            None => false,
        }
    }
}

// =============================================================================
// Derived statistics
// =============================================================================

/// Why a derived statistic has no numeric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Indeterminacy {
    /// A metric the formula needs was never reported for this country.
    MissingMetric,
    /// Mortality with `total_infected == 0`.
    ZeroInfected,
    /// Fewer samples than the doubling lookback needs.
    InsufficientSamples,
    /// The doubling baseline `N_0` is zero.
    ZeroBaseline,
    /// `N_t <= N_0`: the series is flat or shrinking.
    NoGrowth,
}

/// A derived statistic.
///
/// Serialised untagged: a plain JSON number, or `{"indeterminate": "<reason>"}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Derived {
    Value(f64),
    Indeterminate { indeterminate: Indeterminacy },
}

impl Derived {
    pub fn indeterminate(reason: Indeterminacy) -> Self {
        Derived::Indeterminate { indeterminate: reason }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Derived::Value(v) => Some(*v),
            Derived::Indeterminate { .. } => None,
        }
    }

    pub fn reason(&self) -> Option<Indeterminacy> {
        match self {
            Derived::Value(_) => None,
            Derived::Indeterminate { indeterminate } => Some(*indeterminate),
        }
    }

    /// Wrap a computed float, turning anything non-finite into `fallback`.
    pub fn from_finite(value: f64, fallback: Indeterminacy) -> Self {
        if value.is_finite() {
            Derived::Value(value)
        } else {
            Derived::indeterminate(fallback)
        }
    }
}

// =============================================================================
// Country Record
// =============================================================================

/// One country's reshaped series and its derived statistics.
///
/// Totals are absent when the country never received a value for that
/// metric; derived fields are absent until the derivation pass runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CountryRecord {
    pub date: DateSeries,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_infected: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_deaths: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_recovered: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mortality_rate: Option<Derived>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doubling_rate: Option<Derived>,
}

impl CountryRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total(&self, metric: Metric) -> Option<u64> {
        match metric {
            Metric::Infected => self.total_infected,
            Metric::Deaths => self.total_deaths,
            Metric::Recovered => self.total_recovered,
        }
    }

    pub fn set_total(&mut self, metric: Metric, total: Option<u64>) {
        match metric {
            Metric::Infected => self.total_infected = total,
            Metric::Deaths => self.total_deaths = total,
            Metric::Recovered => self.total_recovered = total,
        }
    }
}

// =============================================================================
// Snapshot
// =============================================================================

/// The complete country set: the pipeline's output artifact.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    countries: BTreeMap<String, CountryRecord>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an empty record unless `key` is already present.
    ///
    /// Returns `true` when a record was created.
    pub fn insert_blank(&mut self, key: String) -> bool {
        match self.countries.entry(key) {
            btree_map::Entry::Vacant(slot) => {
                slot.insert(CountryRecord::new());
                true
            }
            btree_map::Entry::Occupied(_) => false,
        }
    }

    pub fn get(&self, key: &str) -> Option<&CountryRecord> {
        self.countries.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut CountryRecord> {
        self.countries.get_mut(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.countries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.countries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.countries.keys()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, CountryRecord> {
        self.countries.iter()
    }

    pub fn records_mut(&mut self) -> btree_map::ValuesMut<'_, String, CountryRecord> {
        self.countries.values_mut()
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = (&'a String, &'a CountryRecord);
    type IntoIter = btree_map::Iter<'a, String, CountryRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.countries.iter()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_accumulate_creates_then_adds() {
        let mut series = DateSeries::default();
        series.accumulate(Metric::Infected, "2020-01-22", 5);
        series.accumulate(Metric::Infected, "2020-01-22", 7);
        series.accumulate(Metric::Deaths, "2020-01-22", 1);

        assert_eq!(series.infected["2020-01-22"], 12);
        assert_eq!(series.deaths["2020-01-22"], 1);
        assert!(series.recovered.is_empty());
    }

    #[test]
    fn test_accumulate_refuses_overflow() {
        let mut series = DateSeries::default();
        assert!(series.accumulate(Metric::Infected, "2020-01-22", u64::MAX));
        assert!(!series.accumulate(Metric::Infected, "2020-01-22", 1));
        assert_eq!(series.infected["2020-01-22"], u64::MAX);
    }

    #[test]
    fn test_daily_counts_iterate_chronologically() {
        let mut series = DateSeries::default();
        series.accumulate(Metric::Infected, "2020-02-01", 3);
        series.accumulate(Metric::Infected, "2020-01-31", 2);
        series.accumulate(Metric::Infected, "2020-01-22", 1);

        let values: Vec<u64> = series.infected.values().copied().collect();
        assert_eq!(values, vec![1, 2, 3]);
    }

    #[test]
    fn test_insert_blank_is_idempotent() {
        let mut snapshot = Snapshot::new();
        assert!(snapshot.insert_blank("foo".into()));
        snapshot
            .get_mut("foo")
            .unwrap()
            .date
            .accumulate(Metric::Infected, "2020-01-22", 10);
        assert!(!snapshot.insert_blank("foo".into()));

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.get("foo").unwrap().date.infected["2020-01-22"], 10);
    }

    #[test]
    fn test_derived_serialization() {
        assert_eq!(serde_json::to_value(Derived::Value(2.5)).unwrap(), json!(2.5));
        assert_eq!(
            serde_json::to_value(Derived::indeterminate(Indeterminacy::ZeroInfected)).unwrap(),
            json!({ "indeterminate": "zero_infected" })
        );

        let parsed: Derived = serde_json::from_value(json!({ "indeterminate": "no_growth" })).unwrap();
        assert_eq!(parsed.reason(), Some(Indeterminacy::NoGrowth));
        let parsed: Derived = serde_json::from_value(json!(1.75)).unwrap();
        assert_eq!(parsed.value(), Some(1.75));
    }

    #[test]
    fn test_from_finite_rejects_nan_and_infinity() {
        assert_eq!(
            Derived::from_finite(f64::NAN, Indeterminacy::NoGrowth),
            Derived::indeterminate(Indeterminacy::NoGrowth)
        );
        assert_eq!(
            Derived::from_finite(f64::INFINITY, Indeterminacy::ZeroInfected),
            Derived::indeterminate(Indeterminacy::ZeroInfected)
        );
        assert_eq!(Derived::from_finite(3.0, Indeterminacy::NoGrowth), Derived::Value(3.0));
    }

    #[test]
    fn test_record_omits_absent_totals() {
        let mut record = CountryRecord::new();
        record.date.accumulate(Metric::Infected, "2020-01-22", 10);
        record.set_total(Metric::Infected, Some(10));

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["total_infected"], 10);
        assert!(json.get("total_deaths").is_none());
        assert_eq!(json["date"]["deaths"], json!({}));
    }

    #[test]
    fn test_snapshot_is_a_plain_map() {
        let mut snapshot = Snapshot::new();
        snapshot.insert_blank("korea__south".into());
        let json = serde_json::to_value(&snapshot).unwrap();
        assert!(json.get("korea__south").is_some());
    }
}
