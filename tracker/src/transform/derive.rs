//! Derivation pass: totals, mortality rate and doubling time.
//!
//! Each sub-pass walks the whole country set once and only reads the
//! reshaped `date` series, so they must run after all three tables have been
//! reshaped. Anything that would produce NaN or infinity is stored as
//! [`Derived::Indeterminate`] instead.

use crate::models::{Derived, Indeterminacy, Metric, Snapshot};

/// Samples between `N_0` and `N_t` in the doubling estimate.
pub const DOUBLING_LOOKBACK: usize = 5;

/// Round half away from zero to 3 decimal places.
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// `total_X = max(date[X])`, absent when the series is empty.
///
/// Source counts are cumulative, so the maximum is the latest count even
/// when a late correction lowered a day's value.
pub fn compute_totals(snapshot: &mut Snapshot) {
    for record in snapshot.records_mut() {
        for metric in Metric::ALL {
            let total = record.date.get(metric).values().copied().max();
            record.set_total(metric, total);
        }
    }
}

/// `deaths * 100 / infected`, rounded to 3 decimals.
pub fn mortality_rate(total_deaths: Option<u64>, total_infected: Option<u64>) -> Derived {
    let (Some(deaths), Some(infected)) = (total_deaths, total_infected) else {
        return Derived::indeterminate(Indeterminacy::MissingMetric);
    };
    if infected == 0 {
        return Derived::indeterminate(Indeterminacy::ZeroInfected);
    }
    Derived::from_finite(
        round3(deaths as f64 * 100.0 / infected as f64),
        Indeterminacy::ZeroInfected,
    )
}

pub fn compute_mortality(snapshot: &mut Snapshot) {
    for record in snapshot.records_mut() {
        record.mortality_rate = Some(mortality_rate(record.total_deaths, record.total_infected));
    }
}

/// Days for a cumulative count to double, assuming exponential growth
/// between `N_0` (five samples before the last) and `N_t` (the last).
///
/// `period * log10(2) / log10(N_t / N_0)`, rounded to 3 decimals.
/// `samples` must be in chronological order.
pub fn doubling_time(samples: &[u64], period: f64) -> Derived {
    if samples.len() <= DOUBLING_LOOKBACK {
        return Derived::indeterminate(Indeterminacy::InsufficientSamples);
    }
    let n_t = samples[samples.len() - 1];
    let n_0 = samples[samples.len() - 1 - DOUBLING_LOOKBACK];

    if n_0 == 0 {
        return Derived::indeterminate(Indeterminacy::ZeroBaseline);
    }
    if n_t <= n_0 {
        return Derived::indeterminate(Indeterminacy::NoGrowth);
    }

    let ratio = n_t as f64 / n_0 as f64;
    Derived::from_finite(
        round3(period * 2f64.log10() / ratio.log10()),
        Indeterminacy::NoGrowth,
    )
}

/// Doubling time over each country's infected series, in date order.
pub fn compute_doubling(snapshot: &mut Snapshot, period: f64) {
    for record in snapshot.records_mut() {
        let samples: Vec<u64> = record.date.infected.values().copied().collect();
        record.doubling_rate = Some(doubling_time(&samples, period));
    }
}

/// Run every sub-pass over a fully reshaped snapshot.
pub fn derive_all(snapshot: &mut Snapshot, period: f64) {
    compute_totals(snapshot);
    compute_doubling(snapshot, period);
    compute_mortality(snapshot);
}
