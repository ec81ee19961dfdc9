//! Track 2 — event studies.
//!
//! Forward returns collected at detected event dates, summarized per
//! `(signal, horizon)` pair with a one-sample t-test against zero. The
//! test statistics are absent below two events.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};

use levanter_traits::stats::{mean, t_statistic};
use levanter_traits::{Date, Symbol};

use crate::forward::ForwardReturns;
use crate::signals::SignalDefinition;

/// Event study summary for one signal at one horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventStudyResult {
    /// The factor whose score history produced the events.
    pub factor_name: String,
    /// Signal rule label.
    pub signal_label: String,
    /// Forward horizon in bars.
    pub horizon: usize,
    /// Number of events with a defined forward return.
    pub n_events: usize,
    /// Mean forward return across events.
    pub mean_return: f64,
    /// Median forward return across events.
    pub median_return: f64,
    /// Fraction of events with a positive return.
    pub hit_rate: f64,
    /// One-sample t statistic against zero, absent below two events.
    pub t_stat: Option<f64>,
    /// Two-sided p-value for the t statistic, absent with it.
    pub p_value: Option<f64>,
}

/// Runs the event study for one signal across all horizons.
#[must_use]
pub fn run_event_study(
    factor_name: &str,
    signal_def: &SignalDefinition,
    events: &BTreeMap<Symbol, Vec<Date>>,
    return_matrices: &BTreeMap<usize, ForwardReturns>,
) -> Vec<EventStudyResult> {
    let signal_label = signal_def.label();
    return_matrices
        .iter()
        .map(|(&horizon, matrix)| {
            study_for_horizon(factor_name, &signal_label, horizon, events, matrix)
        })
        .collect()
}

fn study_for_horizon(
    factor_name: &str,
    signal_label: &str,
    horizon: usize,
    events: &BTreeMap<Symbol, Vec<Date>>,
    matrix: &ForwardReturns,
) -> EventStudyResult {
    let mut event_returns: Vec<f64> = Vec::new();
    for (symbol, dates) in events {
        for &date in dates {
            if let Some(ret) = matrix.get(symbol, date) {
                event_returns.push(ret);
            }
        }
    }

    let n_events = event_returns.len();
    if n_events == 0 {
        return EventStudyResult {
            factor_name: factor_name.to_string(),
            signal_label: signal_label.to_string(),
            horizon,
            n_events: 0,
            mean_return: 0.0,
            median_return: 0.0,
            hit_rate: 0.0,
            t_stat: None,
            p_value: None,
        };
    }

    let mean_return = mean(&event_returns).unwrap_or(0.0);
    let median_return = median(&event_returns);
    let hit_rate = event_returns.iter().filter(|&&r| r > 0.0).count() as f64 / n_events as f64;

    let t_stat = if n_events >= 2 {
        t_statistic(&event_returns)
    } else {
        None
    };
    let p_value = t_stat.and_then(|t| two_sided_p(t, n_events - 1));

    EventStudyResult {
        factor_name: factor_name.to_string(),
        signal_label: signal_label.to_string(),
        horizon,
        n_events,
        mean_return,
        median_return,
        hit_rate,
        t_stat,
        p_value,
    }
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

/// Two-sided p-value from a Student-t statistic with `df` degrees of
/// freedom.
fn two_sided_p(t: f64, df: usize) -> Option<f64> {
    let dist = StudentsT::new(0.0, 1.0, df as f64).ok()?;
    Some(2.0 * (1.0 - dist.cdf(t.abs())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn d(i: u64) -> Date {
        "2024-01-01".parse::<Date>().unwrap() + chrono::Days::new(i)
    }

    fn def() -> SignalDefinition {
        SignalDefinition::new(crate::signals::SignalKind::Threshold, 90.0)
    }

    /// 50 events whose 5-day forward return hovers around +5%.
    fn strong_signal_setup() -> (BTreeMap<Symbol, Vec<Date>>, BTreeMap<usize, ForwardReturns>) {
        let mut events = BTreeMap::new();
        let mut values: BTreeMap<Symbol, BTreeMap<Date, f64>> = BTreeMap::new();

        for j in 0..5 {
            let sym = Symbol::new(format!("S{j}"));
            let dates: Vec<Date> = (0..10).map(|t| d(t * 7 + j)).collect();
            let rets: BTreeMap<Date, f64> = dates
                .iter()
                .enumerate()
                .map(|(t, &date)| {
                    // Small deterministic spread around the +5% center
                    let wobble = 0.012 * (((t + j as usize * 3) % 7) as f64 - 3.0) / 3.0;
                    (date, 0.05 + wobble)
                })
                .collect();
            events.insert(sym.clone(), dates);
            values.insert(sym, rets);
        }

        let mut matrices = BTreeMap::new();
        matrices.insert(5, ForwardReturns::from_values(5, values));
        (events, matrices)
    }

    #[test]
    fn test_strong_signal_statistics() {
        let (events, matrices) = strong_signal_setup();
        let results = run_event_study("test_factor", &def(), &events, &matrices);
        assert_eq!(results.len(), 1);

        let r = &results[0];
        assert_eq!(r.n_events, 50);
        assert_relative_eq!(r.mean_return, 0.05, epsilon = 0.01);
        assert!(r.hit_rate > 0.8);
        let t = r.t_stat.unwrap();
        assert!(t.abs() >= 5.0, "t = {t}");
        assert!(r.p_value.unwrap() < 0.001);
        assert_eq!(r.signal_label, "threshold_90");
    }

    #[test]
    fn test_no_events() {
        let (_, matrices) = strong_signal_setup();
        let results = run_event_study("test_factor", &def(), &BTreeMap::new(), &matrices);
        let r = &results[0];
        assert_eq!(r.n_events, 0);
        assert!(r.t_stat.is_none());
        assert!(r.p_value.is_none());
        assert_relative_eq!(r.mean_return, 0.0);
    }

    #[test]
    fn test_single_event_no_t_stat() {
        let mut events = BTreeMap::new();
        events.insert(Symbol::new("S0"), vec![d(0)]);
        let mut values: BTreeMap<Symbol, BTreeMap<Date, f64>> = BTreeMap::new();
        values.insert(Symbol::new("S0"), [(d(0), 0.02)].into_iter().collect());
        let mut matrices = BTreeMap::new();
        matrices.insert(5, ForwardReturns::from_values(5, values));

        let results = run_event_study("test_factor", &def(), &events, &matrices);
        let r = &results[0];
        assert_eq!(r.n_events, 1);
        assert!(r.t_stat.is_none());
        assert_relative_eq!(r.mean_return, 0.02);
        assert_relative_eq!(r.median_return, 0.02);
    }

    #[test]
    fn test_events_without_returns_skipped() {
        let mut events = BTreeMap::new();
        events.insert(Symbol::new("S0"), vec![d(0), d(500)]);
        let mut values: BTreeMap<Symbol, BTreeMap<Date, f64>> = BTreeMap::new();
        values.insert(Symbol::new("S0"), [(d(0), 0.02)].into_iter().collect());
        let mut matrices = BTreeMap::new();
        matrices.insert(5, ForwardReturns::from_values(5, values));

        let results = run_event_study("test_factor", &def(), &events, &matrices);
        assert_eq!(results[0].n_events, 1);
    }

    #[test]
    fn test_median_even_count() {
        assert_relative_eq!(median(&[1.0, 2.0, 3.0, 4.0]), 2.5);
        assert_relative_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
    }

    #[test]
    fn test_hit_rate() {
        let mut events = BTreeMap::new();
        events.insert(Symbol::new("S0"), (0..4).map(d).collect::<Vec<_>>());
        let mut values: BTreeMap<Symbol, BTreeMap<Date, f64>> = BTreeMap::new();
        values.insert(
            Symbol::new("S0"),
            (0..4)
                .map(|i| (d(i), if i < 3 { 0.01 } else { -0.01 }))
                .collect(),
        );
        let mut matrices = BTreeMap::new();
        matrices.insert(1, ForwardReturns::from_values(1, values));

        let results = run_event_study("test_factor", &def(), &events, &matrices);
        assert_relative_eq!(results[0].hit_rate, 0.75);
    }
}
