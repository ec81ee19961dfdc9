//! Track 1 — IC analysis.
//!
//! IC is the per-date Spearman rank correlation between factor scores and
//! forward returns. Horizons without enough valid observations are
//! reported as absent rather than with degenerate statistics.

use std::collections::BTreeMap;

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use levanter_traits::stats::{mean, quantile_buckets, sample_std, spearman, MIN_DENOM};
use levanter_traits::{Date, FactorMeta, Symbol};

use crate::forward::ForwardReturns;
use crate::runner::ScoreHistory;

/// Minimum score/return pairs for a per-date IC.
const MIN_PAIRS: usize = 5;
/// Minimum common dates and symbols for a horizon to be analyzed.
const MIN_OVERLAP: usize = 5;
/// Minimum per-date ICs for a horizon result.
const MIN_ICS: usize = 3;

/// IC statistics for one horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ICResult {
    /// The factor analyzed.
    pub factor_name: String,
    /// Forward horizon in bars.
    pub horizon: usize,
    /// Mean of the per-date IC series.
    pub mean_ic: f64,
    /// Sample deviation of the per-date IC series.
    pub std_ic: f64,
    /// `mean_ic / std_ic`, zero when the deviation vanishes.
    pub ic_ir: f64,
    /// Fraction of per-date ICs above zero.
    pub ic_hit_rate: f64,
    /// Mean forward return per quantile bucket (1 = weakest scores).
    pub quantile_returns: BTreeMap<usize, f64>,
    /// Top-bucket mean return minus bottom-bucket mean return.
    pub top_bottom_spread: f64,
}

/// Mean IC per horizon, for decay plots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ICDecayCurve {
    /// The factor analyzed.
    pub factor_name: String,
    /// Horizons with a valid result, ascending.
    pub horizons: Vec<usize>,
    /// Mean IC per horizon.
    pub mean_ics: Vec<f64>,
}

/// Runs the IC track for one factor across all horizons.
#[must_use]
pub fn analyze_ic(
    meta: &FactorMeta,
    score_history: &ScoreHistory,
    return_matrices: &BTreeMap<usize, ForwardReturns>,
    computation_dates: &[Date],
    n_quantiles: usize,
) -> (Vec<ICResult>, ICDecayCurve) {
    let mut ic_results = Vec::new();
    let mut decay_horizons = Vec::new();
    let mut decay_ics = Vec::new();

    for (&horizon, matrix) in return_matrices {
        if let Some(result) =
            ic_for_horizon(meta, score_history, matrix, computation_dates, horizon, n_quantiles)
        {
            decay_horizons.push(horizon);
            decay_ics.push(result.mean_ic);
            ic_results.push(result);
        }
    }

    let decay = ICDecayCurve {
        factor_name: meta.name.to_string(),
        horizons: decay_horizons,
        mean_ics: decay_ics,
    };
    (ic_results, decay)
}

fn ic_for_horizon(
    meta: &FactorMeta,
    score_history: &ScoreHistory,
    matrix: &ForwardReturns,
    computation_dates: &[Date],
    horizon: usize,
    n_quantiles: usize,
) -> Option<ICResult> {
    let common_symbols: Vec<&Symbol> = score_history
        .keys()
        .filter(|sym| matrix.has_symbol(sym))
        .collect();
    if computation_dates.len() < MIN_OVERLAP || common_symbols.len() < MIN_OVERLAP {
        return None;
    }

    // Per-symbol date→score lookup
    let score_maps: BTreeMap<&Symbol, BTreeMap<Date, f64>> = score_history
        .iter()
        .map(|(sym, hist)| (sym, hist.iter().copied().collect()))
        .collect();

    let mut ic_series = Vec::new();
    for &date in computation_dates {
        let mut scores = Vec::new();
        let mut returns = Vec::new();
        for &sym in &common_symbols {
            let Some(score) = score_maps[sym].get(&date) else {
                continue;
            };
            let Some(ret) = matrix.get(sym, date) else {
                continue;
            };
            scores.push(*score);
            returns.push(ret);
        }
        if scores.len() < MIN_PAIRS {
            continue;
        }
        if let Some(ic) = spearman(&Array1::from_vec(scores), &Array1::from_vec(returns)) {
            ic_series.push(ic);
        }
    }
    if ic_series.len() < MIN_ICS {
        return None;
    }

    let mean_ic = mean(&ic_series).unwrap_or(0.0);
    let std_ic = sample_std(&ic_series).unwrap_or(0.0);
    let ic_ir = if std_ic > MIN_DENOM { mean_ic / std_ic } else { 0.0 };
    let ic_hit_rate =
        ic_series.iter().filter(|&&ic| ic > 0.0).count() as f64 / ic_series.len() as f64;

    let quantile_returns = quantile_mean_returns(
        &score_maps,
        matrix,
        computation_dates,
        &common_symbols,
        n_quantiles,
    );
    let top_bottom_spread = match (
        quantile_returns.get(&n_quantiles),
        quantile_returns.get(&1),
    ) {
        (Some(top), Some(bottom)) => top - bottom,
        _ => 0.0,
    };

    Some(ICResult {
        factor_name: meta.name.to_string(),
        horizon,
        mean_ic,
        std_ic,
        ic_ir,
        ic_hit_rate,
        quantile_returns,
        top_bottom_spread,
    })
}

/// Mean forward return per quantile bucket, averaged across dates.
///
/// Dates with fewer valid pairs than buckets are skipped entirely.
fn quantile_mean_returns(
    score_maps: &BTreeMap<&Symbol, BTreeMap<Date, f64>>,
    matrix: &ForwardReturns,
    computation_dates: &[Date],
    common_symbols: &[&Symbol],
    n_quantiles: usize,
) -> BTreeMap<usize, f64> {
    let mut per_bucket: BTreeMap<usize, Vec<f64>> =
        (1..=n_quantiles).map(|q| (q, Vec::new())).collect();

    for &date in computation_dates {
        let mut scores = Vec::new();
        let mut returns = Vec::new();
        for &sym in common_symbols {
            let Some(score) = score_maps[sym].get(&date) else {
                continue;
            };
            let Some(ret) = matrix.get(sym, date) else {
                continue;
            };
            scores.push(*score);
            returns.push(ret);
        }
        let Some(buckets) = quantile_buckets(&scores, n_quantiles) else {
            continue;
        };
        let mut sums: BTreeMap<usize, (f64, usize)> = BTreeMap::new();
        for (bucket, ret) in buckets.into_iter().zip(returns) {
            let entry = sums.entry(bucket).or_insert((0.0, 0));
            entry.0 += ret;
            entry.1 += 1;
        }
        for (bucket, (sum, count)) in sums {
            if count > 0 {
                per_bucket
                    .entry(bucket)
                    .or_default()
                    .push(sum / count as f64);
            }
        }
    }

    per_bucket
        .into_iter()
        .map(|(q, vals)| (q, mean(&vals).unwrap_or(0.0)))
        .collect()
}
