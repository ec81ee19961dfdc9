//! Percentile rank buckets.

use levanter_traits::stats::average_ranks;

/// Converts composite scores to percentile buckets in `[0, 99]`.
///
/// Scores are ranked ascending with average-rank ties, divided by the
/// count, scaled to 100 and floored, then clamped. A cross-section of one
/// receives the neutral bucket 50.
#[must_use]
pub fn percentile_ranks(composites: &[f64]) -> Vec<u8> {
    let n = composites.len();
    if n == 0 {
        return Vec::new();
    }
    if n == 1 {
        return vec![50];
    }
    average_ranks(composites)
        .into_iter()
        .map(|r| {
            let pct = r / n as f64;
            (pct * 100.0).floor().clamp(0.0, 99.0) as u8
        })
        .collect()
}
