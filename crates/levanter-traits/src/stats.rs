//! Array statistics used across the workspace.
//!
//! Rolling stats, ranking and bucketing are implemented directly over
//! contiguous numeric arrays. Degenerate inputs (zero variance, short
//! arrays, non-finite values) yield `None` or zeros at this layer so
//! callers never see NaN or infinity.

use ndarray::Array1;

/// Denominators at or below this threshold are treated as zero.
pub const MIN_DENOM: f64 = 1e-10;

/// Arithmetic mean. Returns `None` for an empty slice.
#[must_use]
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (N−1 denominator). Returns `None` when fewer
/// than two values are given.
#[must_use]
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let variance =
        values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

/// Cross-sectional z-scores clamped to `[-clamp, clamp]`.
///
/// Uses the sample standard deviation. A degenerate cross-section (fewer
/// than two values, or zero variance) standardizes to all zeros.
#[must_use]
pub fn zscore_clamped(values: &[f64], clamp: f64) -> Vec<f64> {
    let n = values.len();
    if n < 2 {
        return vec![0.0; n];
    }
    let m = mean(values).unwrap_or(0.0);
    let std = sample_std(values).unwrap_or(0.0);
    if std <= MIN_DENOM {
        return vec![0.0; n];
    }
    values
        .iter()
        .map(|v| ((v - m) / std).clamp(-clamp, clamp))
        .collect()
}

/// Ordinal ranks with average-rank ties, 1-based.
///
/// `[10.0, 30.0, 20.0, 30.0]` ranks to `[1.0, 3.5, 2.0, 3.5]`.
#[must_use]
pub fn average_ranks(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    let mut indexed: Vec<(usize, f64)> = values.iter().copied().enumerate().collect();
    indexed.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

    let mut ranks = vec![0.0; n];
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j < n && indexed[j].1 == indexed[i].1 {
            j += 1;
        }
        // 1-based average rank across the tie group
        let avg_rank = (i + j + 1) as f64 / 2.0;
        for k in i..j {
            ranks[indexed[k].0] = avg_rank;
        }
        i = j;
    }
    ranks
}

/// Spearman rank correlation between two equal-length arrays.
///
/// Non-finite pairs are dropped before ranking. Returns `None` on length
/// mismatch, fewer than two valid pairs, or zero variance in either rank
/// vector.
#[must_use]
pub fn spearman(x: &Array1<f64>, y: &Array1<f64>) -> Option<f64> {
    if x.len() != y.len() {
        return None;
    }
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y.iter())
        .filter(|(a, b)| a.is_finite() && b.is_finite())
        .map(|(&a, &b)| (a, b))
        .collect();
    if pairs.len() < 2 {
        return None;
    }

    let rx = average_ranks(&pairs.iter().map(|(a, _)| *a).collect::<Vec<_>>());
    let ry = average_ranks(&pairs.iter().map(|(_, b)| *b).collect::<Vec<_>>());
    pearson(&rx, &ry)
}

/// Pearson correlation of two equal-length slices.
#[must_use]
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    let n = x.len();
    if n != y.len() || n < 2 {
        return None;
    }
    let mx = mean(x)?;
    let my = mean(y)?;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for i in 0..n {
        let dx = x[i] - mx;
        let dy = y[i] - my;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x <= MIN_DENOM || var_y <= MIN_DENOM {
        return None;
    }
    Some(cov / (var_x.sqrt() * var_y.sqrt()))
}

/// Least-squares fit of `y` against the index `0..n`.
///
/// Returns `(slope, r_squared)`, or `None` when fewer than two points are
/// given or the fit is degenerate.
#[must_use]
pub fn linear_fit(y: &[f64]) -> Option<(f64, f64)> {
    let n = y.len();
    if n < 2 {
        return None;
    }
    let nf = n as f64;
    let mean_x = (nf - 1.0) / 2.0;
    let mean_y = mean(y)?;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (i, &yi) in y.iter().enumerate() {
        let dx = i as f64 - mean_x;
        let dy = yi - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx <= MIN_DENOM {
        return None;
    }
    let slope = sxy / sxx;
    // Flat series fits itself perfectly with slope 0.
    let r_squared = if syy <= MIN_DENOM {
        1.0
    } else {
        (sxy * sxy) / (sxx * syy)
    };
    Some((slope, r_squared))
}

/// Equal-frequency quantile buckets, 1-based, with first-occurrence ties.
///
/// Values are ranked by `(value, original position)` so equal values fall
/// into buckets in input order, matching a rank-then-cut on first-available
/// ranks. Returns `None` when there are fewer values than buckets.
#[must_use]
pub fn quantile_buckets(values: &[f64], n_buckets: usize) -> Option<Vec<usize>> {
    let n = values.len();
    if n_buckets < 2 || n < n_buckets {
        return None;
    }
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        values[a]
            .partial_cmp(&values[b])
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.cmp(&b))
    });

    let mut buckets = vec![0usize; n];
    for (pos, &idx) in order.iter().enumerate() {
        buckets[idx] = pos * n_buckets / n + 1;
    }
    Some(buckets)
}

/// One-sample t statistic against a zero mean.
///
/// Returns `None` when fewer than two observations are given or the sample
/// standard deviation vanishes.
#[must_use]
pub fn t_statistic(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let m = mean(values)?;
    let std = sample_std(values)?;
    if std <= MIN_DENOM {
        return None;
    }
    Some(m / (std / (n as f64).sqrt()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_mean_and_std() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_relative_eq!(mean(&values).unwrap(), 3.0);
        assert_relative_eq!(sample_std(&values).unwrap(), 2.5f64.sqrt());
        assert!(mean(&[]).is_none());
        assert!(sample_std(&[1.0]).is_none());
    }

    #[test]
    fn test_zscore_clamped() {
        let z = zscore_clamped(&[1.0, 2.0, 3.0], 3.0);
        assert_relative_eq!(z[0], -1.0);
        assert_relative_eq!(z[1], 0.0);
        assert_relative_eq!(z[2], 1.0);
    }

    #[test]
    fn test_zscore_clamp_applied() {
        // One extreme outlier pushes past the clamp
        let values = [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 100.0];
        let z = zscore_clamped(&values, 3.0);
        assert_relative_eq!(z[9], 3.0);
    }

    #[test]
    fn test_zscore_degenerate_is_zero() {
        assert_eq!(zscore_clamped(&[5.0, 5.0, 5.0], 3.0), vec![0.0; 3]);
        assert_eq!(zscore_clamped(&[5.0], 3.0), vec![0.0]);
        assert!(zscore_clamped(&[], 3.0).is_empty());
    }

    #[test]
    fn test_average_ranks() {
        assert_eq!(average_ranks(&[10.0, 30.0, 20.0]), vec![1.0, 3.0, 2.0]);
        assert_eq!(
            average_ranks(&[1.0, 2.0, 2.0, 3.0]),
            vec![1.0, 2.5, 2.5, 4.0]
        );
    }

    #[test]
    fn test_spearman_perfect() {
        let x = array![1.0, 2.0, 3.0, 4.0, 5.0];
        let y = array![0.01, 0.02, 0.03, 0.04, 0.05];
        assert_relative_eq!(spearman(&x, &y).unwrap(), 1.0);

        let y_rev = array![0.05, 0.04, 0.03, 0.02, 0.01];
        assert_relative_eq!(spearman(&x, &y_rev).unwrap(), -1.0);
    }

    #[test]
    fn test_spearman_filters_non_finite() {
        let x = array![1.0, 2.0, f64::NAN, 4.0];
        let y = array![0.01, 0.02, 0.03, 0.04];
        let rho = spearman(&x, &y).unwrap();
        assert!((-1.0..=1.0).contains(&rho));
    }

    #[test]
    fn test_spearman_degenerate() {
        let x = array![1.0, 1.0, 1.0];
        let y = array![0.01, 0.02, 0.03];
        assert!(spearman(&x, &y).is_none());
        assert!(spearman(&array![1.0], &array![2.0]).is_none());
    }

    #[test]
    fn test_linear_fit_exact_line() {
        let y = [1.0, 3.0, 5.0, 7.0];
        let (slope, r2) = linear_fit(&y).unwrap();
        assert_relative_eq!(slope, 2.0);
        assert_relative_eq!(r2, 1.0);
    }

    #[test]
    fn test_linear_fit_flat() {
        let (slope, r2) = linear_fit(&[4.0, 4.0, 4.0]).unwrap();
        assert_relative_eq!(slope, 0.0);
        assert_relative_eq!(r2, 1.0);
    }

    #[test]
    fn test_linear_fit_too_short() {
        assert!(linear_fit(&[1.0]).is_none());
    }

    #[test]
    fn test_quantile_buckets_even_split() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let buckets = quantile_buckets(&values, 3).unwrap();
        assert_eq!(buckets, vec![1, 1, 2, 2, 3, 3]);
    }

    #[test]
    fn test_quantile_buckets_first_occurrence_ties() {
        // Equal values land in buckets in input order
        let values = [1.0, 1.0, 1.0, 1.0];
        let buckets = quantile_buckets(&values, 2).unwrap();
        assert_eq!(buckets, vec![1, 1, 2, 2]);
    }

    #[test]
    fn test_quantile_buckets_too_few() {
        assert!(quantile_buckets(&[1.0, 2.0], 3).is_none());
    }

    #[test]
    fn test_t_statistic() {
        // Constant positive sample has zero std → None
        assert!(t_statistic(&[0.05, 0.05, 0.05]).is_none());
        assert!(t_statistic(&[0.05]).is_none());

        let t = t_statistic(&[0.04, 0.05, 0.06, 0.05, 0.04, 0.06]).unwrap();
        assert!(t > 5.0);
    }
}
