//! Performance metrics computed from a NAV series.

use serde::{Deserialize, Serialize};

use levanter_traits::stats::{mean, sample_std, MIN_DENOM};
use levanter_traits::Date;

/// The full metric set for one backtest run.
///
/// Relative metrics (alpha, beta, information ratio, tracking error) are
/// zero when no benchmark is supplied. Any quantity whose divisor falls
/// below `1e-10` is reported as zero rather than NaN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// `NAV_end / NAV_start − 1`.
    pub total_return: f64,
    /// Compound annual growth rate.
    pub cagr: f64,
    /// Annualized sample volatility of daily returns.
    pub annual_volatility: f64,
    /// Maximum drawdown, negative.
    pub max_drawdown: f64,
    /// Days from the running peak to the deepest trough.
    pub max_dd_duration: usize,
    /// `CAGR / annual_volatility` with risk-free rate zero.
    pub sharpe_ratio: f64,
    /// CAGR over annualized downside deviation.
    pub sortino_ratio: f64,
    /// `CAGR / |max_drawdown|`.
    pub calmar_ratio: f64,
    /// Annualized Jensen's alpha versus the benchmark.
    pub alpha: f64,
    /// OLS beta versus the benchmark.
    pub beta: f64,
    /// Annualized active return over tracking error.
    pub information_ratio: f64,
    /// Annualized sample deviation of active returns.
    pub tracking_error: f64,
    /// Cumulative traded notional over mean NAV per year.
    pub annual_turnover: f64,
    /// Total transaction costs paid.
    pub total_costs: f64,
    /// Fraction of days with a positive return.
    pub win_rate: f64,
    /// Number of snapshot days.
    pub n_days: usize,
    /// Number of executed trades.
    pub n_trades: usize,
}

/// Computes the full metric set from a NAV series.
///
/// Under two data points every return-derived field is zero and only the
/// pass-through fields (costs, trades, turnover, day count) are kept.
pub fn compute_metrics(
    nav_series: &[(Date, f64)],
    benchmark_nav: Option<&[(Date, f64)]>,
    total_costs: f64,
    n_trades: usize,
    annual_turnover: f64,
    days_per_year: usize,
) -> PerformanceMetrics {
    let navs: Vec<f64> = nav_series.iter().map(|&(_, nav)| nav).collect();
    let n_days = navs.len();

    if n_days < 2 {
        return empty_metrics(total_costs, n_trades, annual_turnover, n_days);
    }

    let daily_returns: Vec<f64> = navs.windows(2).map(|w| w[1] / w[0] - 1.0).collect();

    let total_return = navs[n_days - 1] / navs[0] - 1.0;
    let years = n_days as f64 / days_per_year as f64;
    let cagr = if years > 0.0 && navs[0] > 0.0 && navs[n_days - 1] > 0.0 {
        (navs[n_days - 1] / navs[0]).powf(1.0 / years) - 1.0
    } else {
        0.0
    };

    let ann_sqrt = (days_per_year as f64).sqrt();
    let annual_vol = sample_std(&daily_returns).map_or(0.0, |s| s * ann_sqrt);

    let (max_dd, max_dd_duration) = max_drawdown(&navs);

    let sharpe = if annual_vol > MIN_DENOM {
        cagr / annual_vol
    } else {
        0.0
    };

    let downside: Vec<f64> = daily_returns.iter().copied().filter(|&r| r < 0.0).collect();
    let sortino = if downside.len() > 1 {
        let downside_vol = sample_std(&downside).map_or(0.0, |s| s * ann_sqrt);
        if downside_vol > MIN_DENOM {
            cagr / downside_vol
        } else {
            0.0
        }
    } else {
        0.0
    };

    let calmar = if max_dd.abs() > MIN_DENOM {
        cagr / max_dd.abs()
    } else {
        0.0
    };

    let win_rate = daily_returns.iter().filter(|&&r| r > 0.0).count() as f64
        / daily_returns.len() as f64;

    let (alpha, beta, information_ratio, tracking_error) = match benchmark_nav {
        Some(bm) if bm.len() >= 2 => relative_metrics(&daily_returns, bm, days_per_year),
        _ => (0.0, 0.0, 0.0, 0.0),
    };

    PerformanceMetrics {
        total_return,
        cagr,
        annual_volatility: annual_vol,
        max_drawdown: max_dd,
        max_dd_duration,
        sharpe_ratio: sharpe,
        sortino_ratio: sortino,
        calmar_ratio: calmar,
        alpha,
        beta,
        information_ratio,
        tracking_error,
        annual_turnover,
        total_costs,
        win_rate,
        n_days,
        n_trades,
    }
}

/// Maximum drawdown (negative) and its duration in days since the peak.
fn max_drawdown(navs: &[f64]) -> (f64, usize) {
    let mut peak = navs[0];
    let mut max_dd = 0.0;
    let mut max_dd_duration = 0;
    let mut current_dd_start = 0;

    for (i, &nav) in navs.iter().enumerate() {
        if nav >= peak {
            peak = nav;
            current_dd_start = i;
        } else {
            let dd = (nav - peak) / peak;
            if dd < max_dd {
                max_dd = dd;
                max_dd_duration = i - current_dd_start;
            }
        }
    }
    (max_dd, max_dd_duration)
}

/// Alpha, beta, information ratio and tracking error versus a benchmark,
/// on daily returns truncated to the common length.
fn relative_metrics(
    strategy_returns: &[f64],
    benchmark_nav: &[(Date, f64)],
    days_per_year: usize,
) -> (f64, f64, f64, f64) {
    let bm_navs: Vec<f64> = benchmark_nav.iter().map(|&(_, nav)| nav).collect();
    if bm_navs.len() < 2 {
        return (0.0, 0.0, 0.0, 0.0);
    }
    let bm_returns: Vec<f64> = bm_navs.windows(2).map(|w| w[1] / w[0] - 1.0).collect();

    let len = strategy_returns.len().min(bm_returns.len());
    let sr = &strategy_returns[..len];
    let br = &bm_returns[..len];
    if len < 2 {
        return (0.0, 0.0, 0.0, 0.0);
    }

    // Sample covariance for beta
    let mean_sr = mean(sr).unwrap_or(0.0);
    let mean_br = mean(br).unwrap_or(0.0);
    let mut cov = 0.0;
    let mut var_bm = 0.0;
    for i in 0..len {
        cov += (sr[i] - mean_sr) * (br[i] - mean_br);
        var_bm += (br[i] - mean_br).powi(2);
    }
    cov /= (len - 1) as f64;
    var_bm /= (len - 1) as f64;

    let beta = if var_bm > MIN_DENOM { cov / var_bm } else { 0.0 };

    let ann = days_per_year as f64;
    let alpha = mean_sr * ann - beta * mean_br * ann;

    let active: Vec<f64> = sr.iter().zip(br).map(|(s, b)| s - b).collect();
    let te = sample_std(&active).map_or(0.0, |s| s * ann.sqrt());
    let ir = if te > MIN_DENOM {
        mean(&active).unwrap_or(0.0) * ann / te
    } else {
        0.0
    };

    (alpha, beta, ir, te)
}

fn empty_metrics(
    total_costs: f64,
    n_trades: usize,
    annual_turnover: f64,
    n_days: usize,
) -> PerformanceMetrics {
    PerformanceMetrics {
        total_return: 0.0,
        cagr: 0.0,
        annual_volatility: 0.0,
        max_drawdown: 0.0,
        max_dd_duration: 0,
        sharpe_ratio: 0.0,
        sortino_ratio: 0.0,
        calmar_ratio: 0.0,
        alpha: 0.0,
        beta: 0.0,
        information_ratio: 0.0,
        tracking_error: 0.0,
        annual_turnover,
        total_costs,
        win_rate: 0.0,
        n_days,
        n_trades,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn nav_series(navs: &[f64]) -> Vec<(Date, f64)> {
        let start: Date = "2024-01-01".parse().unwrap();
        navs.iter()
            .enumerate()
            .map(|(i, &nav)| (start + chrono::Days::new(i as u64), nav))
            .collect()
    }

    #[test]
    fn test_flat_nav_all_zero() {
        let m = compute_metrics(&nav_series(&[100.0; 50]), None, 0.0, 0, 0.0, 252);
        assert_relative_eq!(m.total_return, 0.0);
        assert_relative_eq!(m.cagr, 0.0);
        assert_relative_eq!(m.max_drawdown, 0.0);
        assert_relative_eq!(m.sharpe_ratio, 0.0);
        assert_relative_eq!(m.win_rate, 0.0);
        assert_eq!(m.n_days, 50);
    }

    #[test]
    fn test_total_return_and_cagr() {
        // Exactly one year of trading days doubling NAV
        let navs: Vec<f64> = (0..252).map(|i| 100.0 * 2f64.powf(i as f64 / 251.0)).collect();
        let m = compute_metrics(&nav_series(&navs), None, 0.0, 0, 0.0, 252);
        assert_relative_eq!(m.total_return, 1.0, epsilon = 1e-9);
        assert_relative_eq!(m.cagr, 1.0, epsilon = 0.01);
        assert!(m.sharpe_ratio > 0.0);
    }

    #[test]
    fn test_max_drawdown_depth_and_duration() {
        let navs = [100.0, 110.0, 120.0, 90.0, 95.0, 125.0];
        let m = compute_metrics(&nav_series(&navs), None, 0.0, 0, 0.0, 252);
        // Peak 120 at index 2, trough 90 at index 3
        assert_relative_eq!(m.max_drawdown, -0.25, epsilon = 1e-10);
        assert_eq!(m.max_dd_duration, 1);
    }

    #[test]
    fn test_drawdown_negative_sign() {
        let navs = [100.0, 80.0, 100.0];
        let m = compute_metrics(&nav_series(&navs), None, 0.0, 0, 0.0, 252);
        assert!(m.max_drawdown < 0.0);
        assert!(m.calmar_ratio.is_finite());
    }

    #[test]
    fn test_under_two_points_zero_metrics() {
        let m = compute_metrics(&nav_series(&[100.0]), None, 12.5, 3, 0.4, 252);
        assert_relative_eq!(m.total_return, 0.0);
        assert_relative_eq!(m.total_costs, 12.5);
        assert_eq!(m.n_trades, 3);
        assert_relative_eq!(m.annual_turnover, 0.4);
        assert_eq!(m.n_days, 1);

        let m = compute_metrics(&[], None, 0.0, 0, 0.0, 252);
        assert_eq!(m.n_days, 0);
    }

    #[test]
    fn test_beta_one_against_itself() {
        let navs: Vec<f64> = (0..100)
            .map(|i| 100.0 * (1.0 + 0.001 * (i as f64 * 0.7).sin()).powi(i))
            .collect();
        let series = nav_series(&navs);
        let m = compute_metrics(&series, Some(&series), 0.0, 0, 0.0, 252);
        assert_relative_eq!(m.beta, 1.0, epsilon = 1e-9);
        assert_relative_eq!(m.tracking_error, 0.0, epsilon = 1e-12);
        // Zero TE guards the information ratio to zero
        assert_relative_eq!(m.information_ratio, 0.0);
        assert_relative_eq!(m.alpha, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_benchmark_absent_relative_metrics_zero() {
        let navs: Vec<f64> = (0..50).map(|i| 100.0 + i as f64).collect();
        let m = compute_metrics(&nav_series(&navs), None, 0.0, 0, 0.0, 252);
        assert_relative_eq!(m.alpha, 0.0);
        assert_relative_eq!(m.beta, 0.0);
        assert_relative_eq!(m.information_ratio, 0.0);
        assert_relative_eq!(m.tracking_error, 0.0);
    }

    #[test]
    fn test_win_rate() {
        let navs = [100.0, 101.0, 100.5, 101.5, 102.0];
        let m = compute_metrics(&nav_series(&navs), None, 0.0, 0, 0.0, 252);
        assert_relative_eq!(m.win_rate, 0.75);
    }

    #[test]
    fn test_no_nan_or_inf_anywhere() {
        let cases: Vec<Vec<f64>> = vec![
            vec![100.0; 10],
            vec![100.0, 100.0, 50.0, 50.0],
            (0..30).map(|i| 100.0 * 1.01f64.powi(i)).collect(),
        ];
        for navs in cases {
            let m = compute_metrics(&nav_series(&navs), None, 0.0, 0, 0.0, 365);
            for v in [
                m.total_return,
                m.cagr,
                m.annual_volatility,
                m.max_drawdown,
                m.sharpe_ratio,
                m.sortino_ratio,
                m.calmar_ratio,
                m.alpha,
                m.beta,
                m.information_ratio,
                m.tracking_error,
                m.win_rate,
            ] {
                assert!(v.is_finite());
            }
        }
    }
}
