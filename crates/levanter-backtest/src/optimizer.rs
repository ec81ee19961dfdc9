//! Parameter selection resistant to overfitting.
//!
//! Two layers:
//! 1. **Robustness scoring** — a candidate is only as good as its
//!    parameter-space neighborhood. Candidates are re-ranked by the
//!    harmonic mean of their own metric and their neighbors' average.
//! 2. **Walk-Forward** — parameters are fitted on a training window and
//!    evaluated on the immediately following disjoint window, rolling
//!    forward through the data.

use chrono::{Days, Months};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use levanter_data::MarketData;
use levanter_traits::{Date, ScoreMethod};

use crate::config::{BacktestConfig, Market, RebalanceFreq, SweepGrid};
use crate::engine::BacktestEngine;
use crate::metrics::PerformanceMetrics;
use crate::sweep::{ParameterSweep, SweepRow};

/// Metric accessor used to order sweep rows.
pub type MetricFn = fn(&PerformanceMetrics) -> f64;

/// The default optimization target.
#[must_use]
pub fn sharpe_metric(m: &PerformanceMetrics) -> f64 {
    m.sharpe_ratio
}

/// Candidates examined per robustness pass.
const TOP_K: usize = 10;

/// A sweep row with its robustness score attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobustRow {
    /// The underlying sweep row.
    pub row: SweepRow,
    /// Harmonic mean of the candidate metric and its neighborhood average.
    pub robustness_score: f64,
    /// Number of parameter-space neighbors found in the table.
    pub neighbor_count: usize,
}

/// The swept parameter dimensions of one configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChosenParams {
    /// Scoring method.
    pub score_method: ScoreMethod,
    /// Portfolio width.
    pub top_n: usize,
    /// Rebalance frequency.
    pub rebalance_freq: RebalanceFreq,
    /// Hysteresis buffer.
    pub sell_buffer: usize,
}

impl From<&BacktestConfig> for ChosenParams {
    fn from(config: &BacktestConfig) -> Self {
        Self {
            score_method: config.score_method,
            top_n: config.top_n,
            rebalance_freq: config.rebalance_freq,
            sell_buffer: config.sell_buffer,
        }
    }
}

/// One walk-forward round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalkForwardRound {
    /// 1-based round number.
    pub round_num: usize,
    /// Training window start (inclusive).
    pub train_start: Date,
    /// Training window end (inclusive).
    pub train_end: Date,
    /// Test window start (inclusive).
    pub test_start: Date,
    /// Test window end (inclusive).
    pub test_end: Date,
    /// Label of the winning configuration.
    pub best_label: String,
    /// The winning parameters.
    pub best_params: ChosenParams,
    /// Sharpe on the training window.
    pub in_sample_sharpe: f64,
    /// CAGR on the training window.
    pub in_sample_cagr: f64,
    /// Sharpe on the test window.
    pub out_sample_sharpe: f64,
    /// CAGR on the test window.
    pub out_sample_cagr: f64,
    /// Max drawdown on the test window.
    pub out_sample_max_drawdown: f64,
}

/// Walk-forward summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalkForwardResult {
    /// All completed rounds.
    pub rounds: Vec<WalkForwardRound>,
    /// Mean in-sample Sharpe across rounds.
    pub avg_in_sample_sharpe: f64,
    /// Mean out-of-sample Sharpe across rounds.
    pub avg_out_sample_sharpe: f64,
    /// Mean out-of-sample CAGR across rounds.
    pub avg_out_sample_cagr: f64,
    /// `1 − mean_OS / mean_IS`; closer to zero is better.
    pub overfit_ratio: f64,
    /// Agreement of chosen parameters across rounds, in `[0, 1]`.
    pub param_consistency: f64,
    /// Per-dimension mode of the winning parameters.
    pub recommended: Option<BacktestConfig>,
}

impl WalkForwardResult {
    fn empty() -> Self {
        Self {
            rounds: Vec::new(),
            avg_in_sample_sharpe: 0.0,
            avg_out_sample_sharpe: 0.0,
            avg_out_sample_cagr: 0.0,
            overfit_ratio: 1.0,
            param_consistency: 0.0,
            recommended: None,
        }
    }
}

/// Robustness scorer and walk-forward driver.
#[derive(Debug, Clone)]
pub struct ParamOptimizer {
    market: Market,
    grid: SweepGrid,
}

impl ParamOptimizer {
    /// Creates an optimizer with the market's default grid. The grid's
    /// per-dimension ordering defines parameter-space adjacency.
    #[must_use]
    pub fn new(market: Market) -> Self {
        Self {
            market,
            grid: SweepGrid::default_for(market),
        }
    }

    /// Replaces the grid (and with it the neighbor definition).
    #[must_use]
    pub fn with_grid(mut self, grid: SweepGrid) -> Self {
        self.grid = grid;
        self
    }

    /// Re-ranks the top `top_k` rows of a sweep by robustness.
    ///
    /// A neighbor differs in exactly one dimension by one ordinal step in
    /// the grid's ordered list for that dimension. The robustness score is
    /// the harmonic mean of the candidate metric and the neighborhood
    /// average when both are positive, else the candidate value.
    #[must_use]
    pub fn rank_with_robustness(
        &self,
        rows: &[SweepRow],
        metric: MetricFn,
        top_k: usize,
    ) -> Vec<RobustRow> {
        let mut sorted: Vec<&SweepRow> = rows.iter().collect();
        sorted.sort_by(|a, b| {
            metric(&b.metrics)
                .partial_cmp(&metric(&a.metrics))
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut robust: Vec<RobustRow> = sorted
            .iter()
            .take(top_k)
            .map(|&row| {
                let candidate = metric(&row.metrics);
                let neighbors = self.neighbor_values(row, rows, metric);
                let score = match neighbors.is_empty() {
                    true => candidate,
                    false => {
                        let avg = neighbors.iter().sum::<f64>() / neighbors.len() as f64;
                        if candidate > 0.0 && avg > 0.0 {
                            2.0 * candidate * avg / (candidate + avg)
                        } else {
                            0.0
                        }
                    }
                };
                RobustRow {
                    row: row.clone(),
                    robustness_score: score,
                    neighbor_count: neighbors.len(),
                }
            })
            .collect();

        robust.sort_by(|a, b| {
            b.robustness_score
                .partial_cmp(&a.robustness_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        robust
    }

    /// Metric values of the rows adjacent to `row` in parameter space.
    fn neighbor_values(&self, row: &SweepRow, all: &[SweepRow], metric: MetricFn) -> Vec<f64> {
        let params = ChosenParams::from(&row.config);
        let mut values = Vec::new();

        let mut probe = |candidate: ChosenParams| {
            if let Some(found) = all
                .iter()
                .find(|r| ChosenParams::from(&r.config) == candidate)
            {
                values.push(metric(&found.metrics));
            }
        };

        for method in adjacent(&self.grid.methods, &params.score_method) {
            probe(ChosenParams {
                score_method: method,
                ..params
            });
        }
        for top_n in adjacent(&self.grid.top_n, &params.top_n) {
            probe(ChosenParams { top_n, ..params });
        }
        for freq in adjacent(&self.grid.freqs, &params.rebalance_freq) {
            probe(ChosenParams {
                rebalance_freq: freq,
                ..params
            });
        }
        for buffer in adjacent(&self.grid.buffers, &params.sell_buffer) {
            probe(ChosenParams {
                sell_buffer: buffer,
                ..params
            });
        }
        values
    }

    /// Rolls train/test windows through the data range, sweeping each
    /// training window, picking the most robust candidate and re-running
    /// it out-of-sample.
    #[must_use]
    pub fn walk_forward(
        &self,
        data: &MarketData,
        train_months: u32,
        test_months: u32,
        step_months: u32,
    ) -> WalkForwardResult {
        let Some((data_start, data_end)) = data.date_range() else {
            warn!("no data available for walk-forward");
            return WalkForwardResult::empty();
        };

        let mut rounds: Vec<WalkForwardRound> = Vec::new();
        let mut round_num = 0;
        let mut window_start = data_start;

        loop {
            let train_end = window_start + Months::new(train_months) - Days::new(1);
            let test_start = train_end + Days::new(1);
            let test_end = test_start + Months::new(test_months) - Days::new(1);
            if test_end > data_end {
                break;
            }
            round_num += 1;
            info!(
                round = round_num,
                train = %format!("{window_start} → {train_end}"),
                test = %format!("{test_start} → {test_end}"),
                "walk-forward round"
            );

            let sweep = ParameterSweep::new(self.market).with_grid(self.grid.clone());
            let train_rows = sweep.run(data, Some(window_start), Some(train_end));
            if train_rows.is_empty() {
                warn!(round = round_num, "training sweep produced no rows, skipping");
                window_start = window_start + Months::new(step_months);
                continue;
            }

            let robust = self.rank_with_robustness(&train_rows, sharpe_metric, TOP_K);
            let best = &robust[0];
            let best_params = ChosenParams::from(&best.row.config);

            let test_config = BacktestConfig {
                score_method: best_params.score_method,
                top_n: best_params.top_n,
                rebalance_freq: best_params.rebalance_freq,
                sell_buffer: best_params.sell_buffer,
                start_date: Some(test_start),
                end_date: Some(test_end),
                ..BacktestConfig::preset(self.market)
            };
            let Ok(mut test_engine) = BacktestEngine::new(test_config.clone(), data) else {
                window_start = window_start + Months::new(step_months);
                continue;
            };
            let test_metrics = test_engine.run();

            rounds.push(WalkForwardRound {
                round_num,
                train_start: window_start,
                train_end,
                test_start,
                test_end,
                best_label: test_config.label(),
                best_params,
                in_sample_sharpe: best.row.metrics.sharpe_ratio,
                in_sample_cagr: best.row.metrics.cagr,
                out_sample_sharpe: test_metrics.sharpe_ratio,
                out_sample_cagr: test_metrics.cagr,
                out_sample_max_drawdown: test_metrics.max_drawdown,
            });

            window_start = window_start + Months::new(step_months);
        }

        self.summarize(rounds)
    }

    fn summarize(&self, rounds: Vec<WalkForwardRound>) -> WalkForwardResult {
        if rounds.is_empty() {
            return WalkForwardResult::empty();
        }
        let n = rounds.len() as f64;
        let avg_in = rounds.iter().map(|r| r.in_sample_sharpe).sum::<f64>() / n;
        let avg_out = rounds.iter().map(|r| r.out_sample_sharpe).sum::<f64>() / n;
        let avg_out_cagr = rounds.iter().map(|r| r.out_sample_cagr).sum::<f64>() / n;

        let overfit_ratio = if avg_in > 0.0 {
            1.0 - avg_out / avg_in
        } else {
            1.0
        };

        let param_consistency = Self::param_consistency(&rounds);
        let recommended = self.recommend(&rounds);

        WalkForwardResult {
            rounds,
            avg_in_sample_sharpe: avg_in,
            avg_out_sample_sharpe: avg_out,
            avg_out_sample_cagr: avg_out_cagr,
            overfit_ratio,
            param_consistency,
            recommended: Some(recommended),
        }
    }

    /// Sum of per-dimension mode counts over the total choice count.
    fn param_consistency(rounds: &[WalkForwardRound]) -> f64 {
        if rounds.len() <= 1 {
            return 1.0;
        }
        let methods: Vec<_> = rounds.iter().map(|r| r.best_params.score_method).collect();
        let top_ns: Vec<_> = rounds.iter().map(|r| r.best_params.top_n).collect();
        let freqs: Vec<_> = rounds.iter().map(|r| r.best_params.rebalance_freq).collect();
        let buffers: Vec<_> = rounds.iter().map(|r| r.best_params.sell_buffer).collect();

        let match_count = mode_count(&methods) + mode_count(&top_ns)
            + mode_count(&freqs)
            + mode_count(&buffers);
        let total_count = 4 * rounds.len();
        match_count as f64 / total_count as f64
    }

    /// The per-dimension most common winning parameters, as a config.
    fn recommend(&self, rounds: &[WalkForwardRound]) -> BacktestConfig {
        let methods: Vec<_> = rounds.iter().map(|r| r.best_params.score_method).collect();
        let top_ns: Vec<_> = rounds.iter().map(|r| r.best_params.top_n).collect();
        let freqs: Vec<_> = rounds.iter().map(|r| r.best_params.rebalance_freq).collect();
        let buffers: Vec<_> = rounds.iter().map(|r| r.best_params.sell_buffer).collect();

        let mut config = BacktestConfig::preset(self.market);
        if let Some(m) = mode(&methods) {
            config.score_method = m;
        }
        if let Some(n) = mode(&top_ns) {
            config.top_n = n;
        }
        if let Some(f) = mode(&freqs) {
            config.rebalance_freq = f;
        }
        if let Some(b) = mode(&buffers) {
            config.sell_buffer = b;
        }
        config
    }
}

/// Values one ordinal step away from `current` in an ordered list.
fn adjacent<T: Clone + PartialEq>(ordered: &[T], current: &T) -> Vec<T> {
    let Some(idx) = ordered.iter().position(|v| v == current) else {
        return Vec::new();
    };
    let mut out = Vec::new();
    if idx > 0 {
        out.push(ordered[idx - 1].clone());
    }
    if idx + 1 < ordered.len() {
        out.push(ordered[idx + 1].clone());
    }
    out
}

/// Most common value, first-seen wins ties.
fn mode<T: Clone + PartialEq>(values: &[T]) -> Option<T> {
    let mut best: Option<(usize, &T)> = None;
    for v in values {
        let count = values.iter().filter(|x| *x == v).count();
        if best.is_none_or(|(c, _)| count > c) {
            best = Some((count, v));
        }
    }
    best.map(|(_, v)| v.clone())
}

/// Occurrences of the most common value.
fn mode_count<T: PartialEq>(values: &[T]) -> usize {
    values
        .iter()
        .map(|v| values.iter().filter(|x| *x == v).count())
        .max()
        .unwrap_or(0)
}
