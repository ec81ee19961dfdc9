//! Parameter sweep over the grid.
//!
//! Data is loaded once; every combination shares the same read-only
//! adapter and owns its portfolio, which is what makes the sweep
//! embarrassingly parallel. With the `parallel` feature the outer loop
//! fans out over a rayon pool; results are merged and sorted at the end.

use serde::{Deserialize, Serialize};
use tracing::info;

use levanter_data::MarketData;

use crate::config::{BacktestConfig, Market, SweepGrid};
use crate::engine::BacktestEngine;
use crate::metrics::PerformanceMetrics;

/// One sweep result row: the parameters and their metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepRow {
    /// The full configuration backtested.
    pub config: BacktestConfig,
    /// Readable parameter label.
    pub label: String,
    /// The run's metrics.
    pub metrics: PerformanceMetrics,
}

/// Grid sweep driver.
#[derive(Debug, Clone)]
pub struct ParameterSweep {
    market: Market,
    grid: SweepGrid,
}

impl ParameterSweep {
    /// Creates a sweep with the market's default grid.
    #[must_use]
    pub fn new(market: Market) -> Self {
        Self {
            market,
            grid: SweepGrid::default_for(market),
        }
    }

    /// Replaces the grid.
    #[must_use]
    pub fn with_grid(mut self, grid: SweepGrid) -> Self {
        self.grid = grid;
        self
    }

    /// The grid in use.
    #[must_use]
    pub const fn grid(&self) -> &SweepGrid {
        &self.grid
    }

    /// Total combinations the sweep will run.
    #[must_use]
    pub fn total_combinations(&self) -> usize {
        self.grid.total_combinations()
    }

    /// Runs every combination over the shared adapter, optionally bounded
    /// to a date window. Rows come back sorted by Sharpe descending.
    #[must_use]
    pub fn run(
        &self,
        data: &MarketData,
        start_date: Option<levanter_traits::Date>,
        end_date: Option<levanter_traits::Date>,
    ) -> Vec<SweepRow> {
        let combos = self.grid.combinations();
        info!(
            combinations = combos.len(),
            market = %self.market,
            "parameter sweep started"
        );

        let run_one = |&(method, top_n, freq, buffer): &(_, _, _, _)| {
            let config = BacktestConfig {
                score_method: method,
                top_n,
                rebalance_freq: freq,
                sell_buffer: buffer,
                start_date,
                end_date,
                ..BacktestConfig::preset(self.market)
            };
            let label = config.label();
            let metrics = match BacktestEngine::new(config.clone(), data) {
                Ok(mut engine) => engine.run(),
                Err(_) => return None,
            };
            Some(SweepRow {
                config,
                label,
                metrics,
            })
        };

        #[cfg(feature = "parallel")]
        let mut rows: Vec<SweepRow> = {
            use rayon::prelude::*;
            combos.par_iter().filter_map(run_one).collect()
        };
        #[cfg(not(feature = "parallel"))]
        let mut rows: Vec<SweepRow> = combos.iter().filter_map(run_one).collect();

        rows.sort_by(|a, b| {
            b.metrics
                .sharpe_ratio
                .partial_cmp(&a.metrics.sharpe_ratio)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        rows
    }
}
