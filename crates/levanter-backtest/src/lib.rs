#![doc(issue_tracker_base_url = "https://github.com/factordynamics/levanter/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Backtesting for the Levanter research framework.
//!
//! The [`engine::BacktestEngine`] drives a market-agnostic daily event
//! loop: re-score the sliced universe on rebalance dates, apply the
//! hysteresis rule, trade a fractional-share [`portfolio::Portfolio`] with
//! cost accounting, snapshot NAV, and report
//! [`metrics::PerformanceMetrics`]. [`sweep::ParameterSweep`] and
//! [`optimizer::ParamOptimizer`] build parameter search and walk-forward
//! validation on top of it.

/// The version of the levanter-backtest crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod config;
pub mod engine;
pub mod metrics;
pub mod optimizer;
pub mod portfolio;
pub mod rebalancer;
pub mod sweep;

pub use config::{BacktestConfig, Market, RebalanceFreq, SweepGrid, Weighting};
pub use engine::BacktestEngine;
pub use metrics::{compute_metrics, PerformanceMetrics};
pub use optimizer::{ParamOptimizer, WalkForwardResult, WalkForwardRound};
pub use portfolio::{Portfolio, Side, Snapshot, Trade};
pub use rebalancer::{RebalanceAction, Rebalancer};
pub use sweep::{ParameterSweep, SweepRow};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
