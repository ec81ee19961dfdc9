#![doc(issue_tracker_base_url = "https://github.com/factordynamics/levanter/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Cross-sectional momentum backtesting and factor research.
//!
//! Levanter is a workspace of focused crates re-exported here:
//!
//! - [`traits`] — core types, market dialects, the `Factor` trait, array
//!   statistics.
//! - [`data`] — the market data adapter (load once, slice point-in-time).
//! - [`signals`] — the two cross-sectional scoring methods and the factor
//!   registry.
//! - [`backtest`] — portfolio, rebalancer, engine, performance metrics,
//!   parameter sweep and walk-forward optimizer.
//! - [`study`] — IC analysis and event studies.
//! - [`fundamentals`] — derived quarterly metrics and screening.

/// The version of the levanter crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use levanter_backtest as backtest;
pub use levanter_data as data;
pub use levanter_fundamentals as fundamentals;
pub use levanter_signals as signals;
pub use levanter_study as study;
pub use levanter_traits as traits;

// Convenience re-exports of the types most callers start from
pub use levanter_backtest::{BacktestConfig, BacktestEngine, Market, ParameterSweep};
pub use levanter_data::MarketData;
pub use levanter_study::{FactorStudyConfig, FactorStudyRunner};
pub use levanter_traits::{Date, LevanterError, MarketDialect, Result, ScoreMethod, Symbol};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        assert!(VERSION.contains('.'));
    }
}
