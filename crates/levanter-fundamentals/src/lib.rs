#![doc(issue_tracker_base_url = "https://github.com/factordynamics/levanter/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Derived fundamental metrics for the Levanter research framework.
//!
//! A deterministic calculator turning raw quarterly statements into ~40
//! per-quarter metrics (margins, TTM returns, leverage, efficiency,
//! YoY/QoQ growth, trailing-4Q CAGR and deltas), designed for screening
//! queries like "net margin above 25% for 4 consecutive quarters".
//!
//! Missing inputs yield absent outputs, never zero: every derived field is
//! an `Option<f64>`.

/// The version of the levanter-fundamentals crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod calculator;
pub mod screen;
pub mod statements;

pub use calculator::{compute_metrics, MetricRow};
pub use screen::{ConsecutiveThreshold, Screen};
pub use statements::{BalanceRow, CashFlowRow, IncomeRow};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
