#![doc(issue_tracker_base_url = "https://github.com/factordynamics/levanter/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Factor study framework for the Levanter research framework.
//!
//! A dual-track evaluator of factor predictive power:
//!
//! - **Track 1 — IC analysis**: per-date Spearman rank correlation between
//!   factor scores and forward returns, aggregated per horizon, plus
//!   quantile-bucket mean returns and an IC decay curve.
//! - **Track 2 — event study**: discrete signal rules (threshold,
//!   cross-up, cross-down, sustained) detected on score histories, with
//!   forward returns at event dates tested against zero.
//!
//! Scores are computed on sliced universes (no look-ahead); forward-return
//! matrices come from full data, which is allowed because they feed
//! evaluation, never decisions.

/// The version of the levanter-study crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod config;
pub mod event;
pub mod forward;
pub mod ic;
pub mod runner;
pub mod signals;

pub use config::{ComputationFreq, FactorStudyConfig};
pub use event::{run_event_study, EventStudyResult};
pub use forward::{build_return_matrices, ForwardReturns};
pub use ic::{analyze_ic, ICDecayCurve, ICResult};
pub use runner::{FactorStudyReport, FactorStudyRunner, ScoreHistory};
pub use signals::{default_sweep, detect_signals, SignalDefinition, SignalKind};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
