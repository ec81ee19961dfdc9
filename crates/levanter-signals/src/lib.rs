#![doc(issue_tracker_base_url = "https://github.com/factordynamics/levanter/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Cross-sectional momentum scoring for the Levanter research framework.
//!
//! Two scoring methods are first-class:
//!
//! - **Method B** — risk-adjusted cross-sectional z-score momentum over
//!   long/mid/short windows.
//! - **Method C** — Clenow regression momentum (log-price slope × r²,
//!   annualized).
//!
//! Both emit a percentile-ranked [`Ranking`](levanter_traits::Ranking).
//! The [`factors`] module wraps them behind the
//! [`Factor`](levanter_traits::Factor) trait for the study tooling, and
//! [`registry`] maps factor names to constructors.

/// The version of the levanter-signals crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod factors;
pub mod rank;
pub mod registry;
pub mod score;

pub use factors::{ClenowMomentumFactor, MomentumZScoreFactor};
pub use rank::percentile_ranks;
pub use registry::FactorRegistry;
pub use score::{clenow_ranking, score_universe, zscore_ranking, ScoreFn};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
