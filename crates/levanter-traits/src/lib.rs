#![doc(issue_tracker_base_url = "https://github.com/factordynamics/levanter/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core type and trait definitions for the Levanter research framework.
//!
//! This crate provides the foundational abstractions shared by the data
//! adapter, the cross-sectional scoring functions, the backtest engine and
//! the factor-study tooling: price series, universes, rankings, market
//! dialects, the `Factor` trait, the error type, and the array statistics
//! the rest of the workspace is built on.

/// The version of the levanter-traits crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Module declarations
pub mod dialect;
pub mod error;
pub mod factor;
pub mod stats;
pub mod types;

// Re-exports
pub use dialect::{MarketDialect, ScoreMethod};
pub use error::{LevanterError, Result};
pub use factor::{Factor, FactorMeta};
pub use types::{Date, PriceBar, PriceSeries, RankedSymbol, Ranking, Symbol, Universe};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        assert!(VERSION.contains('.'));
    }
}
