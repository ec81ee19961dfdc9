#![doc(issue_tracker_base_url = "https://github.com/factordynamics/levanter/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Market data adapter for the Levanter research framework.
//!
//! [`MarketData`] loads per-symbol price series once per run and then
//! serves the rest of the workspace read-only: trading-date union,
//! point-in-time universe slices (the single no-look-ahead gate), exact-bar
//! price lookups and benchmark series.

/// The version of the levanter-data crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod adapter;

pub use adapter::MarketData;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
