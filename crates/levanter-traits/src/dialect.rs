//! Market dialects.
//!
//! The equity and perpetual-futures markets share every algorithm in the
//! workspace and differ only in a handful of constants: minimum history,
//! annualization factor, scoring windows and composite weights. Those
//! constants are carried by a [`MarketDialect`] value selected at adapter
//! construction, which keeps the scoring functions dialect-agnostic.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Cross-sectional scoring algorithm selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScoreMethod {
    /// Risk-adjusted cross-sectional z-score momentum.
    B,
    /// Clenow regression momentum (slope × r², annualized).
    C,
}

impl fmt::Display for ScoreMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::B => f.write_str("B"),
            Self::C => f.write_str("C"),
        }
    }
}

impl std::str::FromStr for ScoreMethod {
    type Err = crate::error::LevanterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "B" => Ok(Self::B),
            "C" => Ok(Self::C),
            other => Err(crate::error::LevanterError::InvalidConfig(format!(
                "unknown score method {other:?} (expected B or C)"
            ))),
        }
    }
}

/// Constants that vary between market dialects.
///
/// Immutable once constructed; the adapter owns one for the lifetime of a
/// run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketDialect {
    /// Minimum bars a symbol needs to be scored at all.
    pub min_days: usize,
    /// Trading periods per year (252 equities, 365 perpetuals).
    pub annualization: usize,
    /// Long scoring window in bars.
    pub window_long: usize,
    /// Mid scoring window in bars.
    pub window_mid: usize,
    /// Short scoring window in bars.
    pub window_short: usize,
    /// Bars skipped at the end of the series before measuring returns.
    pub skip_days: usize,
    /// Composite weights for method B (long, mid, short).
    pub weights_zscore: [f64; 3],
    /// Composite weights for method C (long, mid, short).
    pub weights_clenow: [f64; 3],
}

impl MarketDialect {
    /// Equity dialect: 70-bar minimum, 252 trading days per year,
    /// 63/21/5-day windows.
    #[must_use]
    pub const fn equities() -> Self {
        Self {
            min_days: 70,
            annualization: 252,
            window_long: 63,
            window_mid: 21,
            window_short: 5,
            skip_days: 1,
            weights_zscore: [0.40, 0.35, 0.25],
            weights_clenow: [0.50, 0.30, 0.20],
        }
    }

    /// Perpetual-futures dialect: 15-bar minimum, 365 calendar days per
    /// year, 7/3/1-day windows.
    #[must_use]
    pub const fn perpetuals() -> Self {
        Self {
            min_days: 15,
            annualization: 365,
            window_long: 7,
            window_mid: 3,
            window_short: 1,
            skip_days: 1,
            weights_zscore: [0.40, 0.35, 0.25],
            weights_clenow: [0.50, 0.30, 0.20],
        }
    }

    /// Scoring windows as (long, mid, short).
    #[must_use]
    pub const fn windows(&self) -> [usize; 3] {
        [self.window_long, self.window_mid, self.window_short]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equities_constants() {
        let d = MarketDialect::equities();
        assert_eq!(d.min_days, 70);
        assert_eq!(d.annualization, 252);
        assert_eq!(d.windows(), [63, 21, 5]);
    }

    #[test]
    fn test_perpetuals_constants() {
        let d = MarketDialect::perpetuals();
        assert_eq!(d.min_days, 15);
        assert_eq!(d.annualization, 365);
        assert_eq!(d.windows(), [7, 3, 1]);
    }

    #[test]
    fn test_weights_sum_to_one() {
        for d in [MarketDialect::equities(), MarketDialect::perpetuals()] {
            assert!((d.weights_zscore.iter().sum::<f64>() - 1.0).abs() < 1e-12);
            assert!((d.weights_clenow.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_score_method_display() {
        assert_eq!(ScoreMethod::B.to_string(), "B");
        assert_eq!(ScoreMethod::C.to_string(), "C");
    }
}
