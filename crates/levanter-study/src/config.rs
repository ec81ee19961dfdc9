//! Factor study configuration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use levanter_traits::{Date, LevanterError, Result};

/// How often factor scores are computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComputationFreq {
    /// Every trading day.
    Daily,
    /// Every 5th trading day.
    Weekly,
}

impl ComputationFreq {
    /// Stride over the trading-date sequence.
    #[must_use]
    pub const fn stride(&self) -> usize {
        match self {
            Self::Daily => 1,
            Self::Weekly => 5,
        }
    }
}

impl fmt::Display for ComputationFreq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Daily => f.write_str("D"),
            Self::Weekly => f.write_str("W"),
        }
    }
}

impl FromStr for ComputationFreq {
    type Err = LevanterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "D" => Ok(Self::Daily),
            "W" => Ok(Self::Weekly),
            other => Err(LevanterError::InvalidConfig(format!(
                "unknown computation frequency {other:?} (expected D or W)"
            ))),
        }
    }
}

/// Configuration for one factor study run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorStudyConfig {
    /// Score computation frequency.
    pub computation_freq: ComputationFreq,
    /// Forward-return horizons in trading days.
    pub forward_horizons: Vec<usize>,
    /// Number of quantile buckets for the IC track.
    pub n_quantiles: usize,
    /// Inclusive start of the study window.
    pub start_date: Option<Date>,
    /// Inclusive end of the study window.
    pub end_date: Option<Date>,
}

impl FactorStudyConfig {
    /// Equity preset: weekly computation, 5/10/20/40/60-day horizons.
    #[must_use]
    pub fn equities_preset() -> Self {
        Self {
            computation_freq: ComputationFreq::Weekly,
            forward_horizons: vec![5, 10, 20, 40, 60],
            n_quantiles: 5,
            start_date: None,
            end_date: None,
        }
    }

    /// Perpetuals preset: daily computation, 1/3/5/7/14-day horizons.
    #[must_use]
    pub fn perpetuals_preset() -> Self {
        Self {
            computation_freq: ComputationFreq::Daily,
            forward_horizons: vec![1, 3, 5, 7, 14],
            n_quantiles: 5,
            start_date: None,
            end_date: None,
        }
    }

    /// Rejects contradictory configurations.
    ///
    /// # Errors
    ///
    /// Returns [`LevanterError::InvalidConfig`] on fewer than two
    /// quantiles, an empty or zero-valued horizon list, or inverted dates.
    pub fn validate(&self) -> Result<()> {
        if self.n_quantiles < 2 {
            return Err(LevanterError::InvalidConfig(
                "n_quantiles must be at least 2".into(),
            ));
        }
        if self.forward_horizons.is_empty() || self.forward_horizons.contains(&0) {
            return Err(LevanterError::InvalidConfig(
                "forward_horizons must be non-empty positive integers".into(),
            ));
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err(LevanterError::InvalidConfig(format!(
                    "start_date {start} > end_date {end}"
                )));
            }
        }
        Ok(())
    }
}

impl Default for FactorStudyConfig {
    fn default() -> Self {
        Self::equities_preset()
    }
}
