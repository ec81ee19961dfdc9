//! Backtest configuration.
//!
//! A [`BacktestConfig`] fully determines one engine run over a shared
//! adapter. Contradictory settings are rejected at validation time — the
//! only fatal error in the workspace.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use levanter_traits::{Date, LevanterError, MarketDialect, Result, ScoreMethod, Symbol};

/// Market selector, mapping to a [`MarketDialect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Market {
    /// US-style equities: 252 trading days, 70-bar minimum.
    Equities,
    /// Perpetual futures: 365 calendar days, 15-bar minimum.
    Perpetuals,
}

impl Market {
    /// The dialect constants for this market.
    #[must_use]
    pub const fn dialect(&self) -> MarketDialect {
        match self {
            Self::Equities => MarketDialect::equities(),
            Self::Perpetuals => MarketDialect::perpetuals(),
        }
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equities => f.write_str("equities"),
            Self::Perpetuals => f.write_str("perpetuals"),
        }
    }
}

impl FromStr for Market {
    type Err = LevanterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "equities" => Ok(Self::Equities),
            "perpetuals" => Ok(Self::Perpetuals),
            other => Err(LevanterError::InvalidConfig(format!(
                "unknown market {other:?} (expected equities or perpetuals)"
            ))),
        }
    }
}

/// Target-weight scheme for the rebalancer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Weighting {
    /// `1 / target_count` per position.
    Equal,
    /// Rank-proportional, `max(rank, 1)` normalized.
    RankWeighted,
}

impl fmt::Display for Weighting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equal => f.write_str("equal"),
            Self::RankWeighted => f.write_str("rank_weighted"),
        }
    }
}

impl FromStr for Weighting {
    type Err = LevanterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "equal" => Ok(Self::Equal),
            "rank_weighted" => Ok(Self::RankWeighted),
            other => Err(LevanterError::InvalidConfig(format!(
                "unknown weighting {other:?} (expected equal or rank_weighted)"
            ))),
        }
    }
}

/// Rebalance frequency, a stride over the filtered trading-date sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RebalanceFreq {
    /// Every trading day.
    Daily,
    /// Every 3rd trading day.
    ThreeDay,
    /// Every 5th trading day.
    Weekly,
    /// Every 10th trading day.
    Biweekly,
    /// Every 21st trading day.
    Monthly,
}

impl RebalanceFreq {
    /// Stride in trading days.
    #[must_use]
    pub const fn stride(&self) -> usize {
        match self {
            Self::Daily => 1,
            Self::ThreeDay => 3,
            Self::Weekly => 5,
            Self::Biweekly => 10,
            Self::Monthly => 21,
        }
    }
}

impl fmt::Display for RebalanceFreq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Daily => f.write_str("D"),
            Self::ThreeDay => f.write_str("3D"),
            Self::Weekly => f.write_str("W"),
            Self::Biweekly => f.write_str("2W"),
            Self::Monthly => f.write_str("M"),
        }
    }
}

impl FromStr for RebalanceFreq {
    type Err = LevanterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "D" => Ok(Self::Daily),
            "3D" => Ok(Self::ThreeDay),
            "W" => Ok(Self::Weekly),
            "2W" => Ok(Self::Biweekly),
            "M" => Ok(Self::Monthly),
            other => Err(LevanterError::InvalidConfig(format!(
                "unknown rebalance frequency {other:?} (expected D, 3D, W, 2W or M)"
            ))),
        }
    }
}

/// Full parameter set for one backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    /// Market dialect selector.
    pub market: Market,
    /// Cross-sectional scoring method.
    pub score_method: ScoreMethod,
    /// Portfolio width.
    pub top_n: usize,
    /// Hysteresis width beyond `top_n` in which holdings are retained.
    pub sell_buffer: usize,
    /// Target-weight scheme.
    pub weighting: Weighting,
    /// Rebalance stride over trading dates.
    pub rebalance_freq: RebalanceFreq,
    /// Single-side transaction cost in basis points.
    pub transaction_cost_bps: f64,
    /// Starting cash.
    pub initial_capital: f64,
    /// Benchmark symbol for relative metrics, if any.
    pub benchmark_symbol: Option<Symbol>,
    /// Inclusive start of the backtest window.
    pub start_date: Option<Date>,
    /// Inclusive end of the backtest window.
    pub end_date: Option<Date>,
}

impl BacktestConfig {
    /// Equity preset: monthly rebalance, top 10, buffer 5, 5 bps, SPY
    /// benchmark.
    #[must_use]
    pub fn equities_preset() -> Self {
        Self {
            market: Market::Equities,
            score_method: ScoreMethod::B,
            top_n: 10,
            sell_buffer: 5,
            weighting: Weighting::Equal,
            rebalance_freq: RebalanceFreq::Monthly,
            transaction_cost_bps: 5.0,
            initial_capital: 1_000_000.0,
            benchmark_symbol: Some(Symbol::new("SPY")),
            start_date: None,
            end_date: None,
        }
    }

    /// Perpetuals preset: weekly rebalance, top 10, buffer 3, 4 bps,
    /// BTCUSDT benchmark.
    #[must_use]
    pub fn perpetuals_preset() -> Self {
        Self {
            market: Market::Perpetuals,
            score_method: ScoreMethod::B,
            top_n: 10,
            sell_buffer: 3,
            weighting: Weighting::Equal,
            rebalance_freq: RebalanceFreq::Weekly,
            transaction_cost_bps: 4.0,
            initial_capital: 1_000_000.0,
            benchmark_symbol: Some(Symbol::new("BTCUSDT")),
            start_date: None,
            end_date: None,
        }
    }

    /// Preset for a market.
    #[must_use]
    pub fn preset(market: Market) -> Self {
        match market {
            Market::Equities => Self::equities_preset(),
            Market::Perpetuals => Self::perpetuals_preset(),
        }
    }

    /// Single-side cost rate (`bps / 10_000`).
    #[must_use]
    pub fn cost_rate(&self) -> f64 {
        self.transaction_cost_bps / 10_000.0
    }

    /// Readable label for the parameter combination.
    #[must_use]
    pub fn label(&self) -> String {
        format!(
            "{}_{}_top{}_{}_buf{}",
            self.market, self.score_method, self.top_n, self.rebalance_freq, self.sell_buffer
        )
    }

    /// Rejects contradictory configurations.
    ///
    /// # Errors
    ///
    /// Returns [`LevanterError::InvalidConfig`] on `start_date > end_date`,
    /// zero `top_n`, non-positive capital or negative cost.
    pub fn validate(&self) -> Result<()> {
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err(LevanterError::InvalidConfig(format!(
                    "start_date {start} > end_date {end}"
                )));
            }
        }
        if self.top_n == 0 {
            return Err(LevanterError::InvalidConfig("top_n must be positive".into()));
        }
        if self.initial_capital <= 0.0 {
            return Err(LevanterError::InvalidConfig(
                "initial_capital must be positive".into(),
            ));
        }
        if self.transaction_cost_bps < 0.0 {
            return Err(LevanterError::InvalidConfig(
                "transaction_cost_bps must be non-negative".into(),
            ));
        }
        Ok(())
    }
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self::equities_preset()
    }
}

/// Ordered parameter lists for a sweep.
///
/// The per-dimension ordering doubles as the neighbor definition for
/// robustness scoring: adjacent entries are one ordinal step apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepGrid {
    /// Scoring methods to sweep.
    pub methods: Vec<ScoreMethod>,
    /// Portfolio widths to sweep, ascending.
    pub top_n: Vec<usize>,
    /// Rebalance frequencies to sweep, fastest first.
    pub freqs: Vec<RebalanceFreq>,
    /// Sell buffers to sweep, ascending.
    pub buffers: Vec<usize>,
}

impl SweepGrid {
    /// Default grid for a market.
    #[must_use]
    pub fn default_for(market: Market) -> Self {
        match market {
            Market::Equities => Self {
                methods: vec![ScoreMethod::B, ScoreMethod::C],
                top_n: vec![5, 10, 15, 20],
                freqs: vec![
                    RebalanceFreq::Weekly,
                    RebalanceFreq::Biweekly,
                    RebalanceFreq::Monthly,
                ],
                buffers: vec![0, 5, 10],
            },
            Market::Perpetuals => Self {
                methods: vec![ScoreMethod::B, ScoreMethod::C],
                top_n: vec![5, 10, 15, 20],
                freqs: vec![
                    RebalanceFreq::Daily,
                    RebalanceFreq::ThreeDay,
                    RebalanceFreq::Weekly,
                ],
                buffers: vec![0, 3, 5],
            },
        }
    }

    /// Total number of parameter combinations.
    #[must_use]
    pub fn total_combinations(&self) -> usize {
        self.methods.len() * self.top_n.len() * self.freqs.len() * self.buffers.len()
    }

    /// All combinations in grid order.
    #[must_use]
    pub fn combinations(&self) -> Vec<(ScoreMethod, usize, RebalanceFreq, usize)> {
        let mut combos = Vec::with_capacity(self.total_combinations());
        for &method in &self.methods {
            for &top_n in &self.top_n {
                for &freq in &self.freqs {
                    for &buffer in &self.buffers {
                        combos.push((method, top_n, freq, buffer));
                    }
                }
            }
        }
        combos
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Date {
        s.parse().unwrap()
    }

    #[test]
    fn test_freq_strides() {
        assert_eq!(RebalanceFreq::Daily.stride(), 1);
        assert_eq!(RebalanceFreq::ThreeDay.stride(), 3);
        assert_eq!(RebalanceFreq::Weekly.stride(), 5);
        assert_eq!(RebalanceFreq::Biweekly.stride(), 10);
        assert_eq!(RebalanceFreq::Monthly.stride(), 21);
    }

    #[test]
    fn test_freq_round_trip() {
        for freq in [
            RebalanceFreq::Daily,
            RebalanceFreq::ThreeDay,
            RebalanceFreq::Weekly,
            RebalanceFreq::Biweekly,
            RebalanceFreq::Monthly,
        ] {
            assert_eq!(freq.to_string().parse::<RebalanceFreq>().unwrap(), freq);
        }
        assert!("4D".parse::<RebalanceFreq>().is_err());
    }

    #[test]
    fn test_label() {
        let config = BacktestConfig::equities_preset();
        assert_eq!(config.label(), "equities_B_top10_M_buf5");
    }

    #[test]
    fn test_presets() {
        let eq = BacktestConfig::equities_preset();
        assert_eq!(eq.transaction_cost_bps, 5.0);
        assert_eq!(eq.benchmark_symbol, Some(Symbol::new("SPY")));

        let perp = BacktestConfig::perpetuals_preset();
        assert_eq!(perp.rebalance_freq, RebalanceFreq::Weekly);
        assert_eq!(perp.sell_buffer, 3);
    }

    #[test]
    fn test_cost_rate() {
        let config = BacktestConfig {
            transaction_cost_bps: 5.0,
            ..Default::default()
        };
        assert!((config.cost_rate() - 0.0005).abs() < 1e-12);
    }

    #[test]
    fn test_validate_rejects_inverted_dates() {
        let config = BacktestConfig {
            start_date: Some(d("2024-06-01")),
            end_date: Some(d("2024-01-01")),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(LevanterError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_validate_rejects_zero_top_n() {
        let config = BacktestConfig {
            top_n: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_preset() {
        assert!(BacktestConfig::equities_preset().validate().is_ok());
        assert!(BacktestConfig::perpetuals_preset().validate().is_ok());
    }

    #[test]
    fn test_grid_combinations() {
        let grid = SweepGrid::default_for(Market::Equities);
        assert_eq!(grid.total_combinations(), 2 * 4 * 3 * 3);
        assert_eq!(grid.combinations().len(), grid.total_combinations());
    }

    #[test]
    fn test_config_serialization() {
        let config = BacktestConfig::perpetuals_preset();
        let json = serde_json::to_string(&config).unwrap();
        let back: BacktestConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
