//! Built-in factors wrapping the scoring methods.
//!
//! The backtest engine consumes the scoring functions directly; the factor
//! study consumes these [`Factor`] wrappers, which expose the same rankings
//! as per-symbol scores.

use std::collections::BTreeMap;

use levanter_traits::{Date, Factor, FactorMeta, MarketDialect, Symbol, Universe};

use crate::score::{clenow_ranking, zscore_ranking};

/// Risk-adjusted z-score momentum rank as a factor score.
#[derive(Debug, Clone)]
pub struct MomentumZScoreFactor {
    dialect: MarketDialect,
}

impl MomentumZScoreFactor {
    /// Creates the factor for a dialect.
    #[must_use]
    pub const fn new(dialect: MarketDialect) -> Self {
        Self { dialect }
    }
}

impl Default for MomentumZScoreFactor {
    fn default() -> Self {
        Self::new(MarketDialect::equities())
    }
}

impl Factor for MomentumZScoreFactor {
    fn meta(&self) -> FactorMeta {
        FactorMeta {
            name: "momentum_zscore",
            score_name: "rank",
            score_range: (0.0, 99.0),
            higher_is_stronger: true,
            min_data_days: self.dialect.min_days,
        }
    }

    fn compute(&self, universe: &Universe, _date: Date) -> BTreeMap<Symbol, f64> {
        zscore_ranking(universe, &self.dialect)
            .rows()
            .iter()
            .map(|r| (r.symbol.clone(), f64::from(r.rank)))
            .collect()
    }
}

/// Clenow regression momentum rank as a factor score.
#[derive(Debug, Clone)]
pub struct ClenowMomentumFactor {
    dialect: MarketDialect,
}

impl ClenowMomentumFactor {
    /// Creates the factor for a dialect.
    #[must_use]
    pub const fn new(dialect: MarketDialect) -> Self {
        Self { dialect }
    }
}

impl Default for ClenowMomentumFactor {
    fn default() -> Self {
        Self::new(MarketDialect::equities())
    }
}

impl Factor for ClenowMomentumFactor {
    fn meta(&self) -> FactorMeta {
        FactorMeta {
            name: "clenow_momentum",
            score_name: "rank",
            score_range: (0.0, 99.0),
            higher_is_stronger: true,
            min_data_days: self.dialect.min_days,
        }
    }

    fn compute(&self, universe: &Universe, _date: Date) -> BTreeMap<Symbol, f64> {
        clenow_ranking(universe, &self.dialect)
            .rows()
            .iter()
            .map(|r| (r.symbol.clone(), f64::from(r.rank)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use levanter_traits::{PriceBar, PriceSeries};

    fn universe() -> Universe {
        let start: Date = "2024-01-01".parse().unwrap();
        let series = |rate: f64| {
            PriceSeries::new(
                (0..20)
                    .map(|i| PriceBar {
                        date: start + chrono::Days::new(i as u64),
                        close: 100.0 * rate.powi(i),
                        volume: None,
                    })
                    .collect(),
            )
        };
        let mut u = Universe::new();
        u.insert("UP".into(), series(1.04));
        u.insert("DOWN".into(), series(0.96));
        u
    }

    #[test]
    fn test_zscore_factor_scores_are_ranks() {
        let factor = MomentumZScoreFactor::new(MarketDialect::perpetuals());
        let scores = factor.compute(&universe(), "2024-01-20".parse().unwrap());
        assert_eq!(scores.len(), 2);
        assert!(scores[&Symbol::new("UP")] > scores[&Symbol::new("DOWN")]);
        assert!(scores.values().all(|&s| (0.0..=99.0).contains(&s)));
    }

    #[test]
    fn test_clenow_factor_scores_are_ranks() {
        let factor = ClenowMomentumFactor::new(MarketDialect::perpetuals());
        let scores = factor.compute(&universe(), "2024-01-20".parse().unwrap());
        assert!(scores[&Symbol::new("UP")] > scores[&Symbol::new("DOWN")]);
    }

    #[test]
    fn test_empty_universe_empty_scores() {
        let factor = MomentumZScoreFactor::default();
        assert!(factor
            .compute(&Universe::new(), "2024-01-01".parse().unwrap())
            .is_empty());
    }

    #[test]
    fn test_meta() {
        assert_eq!(MomentumZScoreFactor::default().meta().name, "momentum_zscore");
        assert_eq!(MomentumZScoreFactor::default().meta().min_data_days, 70);
        assert_eq!(
            ClenowMomentumFactor::new(MarketDialect::perpetuals())
                .meta()
                .min_data_days,
            15
        );
    }
}
