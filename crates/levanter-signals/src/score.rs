//! The two cross-sectional scoring methods.
//!
//! Both consume a universe already sliced to the decision date and return a
//! percentile-ranked [`Ranking`]. They are dialect-agnostic: every
//! market-specific constant comes in through [`MarketDialect`].

use levanter_traits::stats::{linear_fit, sample_std, zscore_clamped, MIN_DENOM};
use levanter_traits::{MarketDialect, RankedSymbol, Ranking, ScoreMethod, Symbol, Universe};

use crate::rank::percentile_ranks;

/// Signature shared by both scoring methods.
///
/// The adapter produces the universe, the dialect selects the constants,
/// and the engine only ever holds this function pointer — which is what
/// keeps scoring decoupled from the data layer.
pub type ScoreFn = fn(&Universe, &MarketDialect) -> Ranking;

/// Returns the scoring function for a method.
#[must_use]
pub const fn score_universe(method: ScoreMethod) -> ScoreFn {
    match method {
        ScoreMethod::B => zscore_ranking,
        ScoreMethod::C => clenow_ranking,
    }
}

/// Z-score clamp bound for method B.
const Z_CLAMP: f64 = 3.0;

/// Method B — risk-adjusted cross-sectional z-score momentum.
///
/// Per symbol: total returns over the dialect's long/mid/short windows,
/// measured `skip_days` before the series end. The long-window return is
/// risk-adjusted by annualized volatility of daily returns inside that
/// window (zero volatility adjusts to zero). Each measure is then
/// cross-sectionally z-scored with a ±3 clamp and combined with the
/// dialect's weights. Symbols whose long window does not fit are dropped.
#[must_use]
pub fn zscore_ranking(universe: &Universe, dialect: &MarketDialect) -> Ranking {
    let [w_long, w_mid, w_short] = dialect.windows();
    let ann = (dialect.annualization as f64).sqrt();

    let mut symbols: Vec<Symbol> = Vec::new();
    let mut returns: Vec<[f64; 3]> = Vec::new();
    let mut adjusted: [Vec<f64>; 3] = [Vec::new(), Vec::new(), Vec::new()];

    for (symbol, series) in universe {
        let closes = series.closes();
        let n = closes.len();
        if n < dialect.min_days {
            continue;
        }
        let Some(end_idx) = n.checked_sub(1 + dialect.skip_days) else {
            continue;
        };
        if end_idx < w_long {
            continue;
        }

        let ret = |w: usize| closes[end_idx] / closes[end_idx - w] - 1.0;
        let (ret_long, ret_mid, ret_short) = (ret(w_long), ret(w_mid), ret(w_short));

        // Daily returns over the long window, annualized sample std
        let daily: Vec<f64> = closes.windows(2).map(|w| w[1] / w[0] - 1.0).collect();
        let vol_start = end_idx.saturating_sub(w_long);
        let vol = sample_std(&daily[vol_start..end_idx])
            .map(|s| s * ann)
            .unwrap_or(0.0);

        let ra_long = if vol > MIN_DENOM { ret_long / vol } else { 0.0 };

        symbols.push(symbol.clone());
        returns.push([ret_long, ret_mid, ret_short]);
        adjusted[0].push(ra_long);
        adjusted[1].push(ret_mid);
        adjusted[2].push(ret_short);
    }

    if symbols.is_empty() {
        return Ranking::default();
    }

    let z: Vec<Vec<f64>> = adjusted
        .iter()
        .map(|measure| zscore_clamped(measure, Z_CLAMP))
        .collect();

    let w = dialect.weights_zscore;
    let composites: Vec<f64> = (0..symbols.len())
        .map(|i| w[0] * z[0][i] + w[1] * z[1][i] + w[2] * z[2][i])
        .collect();
    let ranks = percentile_ranks(&composites);

    Ranking::new(
        symbols
            .into_iter()
            .enumerate()
            .map(|(i, symbol)| RankedSymbol {
                symbol,
                components: vec![
                    returns[i][0],
                    returns[i][1],
                    returns[i][2],
                    z[0][i],
                    z[1][i],
                    z[2][i],
                ],
                composite: composites[i],
                rank: ranks[i],
            })
            .collect(),
    )
}

/// Annualized Clenow momentum clamp bounds.
const CLENOW_CLAMP: (f64, f64) = (-10.0, 100.0);

/// Clenow momentum for one window: regression slope of log-price against
/// the time index, annualized by exponentiation, times r².
///
/// Windows that do not fit, non-positive prices inside the window and
/// degenerate fits all contribute zero.
fn clenow_momentum(closes: &[f64], window: usize, annualization: usize) -> f64 {
    if window < 2 || closes.len() < window {
        return 0.0;
    }
    let tail = &closes[closes.len() - window..];
    if tail.iter().any(|&p| p <= 0.0) {
        return 0.0;
    }
    let log_prices: Vec<f64> = tail.iter().map(|p| p.ln()).collect();
    let Some((slope, r_squared)) = linear_fit(&log_prices) else {
        return 0.0;
    };
    let annualized = (slope.exp().powi(annualization as i32) - 1.0)
        .clamp(CLENOW_CLAMP.0, CLENOW_CLAMP.1);
    annualized * r_squared
}

/// Method C — Clenow regression momentum.
///
/// Per symbol: [`clenow_momentum`] over the dialect's three windows,
/// combined with the dialect's Clenow weights.
#[must_use]
pub fn clenow_ranking(universe: &Universe, dialect: &MarketDialect) -> Ranking {
    let [w_long, w_mid, w_short] = dialect.windows();

    let mut symbols: Vec<Symbol> = Vec::new();
    let mut components: Vec<[f64; 3]> = Vec::new();

    for (symbol, series) in universe {
        let closes = series.closes();
        if closes.len() < dialect.min_days {
            continue;
        }
        let c_long = clenow_momentum(&closes, w_long, dialect.annualization);
        let c_mid = clenow_momentum(&closes, w_mid, dialect.annualization);
        let c_short = clenow_momentum(&closes, w_short, dialect.annualization);

        symbols.push(symbol.clone());
        components.push([c_long, c_mid, c_short]);
    }

    if symbols.is_empty() {
        return Ranking::default();
    }

    let w = dialect.weights_clenow;
    let composites: Vec<f64> = components
        .iter()
        .map(|c| w[0] * c[0] + w[1] * c[1] + w[2] * c[2])
        .collect();
    let ranks = percentile_ranks(&composites);

    Ranking::new(
        symbols
            .into_iter()
            .enumerate()
            .map(|(i, symbol)| RankedSymbol {
                symbol,
                components: components[i].to_vec(),
                composite: composites[i],
                rank: ranks[i],
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use levanter_traits::{Date, PriceBar, PriceSeries};

    fn series_from(closes: &[f64]) -> PriceSeries {
        let start: Date = "2024-01-01".parse().unwrap();
        PriceSeries::new(
            closes
                .iter()
                .enumerate()
                .map(|(i, &close)| PriceBar {
                    date: start + chrono::Days::new(i as u64),
                    close,
                    volume: None,
                })
                .collect(),
        )
    }

    fn trending_universe() -> Universe {
        let mut universe = Universe::new();
        // Strong uptrend, mild uptrend, downtrend
        universe.insert(
            "UP".into(),
            series_from(&(0..20).map(|i| 100.0 * 1.05f64.powi(i)).collect::<Vec<_>>()),
        );
        universe.insert(
            "MID".into(),
            series_from(&(0..20).map(|i| 100.0 * 1.01f64.powi(i)).collect::<Vec<_>>()),
        );
        universe.insert(
            "DOWN".into(),
            series_from(&(0..20).map(|i| 100.0 * 0.97f64.powi(i)).collect::<Vec<_>>()),
        );
        universe
    }

    #[test]
    fn test_zscore_ranking_orders_by_momentum() {
        let ranking = zscore_ranking(&trending_universe(), &MarketDialect::perpetuals());
        assert_eq!(ranking.len(), 3);
        let order: Vec<&str> = ranking.symbols().map(Symbol::as_str).collect();
        assert_eq!(order[0], "UP");
        assert_eq!(order[2], "DOWN");
        assert!(ranking.rank_of(&"UP".into()) > ranking.rank_of(&"DOWN".into()));
    }

    #[test]
    fn test_clenow_ranking_orders_by_momentum() {
        let ranking = clenow_ranking(&trending_universe(), &MarketDialect::perpetuals());
        let order: Vec<&str> = ranking.symbols().map(Symbol::as_str).collect();
        assert_eq!(order[0], "UP");
        assert_eq!(order[2], "DOWN");
    }

    #[test]
    fn test_singleton_universe_zero_z_rank_50() {
        let mut universe = Universe::new();
        universe.insert("ONLY".into(), series_from(&vec![100.0; 20]));
        let ranking = zscore_ranking(&universe, &MarketDialect::perpetuals());
        assert_eq!(ranking.len(), 1);
        let row = &ranking.rows()[0];
        assert_eq!(row.rank, 50);
        assert_relative_eq!(row.composite, 0.0);
        // z components are all zero
        for &z in &row.components[3..] {
            assert_relative_eq!(z, 0.0);
        }
    }

    #[test]
    fn test_short_history_dropped() {
        let mut universe = trending_universe();
        universe.insert("SHORT".into(), series_from(&[100.0, 101.0, 102.0]));
        let ranking = zscore_ranking(&universe, &MarketDialect::perpetuals());
        assert!(ranking.rank_of(&"SHORT".into()).is_none());
        assert_eq!(ranking.len(), 3);
    }

    #[test]
    fn test_empty_universe_empty_ranking() {
        let universe = Universe::new();
        assert!(zscore_ranking(&universe, &MarketDialect::equities()).is_empty());
        assert!(clenow_ranking(&universe, &MarketDialect::equities()).is_empty());
    }

    #[test]
    fn test_zero_volatility_risk_adjusts_to_zero() {
        let mut universe = Universe::new();
        universe.insert("FLAT".into(), series_from(&vec![100.0; 20]));
        universe.insert(
            "UP".into(),
            series_from(&(0..20).map(|i| 100.0 + i as f64).collect::<Vec<_>>()),
        );
        let ranking = zscore_ranking(&universe, &MarketDialect::perpetuals());
        // The flat symbol's long-window measure was forced to zero, so it
        // must rank below the trending one.
        assert!(ranking.rank_of(&"UP".into()) > ranking.rank_of(&"FLAT".into()));
    }

    #[test]
    fn test_clenow_momentum_flat_series_is_zero() {
        let closes = vec![100.0; 10];
        // Flat log-price fits with slope 0 → exp(0)^ann − 1 = 0
        assert_relative_eq!(clenow_momentum(&closes, 7, 365), 0.0);
    }

    #[test]
    fn test_clenow_momentum_window_too_large_is_zero() {
        assert_relative_eq!(clenow_momentum(&[100.0, 101.0], 7, 365), 0.0);
        assert_relative_eq!(clenow_momentum(&[100.0, 101.0, 102.0], 1, 365), 0.0);
    }

    #[test]
    fn test_clenow_annualization_clamped() {
        // 5% daily growth annualizes far past 100 and must clamp
        let closes: Vec<f64> = (0..10).map(|i| 100.0 * 1.05f64.powi(i)).collect();
        let m = clenow_momentum(&closes, 7, 365);
        assert_relative_eq!(m, 100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_score_universe_dispatch() {
        let universe = trending_universe();
        let dialect = MarketDialect::perpetuals();
        let b = score_universe(ScoreMethod::B)(&universe, &dialect);
        let c = score_universe(ScoreMethod::C)(&universe, &dialect);
        assert_eq!(b.len(), 3);
        assert_eq!(c.len(), 3);
    }
}
