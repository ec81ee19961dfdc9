//! The market data adapter.
//!
//! One `MarketData` instance is constructed per run, loaded once, and then
//! shared read-only — including across sweep workers. `slice_to_date` is
//! the single enforcement point for no-look-ahead: nothing downstream of it
//! ever sees a bar past the requested date.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use tracing::{info, warn};

use levanter_signals::score::{score_universe, ScoreFn};
use levanter_traits::{
    Date, LevanterError, MarketDialect, PriceBar, PriceSeries, Result, ScoreMethod, Symbol,
    Universe,
};

/// In-memory market dataset for one dialect.
///
/// Symbols below the dialect's minimum history are rejected at load time,
/// mirroring the adapter's role as the minimum-length filter. Benchmark
/// series are stored separately so an index or reference asset does not
/// enter the tradable universe.
#[derive(Debug, Clone)]
pub struct MarketData {
    dialect: MarketDialect,
    series: BTreeMap<Symbol, PriceSeries>,
    benchmarks: BTreeMap<Symbol, PriceSeries>,
}

impl MarketData {
    /// Creates an empty dataset for a dialect.
    #[must_use]
    pub const fn new(dialect: MarketDialect) -> Self {
        Self {
            dialect,
            series: BTreeMap::new(),
            benchmarks: BTreeMap::new(),
        }
    }

    /// Builds a dataset from per-symbol bar collections.
    ///
    /// Bars are sorted and deduplicated per symbol; symbols with fewer than
    /// `dialect.min_days` bars after cleaning are dropped.
    #[must_use]
    pub fn from_records(
        dialect: MarketDialect,
        records: impl IntoIterator<Item = (Symbol, Vec<PriceBar>)>,
    ) -> Self {
        let mut data = Self::new(dialect);
        for (symbol, bars) in records {
            data.insert_series(symbol, bars);
        }
        info!(symbols = data.series.len(), "market data loaded");
        data
    }

    /// Loads a dataset from a directory of `<SYMBOL>.json` files, each
    /// containing an array of price bars.
    ///
    /// File stems listed in `benchmark_symbols` are loaded as benchmark
    /// series instead of universe members. Unreadable files are skipped
    /// with a warning.
    pub fn from_json_dir(
        dialect: MarketDialect,
        dir: impl AsRef<Path>,
        benchmark_symbols: &[Symbol],
    ) -> Result<Self> {
        let dir = dir.as_ref();
        let entries = fs::read_dir(dir)
            .map_err(|e| LevanterError::InvalidData(format!("{}: {e}", dir.display())))?;

        let mut data = Self::new(dialect);
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let symbol = Symbol::new(stem);

            let bars: Vec<PriceBar> = match fs::read_to_string(&path)
                .map_err(|e| e.to_string())
                .and_then(|s| serde_json::from_str(&s).map_err(|e| e.to_string()))
            {
                Ok(bars) => bars,
                Err(e) => {
                    warn!(symbol = %symbol, error = %e, "skipping unreadable price file");
                    continue;
                }
            };

            if benchmark_symbols.contains(&symbol) {
                data.insert_benchmark(symbol, bars);
            } else {
                data.insert_series(symbol, bars);
            }
        }
        info!(
            symbols = data.series.len(),
            benchmarks = data.benchmarks.len(),
            dir = %dir.display(),
            "market data loaded"
        );
        Ok(data)
    }

    /// Adds one symbol's bars to the universe, applying the minimum-length
    /// filter. Returns whether the symbol was accepted.
    pub fn insert_series(&mut self, symbol: Symbol, bars: Vec<PriceBar>) -> bool {
        let series = PriceSeries::new(bars);
        if series.len() < self.dialect.min_days {
            return false;
        }
        self.series.insert(symbol, series);
        true
    }

    /// Adds a benchmark series, bypassing the minimum-length filter.
    pub fn insert_benchmark(&mut self, symbol: Symbol, bars: Vec<PriceBar>) {
        self.benchmarks.insert(symbol, PriceSeries::new(bars));
    }

    /// The dialect this dataset was constructed with.
    #[must_use]
    pub const fn dialect(&self) -> &MarketDialect {
        &self.dialect
    }

    /// Number of universe symbols.
    #[must_use]
    pub fn len(&self) -> usize {
        self.series.len()
    }

    /// Whether the universe is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Universe symbols in sorted order.
    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.series.keys()
    }

    /// Full (unsliced) series for one symbol.
    ///
    /// Full data is for evaluation only — decisions go through
    /// [`Self::slice_to_date`].
    #[must_use]
    pub fn series(&self, symbol: &Symbol) -> Option<&PriceSeries> {
        self.series.get(symbol)
    }

    /// Iterates the full universe series.
    pub fn iter(&self) -> impl Iterator<Item = (&Symbol, &PriceSeries)> {
        self.series.iter()
    }

    /// Sorted distinct union of trading dates across all universe symbols.
    #[must_use]
    pub fn trading_dates(&self) -> Vec<Date> {
        let mut dates = BTreeSet::new();
        for series in self.series.values() {
            dates.extend(series.bars().iter().map(|b| b.date));
        }
        dates.into_iter().collect()
    }

    /// First and last trading dates, if any data is loaded.
    #[must_use]
    pub fn date_range(&self) -> Option<(Date, Date)> {
        let dates = self.trading_dates();
        Some((*dates.first()?, *dates.last()?))
    }

    /// Universe truncated to bars with `date <= cutoff`.
    ///
    /// This is the no-look-ahead gate: the returned series contain no bar
    /// past `cutoff`, and symbols whose truncated history falls below the
    /// dialect minimum are excluded.
    #[must_use]
    pub fn slice_to_date(&self, cutoff: Date) -> Universe {
        let mut sliced = Universe::new();
        for (symbol, series) in &self.series {
            let cut = series.truncate_to(cutoff);
            if cut.len() >= self.dialect.min_days {
                sliced.insert(symbol.clone(), cut);
            }
        }
        sliced
    }

    /// Closing prices for symbols with an exact bar on `date`.
    ///
    /// Symbols without a bar on that date are omitted, never filled.
    #[must_use]
    pub fn prices_at(&self, date: Date) -> BTreeMap<Symbol, f64> {
        self.series
            .iter()
            .filter_map(|(sym, series)| series.close_at(date).map(|c| (sym.clone(), c)))
            .collect()
    }

    /// Benchmark NAV series as `(date, close)` pairs.
    ///
    /// Looks in the universe first, then the dedicated benchmark store.
    /// Returns `None` (with a warning) when the symbol is unknown — the
    /// engine then reports relative metrics as zero.
    #[must_use]
    pub fn benchmark_series(&self, symbol: &Symbol) -> Option<Vec<(Date, f64)>> {
        let series = self.series.get(symbol).or_else(|| self.benchmarks.get(symbol));
        match series {
            Some(s) => Some(s.bars().iter().map(|b| (b.date, b.close)).collect()),
            None => {
                warn!(benchmark = %symbol, "benchmark data unavailable");
                None
            }
        }
    }

    /// The scoring function for a method, dialect-agnostic.
    #[must_use]
    pub const fn scoring_function(method: ScoreMethod) -> ScoreFn {
        score_universe(method)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Date {
        s.parse().unwrap()
    }

    fn flat_bars(start: &str, n: usize, close: f64) -> Vec<PriceBar> {
        let start: Date = start.parse().unwrap();
        (0..n)
            .map(|i| PriceBar {
                date: start + chrono::Days::new(i as u64),
                close,
                volume: None,
            })
            .collect()
    }

    fn sample_data() -> MarketData {
        MarketData::from_records(
            MarketDialect::perpetuals(),
            vec![
                (Symbol::new("AAA"), flat_bars("2024-01-01", 30, 10.0)),
                (Symbol::new("BBB"), flat_bars("2024-01-01", 30, 20.0)),
                (Symbol::new("SHORT"), flat_bars("2024-01-01", 5, 30.0)),
            ],
        )
    }

    #[test]
    fn test_min_days_filter_at_load() {
        let data = sample_data();
        assert_eq!(data.len(), 2);
        assert!(!data.symbols().any(|s| s.as_str() == "SHORT"));
    }

    #[test]
    fn test_trading_dates_union() {
        let mut data = sample_data();
        data.insert_series(
            Symbol::new("CCC"),
            flat_bars("2024-02-15", 20, 5.0),
        );
        let dates = data.trading_dates();
        assert_eq!(dates.first(), Some(&d("2024-01-01")));
        assert_eq!(dates.last(), Some(&d("2024-03-05")));
        // Distinct union, not a concatenation
        assert_eq!(dates.len(), 50);
    }

    #[test]
    fn test_slice_to_date_never_exceeds_cutoff() {
        let data = sample_data();
        let cutoff = d("2024-01-20");
        let sliced = data.slice_to_date(cutoff);
        for series in sliced.values() {
            assert!(series.bars().iter().all(|b| b.date <= cutoff));
        }
    }

    #[test]
    fn test_slice_to_date_applies_min_days() {
        let data = sample_data();
        // 14 bars available by Jan 14 — below the 15-bar perpetual minimum
        assert!(data.slice_to_date(d("2024-01-14")).is_empty());
        assert_eq!(data.slice_to_date(d("2024-01-15")).len(), 2);
    }

    #[test]
    fn test_prices_at_exact_bar_only() {
        let mut data = MarketData::new(MarketDialect::perpetuals());
        data.insert_series(Symbol::new("AAA"), flat_bars("2024-01-01", 20, 10.0));
        // BBB has a gap on Jan 10
        let mut bars = flat_bars("2024-01-01", 20, 20.0);
        bars.retain(|b| b.date != d("2024-01-10"));
        data.insert_series(Symbol::new("BBB"), bars);

        let prices = data.prices_at(d("2024-01-10"));
        assert_eq!(prices.len(), 1);
        assert_eq!(prices[&Symbol::new("AAA")], 10.0);
    }

    #[test]
    fn test_benchmark_series_lookup() {
        let mut data = sample_data();
        data.insert_benchmark(Symbol::new("SPY"), flat_bars("2024-01-01", 10, 400.0));

        // From the benchmark store
        let bm = data.benchmark_series(&Symbol::new("SPY")).unwrap();
        assert_eq!(bm.len(), 10);
        // From the universe
        assert!(data.benchmark_series(&Symbol::new("AAA")).is_some());
        // Unknown
        assert!(data.benchmark_series(&Symbol::new("QQQ")).is_none());
    }

    #[test]
    fn test_date_range() {
        let data = sample_data();
        assert_eq!(
            data.date_range(),
            Some((d("2024-01-01"), d("2024-01-30")))
        );
        assert!(MarketData::new(MarketDialect::equities()).date_range().is_none());
    }
}
