//! Common types used throughout the Levanter framework.
//!
//! The central representation is a per-symbol [`PriceSeries`] keyed by
//! [`Symbol`] in a [`Universe`] map. Scoring functions consume a sliced
//! universe and emit a [`Ranking`].

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// Re-export date type from chrono
pub use chrono::NaiveDate as Date;

/// A market symbol identifier, case-normalized to upper.
///
/// Symbols identify securities across the framework — ticker symbols like
/// "AAPL" for equities or pair names like "BTCUSDT" for perpetuals.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    /// Creates a symbol, upper-casing the input.
    pub fn new(s: impl AsRef<str>) -> Self {
        Self(s.as_ref().to_uppercase())
    }

    /// Returns the symbol as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// A single daily price observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    /// Trading date of the observation.
    pub date: Date,
    /// Closing price; must be positive.
    pub close: f64,
    /// Traded volume, when available.
    #[serde(default)]
    pub volume: Option<f64>,
}

/// An ordered sequence of price bars for one symbol.
///
/// Strictly ascending by date with no duplicate dates. The constructor
/// sorts, deduplicates (last observation wins) and drops bars with a
/// non-positive close, so downstream code can assume a clean series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// Builds a series from raw bars, sorting and deduplicating.
    #[must_use]
    pub fn new(mut bars: Vec<PriceBar>) -> Self {
        bars.retain(|b| b.close > 0.0 && b.close.is_finite());
        bars.sort_by_key(|b| b.date);
        // Last observation for a date wins.
        let mut deduped: Vec<PriceBar> = Vec::with_capacity(bars.len());
        for bar in bars {
            match deduped.last_mut() {
                Some(last) if last.date == bar.date => *last = bar,
                _ => deduped.push(bar),
            }
        }
        Self { bars: deduped }
    }

    /// Number of bars in the series.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Whether the series has no bars.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// The underlying bars, ascending by date.
    #[must_use]
    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    /// Closing prices in date order.
    #[must_use]
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// Date of the first bar.
    #[must_use]
    pub fn first_date(&self) -> Option<Date> {
        self.bars.first().map(|b| b.date)
    }

    /// Date of the last bar.
    #[must_use]
    pub fn last_date(&self) -> Option<Date> {
        self.bars.last().map(|b| b.date)
    }

    /// Closing price at an exact date, if a bar exists there.
    #[must_use]
    pub fn close_at(&self, date: Date) -> Option<f64> {
        self.bars
            .binary_search_by_key(&date, |b| b.date)
            .ok()
            .map(|i| self.bars[i].close)
    }

    /// Position of the bar at an exact date.
    #[must_use]
    pub fn index_of(&self, date: Date) -> Option<usize> {
        self.bars.binary_search_by_key(&date, |b| b.date).ok()
    }

    /// Returns a copy of the series truncated to bars with `date <= cutoff`.
    #[must_use]
    pub fn truncate_to(&self, cutoff: Date) -> Self {
        let end = self.bars.partition_point(|b| b.date <= cutoff);
        Self {
            bars: self.bars[..end].to_vec(),
        }
    }
}

/// A universe snapshot: per-symbol price series.
///
/// A `BTreeMap` keeps iteration deterministic, which makes rankings and
/// trade logs reproducible across runs.
pub type Universe = BTreeMap<Symbol, PriceSeries>;

/// One row of a cross-sectional ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedSymbol {
    /// The ranked symbol.
    pub symbol: Symbol,
    /// Raw per-window measures that fed the composite, in window order.
    pub components: Vec<f64>,
    /// Weighted composite score.
    pub composite: f64,
    /// Percentile bucket in `[0, 99]`.
    pub rank: u8,
}

/// A cross-sectional ranking, ordered by rank descending then symbol
/// ascending (the stable tie-break used by the rebalancer).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ranking {
    rows: Vec<RankedSymbol>,
}

impl Ranking {
    /// Builds a ranking, sorting rows by `(rank desc, symbol asc)`.
    #[must_use]
    pub fn new(mut rows: Vec<RankedSymbol>) -> Self {
        rows.sort_by(|a, b| b.rank.cmp(&a.rank).then_with(|| a.symbol.cmp(&b.symbol)));
        Self { rows }
    }

    /// Number of ranked symbols.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the ranking is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The rows in rank order.
    #[must_use]
    pub fn rows(&self) -> &[RankedSymbol] {
        &self.rows
    }

    /// Symbols in rank order.
    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.rows.iter().map(|r| &r.symbol)
    }

    /// Rank bucket for a symbol, if present.
    #[must_use]
    pub fn rank_of(&self, symbol: &Symbol) -> Option<u8> {
        self.rows.iter().find(|r| &r.symbol == symbol).map(|r| r.rank)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Date {
        s.parse().unwrap()
    }

    fn bar(date: &str, close: f64) -> PriceBar {
        PriceBar {
            date: d(date),
            close,
            volume: None,
        }
    }

    #[test]
    fn test_symbol_uppercased() {
        let sym = Symbol::new("aapl");
        assert_eq!(sym.as_str(), "AAPL");
        assert_eq!(Symbol::from("btcusdt").to_string(), "BTCUSDT");
    }

    #[test]
    fn test_series_sorts_and_dedups() {
        let series = PriceSeries::new(vec![
            bar("2024-01-03", 3.0),
            bar("2024-01-01", 1.0),
            bar("2024-01-02", 2.0),
            bar("2024-01-02", 2.5),
        ]);
        assert_eq!(series.len(), 3);
        assert_eq!(series.closes(), vec![1.0, 2.5, 3.0]);
    }

    #[test]
    fn test_series_drops_nonpositive_closes() {
        let series = PriceSeries::new(vec![
            bar("2024-01-01", 1.0),
            bar("2024-01-02", 0.0),
            bar("2024-01-03", -5.0),
            bar("2024-01-04", 4.0),
        ]);
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn test_series_truncate_to() {
        let series = PriceSeries::new(vec![
            bar("2024-01-01", 1.0),
            bar("2024-01-02", 2.0),
            bar("2024-01-03", 3.0),
        ]);
        let cut = series.truncate_to(d("2024-01-02"));
        assert_eq!(cut.len(), 2);
        assert_eq!(cut.last_date(), Some(d("2024-01-02")));

        let all = series.truncate_to(d("2024-12-31"));
        assert_eq!(all.len(), 3);

        let none = series.truncate_to(d("2023-12-31"));
        assert!(none.is_empty());
    }

    #[test]
    fn test_series_close_at_exact_date_only() {
        let series = PriceSeries::new(vec![bar("2024-01-01", 1.0), bar("2024-01-03", 3.0)]);
        assert_eq!(series.close_at(d("2024-01-01")), Some(1.0));
        assert_eq!(series.close_at(d("2024-01-02")), None);
    }

    #[test]
    fn test_ranking_sorted_by_rank_then_symbol() {
        let ranking = Ranking::new(vec![
            RankedSymbol {
                symbol: "B".into(),
                components: vec![],
                composite: 1.0,
                rank: 90,
            },
            RankedSymbol {
                symbol: "A".into(),
                components: vec![],
                composite: 1.0,
                rank: 90,
            },
            RankedSymbol {
                symbol: "C".into(),
                components: vec![],
                composite: 2.0,
                rank: 99,
            },
        ]);
        let order: Vec<&str> = ranking.symbols().map(Symbol::as_str).collect();
        assert_eq!(order, vec!["C", "A", "B"]);
        assert_eq!(ranking.rank_of(&"A".into()), Some(90));
        assert_eq!(ranking.rank_of(&"Z".into()), None);
    }
}
