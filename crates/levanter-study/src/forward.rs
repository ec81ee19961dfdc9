//! Forward-return matrices.
//!
//! Built from full (not sliced) price data: the matrices feed evaluation,
//! never decisions, so looking forward here is legitimate. A cell is
//! absent — not zero, not NaN — when either endpoint lacks a bar.

use std::collections::BTreeMap;

use levanter_data::MarketData;
use levanter_traits::{Date, Symbol};

/// Per-horizon forward returns, `(symbol, date) → price(t+h)/price(t) − 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct ForwardReturns {
    horizon: usize,
    values: BTreeMap<Symbol, BTreeMap<Date, f64>>,
}

impl ForwardReturns {
    /// Builds the matrix for one horizon over the computation dates.
    ///
    /// The horizon is counted in each symbol's own bars: the exit price is
    /// the bar `horizon` positions after the entry bar.
    #[must_use]
    pub fn build(data: &MarketData, computation_dates: &[Date], horizon: usize) -> Self {
        let mut values: BTreeMap<Symbol, BTreeMap<Date, f64>> = BTreeMap::new();
        for (symbol, series) in data.iter() {
            let bars = series.bars();
            let mut per_date = BTreeMap::new();
            for &date in computation_dates {
                let Some(idx) = series.index_of(date) else {
                    continue;
                };
                let Some(exit) = bars.get(idx + horizon) else {
                    continue;
                };
                let entry = bars[idx].close;
                if entry > 0.0 {
                    per_date.insert(date, exit.close / entry - 1.0);
                }
            }
            values.insert(symbol.clone(), per_date);
        }
        Self { horizon, values }
    }

    /// Assembles a matrix from raw values.
    #[must_use]
    pub const fn from_values(
        horizon: usize,
        values: BTreeMap<Symbol, BTreeMap<Date, f64>>,
    ) -> Self {
        Self { horizon, values }
    }

    /// The horizon in bars.
    #[must_use]
    pub const fn horizon(&self) -> usize {
        self.horizon
    }

    /// Forward return for a symbol at a computation date, if defined.
    #[must_use]
    pub fn get(&self, symbol: &Symbol, date: Date) -> Option<f64> {
        self.values.get(symbol)?.get(&date).copied()
    }

    /// Symbols with a row in the matrix.
    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.values.keys()
    }

    /// Whether a symbol has any defined return.
    #[must_use]
    pub fn has_symbol(&self, symbol: &Symbol) -> bool {
        self.values.get(symbol).is_some_and(|m| !m.is_empty())
    }
}

/// Builds one matrix per horizon, shared across factors.
#[must_use]
pub fn build_return_matrices(
    data: &MarketData,
    computation_dates: &[Date],
    horizons: &[usize],
) -> BTreeMap<usize, ForwardReturns> {
    horizons
        .iter()
        .map(|&h| (h, ForwardReturns::build(data, computation_dates, h)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use levanter_traits::{MarketDialect, PriceBar};

    fn d(s: &str) -> Date {
        s.parse().unwrap()
    }

    fn data() -> MarketData {
        let start = d("2024-01-01");
        let bars: Vec<PriceBar> = (0..20)
            .map(|i| PriceBar {
                date: start + chrono::Days::new(i as u64),
                close: 100.0 + i as f64,
                volume: None,
            })
            .collect();
        MarketData::from_records(
            MarketDialect::perpetuals(),
            [(Symbol::new("AAA"), bars)],
        )
    }

    #[test]
    fn test_forward_return_value() {
        let data = data();
        let dates = vec![d("2024-01-01"), d("2024-01-05")];
        let matrix = ForwardReturns::build(&data, &dates, 5);
        // Entry 100 on Jan 1, exit 105 five bars later
        assert_relative_eq!(
            matrix.get(&Symbol::new("AAA"), d("2024-01-01")).unwrap(),
            0.05
        );
        assert_relative_eq!(
            matrix.get(&Symbol::new("AAA"), d("2024-01-05")).unwrap(),
            5.0 / 104.0
        );
    }

    #[test]
    fn test_absent_when_exit_beyond_series() {
        let data = data();
        let dates = vec![d("2024-01-18")];
        let matrix = ForwardReturns::build(&data, &dates, 5);
        assert!(matrix.get(&Symbol::new("AAA"), d("2024-01-18")).is_none());
    }

    #[test]
    fn test_absent_when_entry_has_no_bar() {
        let data = data();
        let dates = vec![d("2024-06-01")];
        let matrix = ForwardReturns::build(&data, &dates, 5);
        assert!(matrix.get(&Symbol::new("AAA"), d("2024-06-01")).is_none());
    }

    #[test]
    fn test_build_matrices_per_horizon() {
        let data = data();
        let dates = vec![d("2024-01-01")];
        let matrices = build_return_matrices(&data, &dates, &[1, 5, 10]);
        assert_eq!(matrices.len(), 3);
        assert_relative_eq!(
            matrices[&1].get(&Symbol::new("AAA"), d("2024-01-01")).unwrap(),
            0.01
        );
        assert_relative_eq!(
            matrices[&10]
                .get(&Symbol::new("AAA"), d("2024-01-01"))
                .unwrap(),
            0.10
        );
    }
}
