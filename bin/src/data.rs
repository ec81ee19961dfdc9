//! Data loading helpers for the CLI.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use levanter_backtest::Market;
use levanter_data::MarketData;
use levanter_fundamentals::{BalanceRow, CashFlowRow, IncomeRow};
use levanter_traits::{Date, Symbol};

/// Parses a `YYYY-MM-DD` date argument.
pub fn parse_date(s: &str) -> Result<Date> {
    s.parse::<Date>()
        .with_context(|| format!("invalid date {s:?}, expected YYYY-MM-DD"))
}

/// Parses an optional date argument.
pub fn parse_date_opt(s: Option<&String>) -> Result<Option<Date>> {
    s.map(|v| parse_date(v)).transpose()
}

/// Parses a market argument.
pub fn parse_market(s: &str) -> Result<Market> {
    Ok(s.parse::<Market>()?)
}

/// Loads price data for a market from a directory of `<SYMBOL>.json`
/// files, routing `benchmark_symbols` into the benchmark store.
pub fn load_market_data(
    market: Market,
    dir: &Path,
    benchmark_symbols: &[Symbol],
) -> Result<MarketData> {
    let data = MarketData::from_json_dir(market.dialect(), dir, benchmark_symbols)
        .with_context(|| format!("loading price data from {}", dir.display()))?;
    if data.is_empty() {
        anyhow::bail!(
            "no symbols with at least {} bars found in {}",
            market.dialect().min_days,
            dir.display()
        );
    }
    Ok(data)
}

/// Quarterly statements for one symbol, newest first.
#[derive(Debug, Deserialize)]
pub struct FundamentalBundle {
    /// Income statement rows.
    pub income: Vec<IncomeRow>,
    /// Balance sheet rows.
    #[serde(default)]
    pub balance_sheet: Vec<BalanceRow>,
    /// Cash flow rows.
    #[serde(default)]
    pub cash_flow: Vec<CashFlowRow>,
}

/// Loads a symbol's fundamental bundle from `<dir>/<SYMBOL>.json`.
pub fn load_fundamentals(dir: &Path, symbol: &Symbol) -> Result<FundamentalBundle> {
    let path = dir.join(format!("{symbol}.json"));
    let raw = fs::read_to_string(&path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}
