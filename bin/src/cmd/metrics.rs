//! `levanter metrics` — derived fundamental metrics for one symbol.

use std::path::Path;

use anyhow::Result;

use levanter_fundamentals::compute_metrics;
use levanter_traits::Symbol;

use crate::data;

pub fn run(data_dir: &Path, symbol: &str, format: &str) -> Result<()> {
    let symbol = Symbol::new(symbol);
    let bundle = data::load_fundamentals(data_dir, &symbol)?;

    let rows = compute_metrics(
        &symbol,
        &bundle.income,
        &bundle.balance_sheet,
        &bundle.cash_flow,
    );

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    let pct = |v: Option<f64>| {
        v.map_or_else(|| "      -".to_string(), |x| format!("{:>6.1}%", x * 100.0))
    };

    println!();
    println!("Derived metrics: {symbol} ({} quarters)", rows.len());
    println!("{}", "─".repeat(78));
    println!(
        "{:<12} {:<4} {:>7} {:>7} {:>7} {:>7} {:>8} {:>8}",
        "Date", "Per", "Gross", "Net", "ROE", "ROIC", "RevYoY", "RevQoQ"
    );
    for row in &rows {
        println!(
            "{:<12} {:<4} {} {} {} {} {} {}",
            row.date,
            row.period,
            pct(row.gross_margin),
            pct(row.net_margin),
            pct(row.roe),
            pct(row.roic),
            pct(row.revenue_growth_yoy),
            pct(row.revenue_growth_qoq)
        );
    }
    println!();

    Ok(())
}
