//! `levanter sweep` — grid-search the parameter space.

use std::path::Path;

use anyhow::Result;

use levanter_backtest::optimizer::{sharpe_metric, ParamOptimizer};
use levanter_backtest::ParameterSweep;

use crate::data;

pub fn run(
    data_dir: &Path,
    market: &str,
    start: Option<String>,
    end: Option<String>,
    show: usize,
    robust: bool,
    format: &str,
) -> Result<()> {
    let market = data::parse_market(market)?;
    let start = data::parse_date_opt(start.as_ref())?;
    let end = data::parse_date_opt(end.as_ref())?;

    let market_data = data::load_market_data(market, data_dir, &[])?;
    let sweep = ParameterSweep::new(market);

    println!(
        "Sweeping {} combinations on {} symbols...",
        sweep.total_combinations(),
        market_data.len()
    );
    let rows = sweep.run(&market_data, start, end);

    if robust {
        let optimizer = ParamOptimizer::new(market);
        let robust_rows = optimizer.rank_with_robustness(&rows, sharpe_metric, show);

        if format == "json" {
            println!("{}", serde_json::to_string_pretty(&robust_rows)?);
            return Ok(());
        }

        println!();
        println!(
            "{:<34} {:>8} {:>8} {:>9} {:>5}",
            "Label", "Sharpe", "Robust", "CAGR", "Nbrs"
        );
        println!("{}", "─".repeat(68));
        for r in &robust_rows {
            println!(
                "{:<34} {:>8.3} {:>8.3} {:>8.2}% {:>5}",
                r.row.label,
                r.row.metrics.sharpe_ratio,
                r.robustness_score,
                r.row.metrics.cagr * 100.0,
                r.neighbor_count
            );
        }
        println!();
        return Ok(());
    }

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&rows)?)
    } else {
        println!();
        println!(
            "{:<34} {:>8} {:>9} {:>9} {:>7}",
            "Label", "Sharpe", "CAGR", "MaxDD", "Trades"
        );
        println!("{}", "─".repeat(72));
        for row in rows.iter().take(show) {
            println!(
                "{:<34} {:>8.3} {:>8.2}% {:>8.2}% {:>7}",
                row.label,
                row.metrics.sharpe_ratio,
                row.metrics.cagr * 100.0,
                row.metrics.max_drawdown * 100.0,
                row.metrics.n_trades
            );
        }
        println!();
    }

    Ok(())
}
