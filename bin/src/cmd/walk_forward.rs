//! `levanter walk-forward` — rolling out-of-sample validation.

use std::path::Path;

use anyhow::Result;

use levanter_backtest::ParamOptimizer;

use crate::data;

pub fn run(
    data_dir: &Path,
    market: &str,
    train_months: u32,
    test_months: u32,
    step_months: u32,
    format: &str,
) -> Result<()> {
    let market = data::parse_market(market)?;
    let market_data = data::load_market_data(market, data_dir, &[])?;

    let optimizer = ParamOptimizer::new(market);
    let result = optimizer.walk_forward(&market_data, train_months, test_months, step_months);

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!();
    println!(
        "Walk-Forward: train {train_months}m / test {test_months}m / step {step_months}m"
    );
    println!("{}", "─".repeat(78));
    println!(
        "{:>3}  {:<23} {:<23} {:>8} {:>8} {:>8}",
        "#", "Train", "Test", "IS Shp", "OS Shp", "OS MaxDD"
    );
    for r in &result.rounds {
        println!(
            "{:>3}  {} → {} {} → {} {:>8.3} {:>8.3} {:>7.2}%",
            r.round_num,
            r.train_start,
            r.train_end,
            r.test_start,
            r.test_end,
            r.in_sample_sharpe,
            r.out_sample_sharpe,
            r.out_sample_max_drawdown * 100.0
        );
    }
    println!();
    println!("Avg in-sample Sharpe:     {:>8.3}", result.avg_in_sample_sharpe);
    println!("Avg out-of-sample Sharpe: {:>8.3}", result.avg_out_sample_sharpe);
    println!(
        "Avg out-of-sample CAGR:   {:>7.2}%",
        result.avg_out_sample_cagr * 100.0
    );
    println!("Overfit ratio:            {:>8.3}", result.overfit_ratio);
    println!("Param consistency:        {:>8.3}", result.param_consistency);
    if let Some(ref recommended) = result.recommended {
        println!("Recommended:              {}", recommended.label());
    }
    println!();

    Ok(())
}
