//! `levanter study` — IC analysis and event studies for factors.

use std::path::PathBuf;

use anyhow::Result;

use levanter_signals::FactorRegistry;
use levanter_study::{ComputationFreq, FactorStudyConfig, FactorStudyRunner};

use crate::data;

/// Parsed CLI arguments for the study command.
pub struct Args {
    pub data_dir: PathBuf,
    pub market: String,
    pub factors: Vec<String>,
    pub freq: Option<String>,
    pub horizons: Vec<usize>,
    pub quantiles: usize,
    pub start: Option<String>,
    pub end: Option<String>,
    pub format: String,
}

pub fn run(args: Args) -> Result<()> {
    let market = data::parse_market(&args.market)?;

    let mut config = match market {
        levanter_backtest::Market::Equities => FactorStudyConfig::equities_preset(),
        levanter_backtest::Market::Perpetuals => FactorStudyConfig::perpetuals_preset(),
    };
    if let Some(ref freq) = args.freq {
        config.computation_freq = freq.parse::<ComputationFreq>()?;
    }
    if !args.horizons.is_empty() {
        config.forward_horizons = args.horizons.clone();
    }
    config.n_quantiles = args.quantiles;
    config.start_date = data::parse_date_opt(args.start.as_ref())?;
    config.end_date = data::parse_date_opt(args.end.as_ref())?;

    let market_data = data::load_market_data(market, &args.data_dir, &[])?;

    let registry = FactorRegistry::with_defaults();
    let factor_names: Vec<String> = if args.factors.is_empty() {
        registry.names().iter().map(|s| (*s).to_string()).collect()
    } else {
        args.factors.clone()
    };

    let mut runner = FactorStudyRunner::new(config, &market_data)?;
    for name in &factor_names {
        runner.add_factor(registry.create(name, *market_data.dialect())?);
    }
    let reports = runner.run();

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    for report in &reports {
        println!();
        println!("Factor: {}", report.factor_name);
        println!(
            "({} computation dates, {} symbols)",
            report.n_computation_dates, report.n_symbols
        );
        println!("{}", "─".repeat(66));

        println!("IC by horizon:");
        println!(
            "  {:>4} {:>9} {:>9} {:>7} {:>7} {:>9}",
            "h", "mean IC", "IC IR", "hit", "spread", "n-quant"
        );
        for ic in &report.ic_results {
            println!(
                "  {:>4} {:>9.4} {:>9.3} {:>6.1}% {:>6.3}% {:>9}",
                ic.horizon,
                ic.mean_ic,
                ic.ic_ir,
                ic.ic_hit_rate * 100.0,
                ic.top_bottom_spread * 100.0,
                ic.quantile_returns.len()
            );
        }
        if report.ic_results.is_empty() {
            println!("  (no horizon had enough observations)");
        }

        println!("Event studies:");
        let mut shown = 0;
        for ev in &report.event_results {
            if ev.n_events == 0 {
                continue;
            }
            let t = ev
                .t_stat
                .map_or_else(|| "     -".to_string(), |t| format!("{t:>6.2}"));
            println!(
                "  {:<20} h={:<3} n={:<4} mean={:>7.3}% hit={:>5.1}% t={}",
                ev.signal_label,
                ev.horizon,
                ev.n_events,
                ev.mean_return * 100.0,
                ev.hit_rate * 100.0,
                t
            );
            shown += 1;
        }
        if shown == 0 {
            println!("  (no signals fired)");
        }
    }
    println!();

    Ok(())
}
