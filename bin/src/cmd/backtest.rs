//! `levanter backtest` — run one configuration and print its metrics.

use std::path::PathBuf;

use anyhow::Result;

use levanter_backtest::{BacktestConfig, BacktestEngine};
use levanter_traits::{ScoreMethod, Symbol};

use crate::data;

/// Parsed CLI arguments for the backtest command.
pub struct Args {
    pub data_dir: PathBuf,
    pub market: String,
    pub method: String,
    pub top_n: usize,
    pub buffer: Option<usize>,
    pub freq: Option<String>,
    pub weighting: String,
    pub cost_bps: Option<f64>,
    pub capital: f64,
    pub benchmark: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub format: String,
}

pub fn run(args: Args) -> Result<()> {
    let market = data::parse_market(&args.market)?;
    let mut config = BacktestConfig::preset(market);

    config.score_method = args.method.parse::<ScoreMethod>()?;
    config.top_n = args.top_n;
    config.weighting = args.weighting.parse()?;
    config.initial_capital = args.capital;
    if let Some(buffer) = args.buffer {
        config.sell_buffer = buffer;
    }
    if let Some(ref freq) = args.freq {
        config.rebalance_freq = freq.parse()?;
    }
    if let Some(cost_bps) = args.cost_bps {
        config.transaction_cost_bps = cost_bps;
    }
    match args.benchmark.as_deref() {
        Some("none") => config.benchmark_symbol = None,
        Some(sym) => config.benchmark_symbol = Some(Symbol::new(sym)),
        None => {}
    }
    config.start_date = data::parse_date_opt(args.start.as_ref())?;
    config.end_date = data::parse_date_opt(args.end.as_ref())?;
    config.validate()?;

    let benchmarks: Vec<Symbol> = config.benchmark_symbol.iter().cloned().collect();
    let market_data = data::load_market_data(market, &args.data_dir, &benchmarks)?;

    let mut engine = BacktestEngine::new(config.clone(), &market_data)?;
    let metrics = engine.run();

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&metrics)?);
        return Ok(());
    }

    println!();
    println!("Backtest: {}", config.label());
    println!("{}", "─".repeat(44));
    println!("Returns:");
    println!("  Total Return:      {:>10.2}%", metrics.total_return * 100.0);
    println!("  CAGR:              {:>10.2}%", metrics.cagr * 100.0);
    println!("Risk:");
    println!(
        "  Annual Volatility: {:>10.2}%",
        metrics.annual_volatility * 100.0
    );
    println!("  Max Drawdown:      {:>10.2}%", metrics.max_drawdown * 100.0);
    println!("  DD Duration:       {:>10} days", metrics.max_dd_duration);
    println!("Risk-adjusted:");
    println!("  Sharpe:            {:>10.2}", metrics.sharpe_ratio);
    println!("  Sortino:           {:>10.2}", metrics.sortino_ratio);
    println!("  Calmar:            {:>10.2}", metrics.calmar_ratio);
    if config.benchmark_symbol.is_some() {
        println!("Relative:");
        println!("  Alpha:             {:>10.4}", metrics.alpha);
        println!("  Beta:              {:>10.4}", metrics.beta);
        println!("  Info Ratio:        {:>10.4}", metrics.information_ratio);
        println!("  Tracking Error:    {:>10.4}", metrics.tracking_error);
    }
    println!("Trading:");
    println!("  Annual Turnover:   {:>10.2}", metrics.annual_turnover);
    println!("  Total Costs:       {:>10.2}", metrics.total_costs);
    println!("  Win Rate:          {:>10.2}%", metrics.win_rate * 100.0);
    println!("  Trades:            {:>10}", metrics.n_trades);
    println!("  Trading Days:      {:>10}", metrics.n_days);
    println!();

    Ok(())
}
