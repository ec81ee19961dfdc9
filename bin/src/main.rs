//! Levanter CLI binary.
//!
//! Drives backtests, parameter sweeps, walk-forward validation, factor
//! studies and fundamental metric computation over local JSON data.

mod cmd;
mod data;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "levanter")]
#[command(about = "Cross-sectional momentum backtesting and factor research", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single backtest
    Backtest {
        /// Directory of <SYMBOL>.json price files
        #[arg(short, long)]
        data_dir: PathBuf,

        /// Market dialect (equities or perpetuals)
        #[arg(short, long, default_value = "equities")]
        market: String,

        /// Scoring method (B or C)
        #[arg(long, default_value = "B")]
        method: String,

        /// Portfolio width
        #[arg(long, default_value = "10")]
        top_n: usize,

        /// Hysteresis sell buffer
        #[arg(long)]
        buffer: Option<usize>,

        /// Rebalance frequency (D, 3D, W, 2W, M)
        #[arg(long)]
        freq: Option<String>,

        /// Weighting (equal or rank_weighted)
        #[arg(long, default_value = "equal")]
        weighting: String,

        /// Single-side transaction cost in basis points
        #[arg(long)]
        cost_bps: Option<f64>,

        /// Initial capital
        #[arg(long, default_value = "1000000")]
        capital: f64,

        /// Benchmark symbol (pass "none" to disable)
        #[arg(long)]
        benchmark: Option<String>,

        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        end: Option<String>,

        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Sweep the parameter grid
    Sweep {
        /// Directory of <SYMBOL>.json price files
        #[arg(short, long)]
        data_dir: PathBuf,

        /// Market dialect (equities or perpetuals)
        #[arg(short, long, default_value = "equities")]
        market: String,

        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        end: Option<String>,

        /// Rows to display
        #[arg(long, default_value = "15")]
        show: usize,

        /// Re-rank the top candidates by robustness
        #[arg(long)]
        robust: bool,

        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Walk-forward validation
    WalkForward {
        /// Directory of <SYMBOL>.json price files
        #[arg(short, long)]
        data_dir: PathBuf,

        /// Market dialect (equities or perpetuals)
        #[arg(short, long, default_value = "equities")]
        market: String,

        /// Training window in months
        #[arg(long, default_value = "36")]
        train_months: u32,

        /// Testing window in months
        #[arg(long, default_value = "12")]
        test_months: u32,

        /// Step in months
        #[arg(long, default_value = "12")]
        step_months: u32,

        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Factor study: IC analysis and event studies
    Study {
        /// Directory of <SYMBOL>.json price files
        #[arg(short, long)]
        data_dir: PathBuf,

        /// Market dialect (equities or perpetuals)
        #[arg(short, long, default_value = "equities")]
        market: String,

        /// Factor names (comma-separated; defaults to all registered)
        #[arg(short, long, value_delimiter = ',')]
        factors: Vec<String>,

        /// Computation frequency (D or W)
        #[arg(long)]
        freq: Option<String>,

        /// Forward horizons in days (comma-separated)
        #[arg(long, value_delimiter = ',')]
        horizons: Vec<usize>,

        /// Number of quantile buckets
        #[arg(long, default_value = "5")]
        quantiles: usize,

        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        end: Option<String>,

        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// List registered factors
    Factors,

    /// Compute derived fundamental metrics
    Metrics {
        /// Directory of <SYMBOL>.json fundamental files
        #[arg(short, long)]
        data_dir: PathBuf,

        /// Symbol to compute
        #[arg(short, long)]
        symbol: String,

        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Backtest {
            data_dir,
            market,
            method,
            top_n,
            buffer,
            freq,
            weighting,
            cost_bps,
            capital,
            benchmark,
            start,
            end,
            format,
        } => cmd::backtest::run(cmd::backtest::Args {
            data_dir,
            market,
            method,
            top_n,
            buffer,
            freq,
            weighting,
            cost_bps,
            capital,
            benchmark,
            start,
            end,
            format,
        }),
        Commands::Sweep {
            data_dir,
            market,
            start,
            end,
            show,
            robust,
            format,
        } => cmd::sweep::run(&data_dir, &market, start, end, show, robust, &format),
        Commands::WalkForward {
            data_dir,
            market,
            train_months,
            test_months,
            step_months,
            format,
        } => cmd::walk_forward::run(
            &data_dir,
            &market,
            train_months,
            test_months,
            step_months,
            &format,
        ),
        Commands::Study {
            data_dir,
            market,
            factors,
            freq,
            horizons,
            quantiles,
            start,
            end,
            format,
        } => cmd::study::run(cmd::study::Args {
            data_dir,
            market,
            factors,
            freq,
            horizons,
            quantiles,
            start,
            end,
            format,
        }),
        Commands::Factors => cmd::factors::run(),
        Commands::Metrics {
            data_dir,
            symbol,
            format,
        } => cmd::metrics::run(&data_dir, &symbol, &format),
    }
}
