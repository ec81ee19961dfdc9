//! CLI subcommand implementations.

pub mod backtest;
pub mod factors;
pub mod metrics;
pub mod study;
pub mod sweep;
pub mod walk_forward;
