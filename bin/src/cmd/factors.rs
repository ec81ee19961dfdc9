//! `levanter factors` — list the registered factors.

use anyhow::Result;

use levanter_signals::FactorRegistry;
use levanter_traits::MarketDialect;

pub fn run() -> Result<()> {
    let registry = FactorRegistry::with_defaults();

    println!();
    println!("Registered factors:");
    println!("{}", "─".repeat(60));
    for name in registry.names() {
        let factor = registry.create(name, MarketDialect::equities())?;
        let meta = factor.meta();
        println!(
            "  {:<20} {:>3} bars min   score {} in [{}, {}]",
            name,
            meta.min_data_days,
            meta.score_name,
            meta.score_range.0,
            meta.score_range.1
        );
    }
    println!();
    println!("Factors take the market dialect at construction; minimums shown");
    println!("are for the equities dialect.");
    println!();

    Ok(())
}
