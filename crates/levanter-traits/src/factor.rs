//! Factor trait for cross-sectional scoring.
//!
//! This is the open extension point of the framework: anything that can
//! score a sliced universe on a date can be studied. Built-in factors live
//! in `levanter-signals`; the registry there maps names to constructors.

use std::collections::BTreeMap;

use crate::types::{Date, Symbol, Universe};

/// Metadata describing a factor.
#[derive(Debug, Clone, PartialEq)]
pub struct FactorMeta {
    /// Unique factor name, e.g. `"momentum_zscore"`.
    pub name: &'static str,
    /// Name of the emitted score, e.g. `"rank"`.
    pub score_name: &'static str,
    /// Expected score range (low, high).
    pub score_range: (f64, f64),
    /// Whether higher scores indicate a stronger long signal.
    pub higher_is_stronger: bool,
    /// Minimum bars a symbol needs before this factor scores it.
    pub min_data_days: usize,
}

impl std::fmt::Display for FactorMeta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let dir = if self.higher_is_stronger { "↑" } else { "↓" };
        write!(
            f,
            "{} ({}: {}-{} {})",
            self.name, self.score_name, self.score_range.0, self.score_range.1, dir
        )
    }
}

/// A factor that scores securities cross-sectionally.
///
/// Implementations must be thread-safe (`Send + Sync`) so a study run can
/// fan computation dates out across workers.
///
/// # Contract
///
/// `compute` receives a universe already sliced to `date` (the no-look-ahead
/// gate lives in the adapter, not here) and returns a score per symbol.
/// Symbols without enough data are simply absent from the result; an empty
/// map is a valid outcome, not an error.
pub trait Factor: Send + Sync + std::fmt::Debug {
    /// Factor metadata.
    fn meta(&self) -> FactorMeta;

    /// Computes scores for all scorable symbols at `date`.
    fn compute(&self, universe: &Universe, date: Date) -> BTreeMap<Symbol, f64>;
}
