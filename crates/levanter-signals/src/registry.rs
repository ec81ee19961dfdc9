//! Factor registry.
//!
//! Maps factor names to constructors. Names must be unique; a collision is
//! a configuration error rejected at registration time, not silently
//! overwritten.

use std::collections::BTreeMap;

use levanter_traits::{Factor, LevanterError, MarketDialect, Result};

use crate::factors::{ClenowMomentumFactor, MomentumZScoreFactor};

/// Constructor for a registered factor.
pub type FactorCtor = fn(MarketDialect) -> Box<dyn Factor>;

/// Name → constructor map for factors.
#[derive(Debug, Default)]
pub struct FactorRegistry {
    ctors: BTreeMap<&'static str, FactorCtor>,
}

impl FactorRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ctors: BTreeMap::new(),
        }
    }

    /// Registry pre-populated with the built-in factors.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry
            .register("momentum_zscore", |d| Box::new(MomentumZScoreFactor::new(d)))
            .expect("empty registry has no collisions");
        registry
            .register("clenow_momentum", |d| Box::new(ClenowMomentumFactor::new(d)))
            .expect("empty registry has no collisions");
        registry
    }

    /// Registers a factor constructor under a unique name.
    ///
    /// # Errors
    ///
    /// Returns [`LevanterError::InvalidConfig`] if the name is taken.
    pub fn register(&mut self, name: &'static str, ctor: FactorCtor) -> Result<()> {
        if self.ctors.contains_key(name) {
            return Err(LevanterError::InvalidConfig(format!(
                "factor name collision: {name:?}"
            )));
        }
        self.ctors.insert(name, ctor);
        Ok(())
    }

    /// Instantiates a factor by name for a dialect.
    ///
    /// # Errors
    ///
    /// Returns [`LevanterError::FactorNotFound`] naming the available
    /// factors when the name is unknown.
    pub fn create(&self, name: &str, dialect: MarketDialect) -> Result<Box<dyn Factor>> {
        self.ctors.get(name).map(|ctor| ctor(dialect)).ok_or_else(|| {
            LevanterError::FactorNotFound(format!(
                "{name:?} (available: {})",
                self.names().join(", ")
            ))
        })
    }

    /// Registered factor names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.ctors.keys().copied().collect()
    }
}
