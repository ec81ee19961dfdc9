//! Error types for the Levanter framework.
//!
//! Structural emptiness (no scorable symbols, no trading dates) is not an
//! error anywhere in the workspace: those cases propagate as empty results.
//! The only fatal condition is a configuration contradiction, which is
//! rejected at construction time via [`LevanterError::InvalidConfig`].

use thiserror::Error;

/// The main error type for Levanter operations.
#[derive(Debug, Error)]
pub enum LevanterError {
    /// Error due to invalid or malformed data.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Error when data is insufficient for the requested operation.
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// Error when a symbol is not found in the universe.
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    /// Error when a date is out of range or cannot be parsed.
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// Error when a requested factor is not registered.
    #[error("Factor not found: {0}")]
    FactorNotFound(String),

    /// Contradictory configuration, rejected at construction.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Generic error for other cases.
    #[error("Error: {0}")]
    Other(String),
}

impl From<String> for LevanterError {
    fn from(s: String) -> Self {
        Self::Other(s)
    }
}

impl From<&str> for LevanterError {
    fn from(s: &str) -> Self {
        Self::Other(s.to_string())
    }
}

/// A specialized Result type for Levanter operations.
pub type Result<T> = std::result::Result<T, LevanterError>;
