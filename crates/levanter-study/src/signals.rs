//! Discrete signal rules over score histories.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use levanter_traits::{Date, Symbol};

/// The four signal rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    /// `score > threshold` on the observation date.
    Threshold,
    /// `prev ≤ threshold < curr`.
    CrossUp,
    /// `prev ≥ threshold > curr`.
    CrossDown,
    /// First date of `sustained_n` consecutive observations above the
    /// threshold; re-arms only after the streak breaks.
    Sustained,
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Threshold => f.write_str("threshold"),
            Self::CrossUp => f.write_str("cross_up"),
            Self::CrossDown => f.write_str("cross_down"),
            Self::Sustained => f.write_str("sustained"),
        }
    }
}

/// One signal rule instance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalDefinition {
    /// The rule.
    pub kind: SignalKind,
    /// The score threshold.
    pub threshold: f64,
    /// Consecutive observations required for [`SignalKind::Sustained`].
    pub sustained_n: usize,
}

impl SignalDefinition {
    /// Creates a non-sustained signal definition.
    #[must_use]
    pub const fn new(kind: SignalKind, threshold: f64) -> Self {
        Self {
            kind,
            threshold,
            sustained_n: 1,
        }
    }

    /// Creates a sustained signal definition.
    #[must_use]
    pub const fn sustained(threshold: f64, n: usize) -> Self {
        Self {
            kind: SignalKind::Sustained,
            threshold,
            sustained_n: n,
        }
    }

    /// Readable label, e.g. `threshold_90` or `sustained_80x3`.
    #[must_use]
    pub fn label(&self) -> String {
        match self.kind {
            SignalKind::Sustained => {
                format!("{}_{}x{}", self.kind, self.threshold, self.sustained_n)
            }
            _ => format!("{}_{}", self.kind, self.threshold),
        }
    }
}

/// Per-symbol event dates detected by a rule over score histories.
///
/// Histories are ordered `(date, score)` pairs; events come back in the
/// same order.
#[must_use]
pub fn detect_signals(
    score_history: &BTreeMap<Symbol, Vec<(Date, f64)>>,
    def: &SignalDefinition,
) -> BTreeMap<Symbol, Vec<Date>> {
    let mut events = BTreeMap::new();
    for (symbol, history) in score_history {
        if history.is_empty() {
            continue;
        }
        let symbol_events = detect_for_symbol(history, def);
        if !symbol_events.is_empty() {
            events.insert(symbol.clone(), symbol_events);
        }
    }
    events
}

fn detect_for_symbol(history: &[(Date, f64)], def: &SignalDefinition) -> Vec<Date> {
    let threshold = def.threshold;
    let mut events = Vec::new();

    match def.kind {
        SignalKind::Threshold => {
            for &(date, score) in history {
                if score > threshold {
                    events.push(date);
                }
            }
        }
        SignalKind::CrossUp => {
            for pair in history.windows(2) {
                let (prev, curr) = (pair[0].1, pair[1].1);
                if prev <= threshold && threshold < curr {
                    events.push(pair[1].0);
                }
            }
        }
        SignalKind::CrossDown => {
            for pair in history.windows(2) {
                let (prev, curr) = (pair[0].1, pair[1].1);
                if prev >= threshold && threshold > curr {
                    events.push(pair[1].0);
                }
            }
        }
        SignalKind::Sustained => {
            let n = def.sustained_n;
            if n < 1 {
                return events;
            }
            // At most one event per unbroken streak
            let mut consecutive = 0;
            let mut triggered = false;
            for &(date, score) in history {
                if score > threshold {
                    consecutive += 1;
                    if consecutive >= n && !triggered {
                        events.push(date);
                        triggered = true;
                    }
                } else {
                    consecutive = 0;
                    triggered = false;
                }
            }
        }
    }
    events
}

/// Default signal sweep for a factor, keyed by factor name.
///
/// The built-in momentum rank factors share one grid over the rank scale;
/// unknown factors get an empty sweep.
#[must_use]
pub fn default_sweep(factor_name: &str) -> Vec<SignalDefinition> {
    match factor_name {
        "momentum_zscore" | "clenow_momentum" => {
            let mut sweep = Vec::new();
            for t in [70.0, 80.0, 90.0] {
                sweep.push(SignalDefinition::new(SignalKind::Threshold, t));
            }
            for t in [70.0, 80.0, 90.0] {
                sweep.push(SignalDefinition::new(SignalKind::CrossUp, t));
            }
            for t in [10.0, 20.0, 30.0] {
                sweep.push(SignalDefinition::new(SignalKind::CrossDown, t));
            }
            for (t, n) in [(70.0, 3), (70.0, 5), (80.0, 3), (80.0, 5), (90.0, 3)] {
                sweep.push(SignalDefinition::sustained(t, n));
            }
            sweep
        }
        _ => Vec::new(),
    }
}

/// Builds a custom sweep from thresholds and rule kinds.
#[must_use]
pub fn build_custom_sweep(
    thresholds: &[f64],
    kinds: &[SignalKind],
    sustained_ns: &[usize],
) -> Vec<SignalDefinition> {
    let mut sweep = Vec::new();
    for &t in thresholds {
        for &kind in kinds {
            match kind {
                SignalKind::Sustained => {
                    for &n in sustained_ns {
                        sweep.push(SignalDefinition::sustained(t, n));
                    }
                }
                _ => sweep.push(SignalDefinition::new(kind, t)),
            }
        }
    }
    sweep
}
