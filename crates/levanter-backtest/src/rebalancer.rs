//! Rebalance decisions with a hysteresis buffer.
//!
//! Core rules:
//! 1. Top N by rank are the buy zone.
//! 2. An existing holding is kept while it stays inside the safe zone,
//!    the first `top_n + sell_buffer` ranks.
//! 3. Slots freed by sells are filled from the top of the ranking.
//! 4. Holdings absent from the ranking entirely are sold regardless of
//!    the buffer.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use levanter_traits::{Ranking, Symbol};

use crate::config::Weighting;

/// The action list for one rebalance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebalanceAction {
    /// Symbols to liquidate, ascending.
    pub to_sell: Vec<Symbol>,
    /// Symbols to enter, in rank order.
    pub to_buy: Vec<Symbol>,
    /// Symbols retained, ascending.
    pub to_hold: Vec<Symbol>,
    /// Resulting position count.
    pub target_count: usize,
}

/// Hysteresis-buffer rebalance decision maker.
#[derive(Debug, Clone, Copy)]
pub struct Rebalancer {
    top_n: usize,
    sell_buffer: usize,
}

impl Rebalancer {
    /// Creates a rebalancer with a portfolio width and buffer.
    #[must_use]
    pub const fn new(top_n: usize, sell_buffer: usize) -> Self {
        Self { top_n, sell_buffer }
    }

    /// Computes the action list from a ranking and the current holdings.
    ///
    /// An empty ranking liquidates everything. The ranking is assumed
    /// sorted `(rank desc, symbol asc)`, which [`Ranking`] guarantees.
    #[must_use]
    pub fn compute(&self, ranking: &Ranking, holdings: &BTreeSet<Symbol>) -> RebalanceAction {
        if ranking.is_empty() {
            return RebalanceAction {
                to_sell: holdings.iter().cloned().collect(),
                to_buy: Vec::new(),
                to_hold: Vec::new(),
                target_count: 0,
            };
        }

        let ordered: Vec<&Symbol> = ranking.symbols().collect();
        let universe: BTreeSet<&Symbol> = ordered.iter().copied().collect();

        let safe_size = (self.top_n + self.sell_buffer).min(ordered.len());
        let safe_zone: BTreeSet<&Symbol> = ordered[..safe_size].iter().copied().collect();

        let to_sell: Vec<Symbol> = holdings
            .iter()
            .filter(|sym| !universe.contains(sym) || !safe_zone.contains(sym))
            .cloned()
            .collect();
        let sell_set: BTreeSet<&Symbol> = to_sell.iter().collect();

        let remaining: BTreeSet<&Symbol> = holdings
            .iter()
            .filter(|sym| !sell_set.contains(sym))
            .collect();

        let slots = self.top_n.saturating_sub(remaining.len());
        let mut to_buy = Vec::new();
        if slots > 0 {
            for sym in &ordered[..self.top_n.min(ordered.len())] {
                if !remaining.contains(sym) && !sell_set.contains(sym) {
                    to_buy.push((*sym).clone());
                    if to_buy.len() >= slots {
                        break;
                    }
                }
            }
        }

        let to_hold: Vec<Symbol> = remaining.into_iter().cloned().collect();
        let target_count = to_hold.len() + to_buy.len();

        RebalanceAction {
            to_sell,
            to_buy,
            to_hold,
            target_count,
        }
    }

    /// Target weights over `to_hold ∪ to_buy`.
    ///
    /// `Equal` assigns `1 / target_count`. `RankWeighted` normalizes
    /// `max(rank, 1)` and degrades to equal on a zero denominator. The
    /// returned weights sum to 1 whenever the target set is non-empty.
    #[must_use]
    pub fn compute_weights(
        &self,
        action: &RebalanceAction,
        ranking: &Ranking,
        weighting: Weighting,
    ) -> std::collections::BTreeMap<Symbol, f64> {
        let targets: Vec<&Symbol> = action.to_hold.iter().chain(action.to_buy.iter()).collect();
        if targets.is_empty() {
            return std::collections::BTreeMap::new();
        }

        let equal = |targets: &[&Symbol]| {
            let w = 1.0 / targets.len() as f64;
            targets.iter().map(|s| ((*s).clone(), w)).collect()
        };

        match weighting {
            Weighting::Equal => equal(&targets),
            Weighting::RankWeighted => {
                let raw: Vec<f64> = targets
                    .iter()
                    .map(|&sym| f64::from(ranking.rank_of(sym).unwrap_or(0)).max(1.0))
                    .collect();
                let total: f64 = raw.iter().sum();
                if total <= 0.0 {
                    return equal(&targets);
                }
                targets
                    .iter()
                    .zip(raw)
                    .map(|(sym, r)| ((*sym).clone(), r / total))
                    .collect()
            }
        }
    }
}
