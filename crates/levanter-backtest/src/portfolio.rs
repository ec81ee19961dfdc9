//! Portfolio state: fractional holdings, cash, cost-bearing trades and
//! daily NAV snapshots.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use levanter_traits::{Date, Symbol};

/// Holdings below this share count are evicted.
pub const SHARE_EPSILON: f64 = 1e-10;

/// Trade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    /// Cash out, shares in.
    Buy,
    /// Shares out, cash in.
    Sell,
}

/// One executed trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    /// Execution date.
    pub date: Date,
    /// Traded symbol.
    pub symbol: Symbol,
    /// Direction.
    pub side: Side,
    /// Fractional share count.
    pub shares: f64,
    /// Execution price.
    pub price: f64,
    /// Transaction cost in cash units.
    pub cost: f64,
    /// Gross notional of the trade.
    pub notional: f64,
}

/// One end-of-day snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Snapshot date.
    pub date: Date,
    /// Net asset value: cash plus marked holdings.
    pub nav: f64,
    /// Cash component.
    pub cash: f64,
    /// Number of open positions.
    pub n_holdings: usize,
}

/// Fractional-share portfolio with single-sided transaction costs.
///
/// Single-use: one portfolio per engine run. Every operation appends
/// exactly one trade record, so `total_costs` always equals the sum of
/// per-trade costs.
#[derive(Debug, Clone)]
pub struct Portfolio {
    initial_capital: f64,
    cash: f64,
    cost_rate: f64,
    holdings: BTreeMap<Symbol, f64>,
    trades: Vec<Trade>,
    snapshots: Vec<Snapshot>,
}

impl Portfolio {
    /// Creates a portfolio with starting cash and a single-side cost rate.
    #[must_use]
    pub const fn new(initial_capital: f64, cost_rate: f64) -> Self {
        Self {
            initial_capital,
            cash: initial_capital,
            cost_rate,
            holdings: BTreeMap::new(),
            trades: Vec::new(),
            snapshots: Vec::new(),
        }
    }

    /// Buys up to `notional` worth of a symbol.
    ///
    /// Cost is `notional × cost_rate`; shares acquired are
    /// `(notional − cost) / price` and cash decreases by `notional`. When
    /// `notional` exceeds available cash the buy degrades to spending all
    /// remaining cash with the cost carved out of it — the portfolio never
    /// overdraws. Non-positive price or notional is a no-op returning 0.
    ///
    /// Returns the shares acquired.
    pub fn buy(&mut self, symbol: &Symbol, notional: f64, price: f64, date: Date) -> f64 {
        if price <= 0.0 || notional <= 0.0 {
            return 0.0;
        }

        let mut notional = notional;
        let mut cost = notional * self.cost_rate;
        let mut net = notional - cost;

        if notional > self.cash {
            // Spend what is left, cost inclusive
            let available = self.cash / (1.0 + self.cost_rate);
            if available <= 0.0 {
                return 0.0;
            }
            cost = self.cash - available;
            net = available;
            notional = self.cash;
        }

        let shares = net / price;
        self.cash -= net + cost;
        *self.holdings.entry(symbol.clone()).or_insert(0.0) += shares;

        self.trades.push(Trade {
            date,
            symbol: symbol.clone(),
            side: Side::Buy,
            shares,
            price,
            cost,
            notional,
        });
        shares
    }

    /// Sells up to `shares` of a symbol, clipping to the held quantity.
    ///
    /// Cash increases by `gross − cost` with `cost = gross × cost_rate`.
    /// Residual holdings below [`SHARE_EPSILON`] are evicted. Non-positive
    /// price or share count, or an absent position, is a no-op returning 0.
    ///
    /// Returns the net cash received.
    pub fn sell(&mut self, symbol: &Symbol, shares: f64, price: f64, date: Date) -> f64 {
        if price <= 0.0 || shares <= 0.0 {
            return 0.0;
        }
        let Some(&current) = self.holdings.get(symbol) else {
            return 0.0;
        };
        if current <= 0.0 {
            return 0.0;
        }

        let actual = shares.min(current);
        let gross = actual * price;
        let cost = gross * self.cost_rate;
        let net = gross - cost;

        self.cash += net;
        let remaining = current - actual;
        if remaining < SHARE_EPSILON {
            self.holdings.remove(symbol);
        } else {
            self.holdings.insert(symbol.clone(), remaining);
        }

        self.trades.push(Trade {
            date,
            symbol: symbol.clone(),
            side: Side::Sell,
            shares: actual,
            price,
            cost,
            notional: gross,
        });
        net
    }

    /// Sells the entire position in a symbol.
    pub fn sell_all(&mut self, symbol: &Symbol, price: f64, date: Date) -> f64 {
        match self.holdings.get(symbol) {
            Some(&shares) if shares > 0.0 => self.sell(symbol, shares, price, date),
            _ => 0.0,
        }
    }

    /// Net asset value at the given prices.
    ///
    /// Holdings without a quoted price contribute zero.
    #[must_use]
    pub fn compute_nav(&self, prices: &BTreeMap<Symbol, f64>) -> f64 {
        let market_value: f64 = self
            .holdings
            .iter()
            .map(|(sym, shares)| shares * prices.get(sym).copied().unwrap_or(0.0))
            .sum();
        self.cash + market_value
    }

    /// Appends and returns the end-of-day snapshot.
    pub fn take_snapshot(&mut self, date: Date, prices: &BTreeMap<Symbol, f64>) -> Snapshot {
        let snap = Snapshot {
            date,
            nav: self.compute_nav(prices),
            cash: self.cash,
            n_holdings: self.holdings.len(),
        };
        self.snapshots.push(snap);
        snap
    }

    /// Starting cash.
    #[must_use]
    pub const fn initial_capital(&self) -> f64 {
        self.initial_capital
    }

    /// Current cash.
    #[must_use]
    pub const fn cash(&self) -> f64 {
        self.cash
    }

    /// Open positions.
    #[must_use]
    pub const fn holdings(&self) -> &BTreeMap<Symbol, f64> {
        &self.holdings
    }

    /// Shares held in a symbol (zero if absent).
    #[must_use]
    pub fn shares(&self, symbol: &Symbol) -> f64 {
        self.holdings.get(symbol).copied().unwrap_or(0.0)
    }

    /// All executed trades in order.
    #[must_use]
    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    /// All snapshots in date order.
    #[must_use]
    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    /// Number of executed trades.
    #[must_use]
    pub fn total_trades(&self) -> usize {
        self.trades.len()
    }

    /// Sum of all per-trade costs.
    #[must_use]
    pub fn total_costs(&self) -> f64 {
        self.trades.iter().map(|t| t.cost).sum()
    }

    /// The `(date, nav)` series from the snapshots.
    #[must_use]
    pub fn nav_series(&self) -> Vec<(Date, f64)> {
        self.snapshots.iter().map(|s| (s.date, s.nav)).collect()
    }
}
