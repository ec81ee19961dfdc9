//! The derived-metric calculator.
//!
//! Consumes statement rows ordered newest first and emits one metric row
//! per income row in three passes: point-in-time ratios and YoY growth,
//! then QoQ comparisons against the immediately preceding row, then
//! trailing-4Q CAGR and margin changes.
//!
//! YoY matching is on `(period, fiscal_year − 1)`, never on date offsets,
//! which is what keeps non-standard fiscal year ends (September, January)
//! aligned.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use levanter_traits::{Date, Symbol};

use crate::statements::{BalanceRow, CashFlowRow, IncomeRow};

/// One derived metric row, keyed by `(symbol, date)`.
///
/// Every derived field is absent — not zero — when its inputs are missing
/// or its denominator vanishes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricRow {
    /// Symbol the row belongs to.
    pub symbol: Symbol,
    /// Quarter end date.
    pub date: Date,
    /// Fiscal period, e.g. `"Q2"`.
    pub period: String,
    /// Fiscal year.
    pub fiscal_year: Option<i32>,

    // Margins
    /// Gross profit over revenue.
    pub gross_margin: Option<f64>,
    /// Operating income over revenue.
    pub operating_margin: Option<f64>,
    /// Net income over revenue.
    pub net_margin: Option<f64>,
    /// EBITDA over revenue.
    pub ebitda_margin: Option<f64>,

    // Returns (TTM preferred)
    /// TTM net income over average equity.
    pub roe: Option<f64>,
    /// TTM net income over average assets.
    pub roa: Option<f64>,
    /// NOPAT over invested capital.
    pub roic: Option<f64>,

    // Leverage
    /// Total debt over equity.
    pub debt_to_equity: Option<f64>,
    /// Total debt over assets.
    pub debt_to_assets: Option<f64>,
    /// Current assets over current liabilities.
    pub current_ratio: Option<f64>,
    /// Current assets less inventory over current liabilities.
    pub quick_ratio: Option<f64>,

    // Efficiency (trailing four quarters)
    /// TTM revenue over average assets.
    pub asset_turnover: Option<f64>,
    /// TTM cost of revenue over average inventory.
    pub inventory_turnover: Option<f64>,
    /// TTM revenue over average receivables.
    pub receivables_turnover: Option<f64>,

    // Growth YoY, matched on (period, fiscal_year − 1)
    /// Revenue growth year over year.
    pub revenue_growth_yoy: Option<f64>,
    /// Net income growth year over year.
    pub net_income_growth_yoy: Option<f64>,
    /// Diluted EPS growth year over year.
    pub eps_growth_yoy: Option<f64>,
    /// Operating income growth year over year.
    pub operating_income_growth_yoy: Option<f64>,

    // Cash flow
    /// Free cash flow over revenue.
    pub fcf_margin: Option<f64>,
    /// Free cash flow over net income.
    pub fcf_to_net_income: Option<f64>,
    /// Operating cash flow over revenue.
    pub operating_cf_to_revenue: Option<f64>,

    // Growth QoQ versus the immediately preceding row
    /// Revenue growth quarter over quarter.
    pub revenue_growth_qoq: Option<f64>,
    /// Net income growth quarter over quarter.
    pub net_income_growth_qoq: Option<f64>,
    /// Diluted EPS growth quarter over quarter.
    pub eps_growth_qoq: Option<f64>,
    /// Operating income growth quarter over quarter.
    pub operating_income_growth_qoq: Option<f64>,

    // Margin and return deltas QoQ, decimal percentage points
    /// Gross margin change versus the prior quarter.
    pub gross_margin_delta_qoq: Option<f64>,
    /// Operating margin change versus the prior quarter.
    pub operating_margin_delta_qoq: Option<f64>,
    /// Net margin change versus the prior quarter.
    pub net_margin_delta_qoq: Option<f64>,
    /// EBITDA margin change versus the prior quarter.
    pub ebitda_margin_delta_qoq: Option<f64>,
    /// ROE change versus the prior quarter.
    pub roe_delta_qoq: Option<f64>,
    /// ROIC change versus the prior quarter.
    pub roic_delta_qoq: Option<f64>,

    // Trailing-4Q CAGR (compound rate over 3 transitions)
    /// Revenue CAGR over the trailing four quarters.
    pub revenue_cagr_4q: Option<f64>,
    /// Gross profit CAGR over the trailing four quarters.
    pub gross_profit_cagr_4q: Option<f64>,
    /// Operating income CAGR over the trailing four quarters.
    pub operating_income_cagr_4q: Option<f64>,
    /// EBITDA CAGR over the trailing four quarters.
    pub ebitda_cagr_4q: Option<f64>,
    /// Net income CAGR over the trailing four quarters.
    pub net_income_cagr_4q: Option<f64>,
    /// Diluted EPS CAGR over the trailing four quarters.
    pub eps_cagr_4q: Option<f64>,

    // Trailing-4Q margin change, decimal percentage points
    /// Gross margin change over the trailing four quarters.
    pub gross_margin_change_4q: Option<f64>,
    /// Operating margin change over the trailing four quarters.
    pub operating_margin_change_4q: Option<f64>,
    /// Net margin change over the trailing four quarters.
    pub net_margin_change_4q: Option<f64>,
    /// EBITDA margin change over the trailing four quarters.
    pub ebitda_margin_change_4q: Option<f64>,
}

/// Division that treats a missing operand or zero denominator as absent.
fn safe_div(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    let n = numerator?;
    let d = denominator?;
    if d == 0.0 {
        return None;
    }
    Some(n / d)
}

/// Average of two values, absent if either is missing.
fn avg(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    Some((a? + b?) / 2.0)
}

/// Sum of a field across the first `n` rows; absent if fewer rows exist
/// or any value is missing.
fn sum_last_n(rows: &[IncomeRow], field: fn(&IncomeRow) -> Option<f64>, n: usize) -> Option<f64> {
    if rows.len() < n {
        return None;
    }
    rows[..n].iter().map(field).sum()
}

/// Growth rate `(current − prior) / |prior|`; absent when the prior value
/// is zero or either side is missing.
fn growth(current: Option<f64>, prior: Option<f64>) -> Option<f64> {
    let c = current?;
    let p = prior?;
    if p == 0.0 {
        return None;
    }
    Some((c - p) / p.abs())
}

/// Compound per-period growth rate over `periods` transitions; absent on
/// a non-positive base or negative current value.
fn cagr(current: Option<f64>, base: Option<f64>, periods: u32) -> Option<f64> {
    let c = current?;
    let b = base?;
    if b <= 0.0 || c < 0.0 {
        return None;
    }
    Some((c / b).powf(1.0 / f64::from(periods)) - 1.0)
}

/// Difference in decimal percentage points; absent if either is missing.
fn delta(current: Option<f64>, prior: Option<f64>) -> Option<f64> {
    Some(current? - prior?)
}

/// The row matching `(period, fiscal_year − 1)` for YoY comparison.
fn find_yoy_match<'a>(
    rows: &'a [IncomeRow],
    period: &str,
    fiscal_year: Option<i32>,
) -> Option<&'a IncomeRow> {
    let prior_fy = fiscal_year? - 1;
    rows.iter()
        .find(|row| row.period == period && row.fiscal_year == Some(prior_fy))
}

/// Mimics a "use TTM when it is available and non-zero" gate.
fn nonzero(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v != 0.0)
}

/// Computes the full metric table for one symbol.
///
/// Statement rows must be ordered newest first; balance sheet and cash
/// flow rows are joined on the income row's date.
#[must_use]
pub fn compute_metrics(
    symbol: &Symbol,
    income: &[IncomeRow],
    balance: &[BalanceRow],
    cash_flow: &[CashFlowRow],
) -> Vec<MetricRow> {
    if income.is_empty() {
        return Vec::new();
    }

    let bs_by_date: BTreeMap<Date, &BalanceRow> =
        balance.iter().map(|r| (r.date, r)).collect();
    let cf_by_date: BTreeMap<Date, &CashFlowRow> =
        cash_flow.iter().map(|r| (r.date, r)).collect();
    let empty_bs = BalanceRow::default();

    let mut results: Vec<MetricRow> = Vec::with_capacity(income.len());

    // Pass 1: ratios, TTM returns, YoY
    for (idx, inc) in income.iter().enumerate() {
        let bs = bs_by_date.get(&inc.date).copied().unwrap_or(&empty_bs);
        let cf = cf_by_date.get(&inc.date).copied();

        let mut m = MetricRow {
            symbol: symbol.clone(),
            date: inc.date,
            period: inc.period.clone(),
            fiscal_year: inc.fiscal_year,
            ..MetricRow::default()
        };

        let revenue = inc.revenue;

        m.gross_margin = safe_div(inc.gross_profit, revenue);
        m.operating_margin = safe_div(inc.operating_income, revenue);
        m.net_margin = safe_div(inc.net_income, revenue);
        m.ebitda_margin = safe_div(inc.ebitda, revenue);

        // The balance sheet at the start of the TTM window is the one at
        // the end of the quarter before it
        let prior_bs = income
            .get(idx + 4)
            .and_then(|row| bs_by_date.get(&row.date))
            .copied()
            .unwrap_or(&empty_bs);

        let ttm_ni = sum_last_n(&income[idx..], |r| r.net_income, 4);
        match ttm_ni {
            Some(ttm) => {
                let avg_equity = avg(
                    bs.total_stockholders_equity,
                    prior_bs.total_stockholders_equity,
                );
                let avg_assets = avg(bs.total_assets, prior_bs.total_assets);
                m.roe = safe_div(Some(ttm), avg_equity);
                m.roa = safe_div(Some(ttm), avg_assets);
            }
            None => {
                // Fallback: annualize the single quarter
                let annualized = inc.net_income.map(|ni| ni * 4.0);
                m.roe = safe_div(annualized, bs.total_stockholders_equity);
                m.roa = safe_div(annualized, bs.total_assets);
            }
        }

        // ROIC = NOPAT / invested capital
        let eff_tax = safe_div(inc.income_tax_expense, inc.income_before_tax);
        m.roic = match (inc.operating_income, eff_tax) {
            (Some(op), Some(tax)) => {
                let nopat = op * (1.0 - tax);
                let invested = bs.total_stockholders_equity.unwrap_or(0.0)
                    + bs.total_debt.unwrap_or(0.0)
                    - bs.cash_and_cash_equivalents.unwrap_or(0.0);
                if invested == 0.0 {
                    None
                } else {
                    Some(nopat / invested)
                }
            }
            _ => None,
        };

        m.debt_to_equity = safe_div(bs.total_debt, bs.total_stockholders_equity);
        m.debt_to_assets = safe_div(bs.total_debt, bs.total_assets);
        m.current_ratio = safe_div(bs.total_current_assets, bs.total_current_liabilities);
        m.quick_ratio = match (bs.total_current_assets, bs.total_current_liabilities) {
            (Some(ca), Some(cl)) => {
                safe_div(Some(ca - bs.inventory.unwrap_or(0.0)), Some(cl))
            }
            _ => None,
        };

        let ttm_rev = sum_last_n(&income[idx..], |r| r.revenue, 4);
        let ttm_cogs = sum_last_n(&income[idx..], |r| r.cost_of_revenue, 4);
        let avg_assets = avg(bs.total_assets, prior_bs.total_assets);

        m.asset_turnover = match nonzero(ttm_rev) {
            Some(ttm) => safe_div(Some(ttm), avg_assets),
            None => safe_div(Some(revenue.unwrap_or(0.0) * 4.0), bs.total_assets),
        };
        m.inventory_turnover = nonzero(ttm_cogs)
            .and_then(|ttm| safe_div(Some(ttm), avg(bs.inventory, prior_bs.inventory)));
        m.receivables_turnover = nonzero(ttm_rev)
            .and_then(|ttm| safe_div(Some(ttm), avg(bs.net_receivables, prior_bs.net_receivables)));

        if let Some(prior) = find_yoy_match(income, &inc.period, inc.fiscal_year) {
            m.revenue_growth_yoy = growth(revenue, prior.revenue);
            m.net_income_growth_yoy = growth(inc.net_income, prior.net_income);
            m.eps_growth_yoy = growth(inc.eps_diluted, prior.eps_diluted);
            m.operating_income_growth_yoy =
                growth(inc.operating_income, prior.operating_income);
        }

        let fcf = cf.and_then(|r| r.free_cash_flow);
        let op_cf = cf.and_then(|r| r.operating_cash_flow);
        m.fcf_margin = safe_div(fcf, revenue);
        m.fcf_to_net_income = safe_div(fcf, inc.net_income);
        m.operating_cf_to_revenue = safe_div(op_cf, revenue);

        results.push(m);
    }

    // Pass 2: QoQ against the immediately preceding (older) row
    for i in 0..results.len() {
        if i + 1 >= results.len() {
            continue;
        }
        let prev = results[i + 1].clone();
        let (inc_cur, inc_prev) = (&income[i], &income[i + 1]);
        let m = &mut results[i];

        m.revenue_growth_qoq = growth(inc_cur.revenue, inc_prev.revenue);
        m.net_income_growth_qoq = growth(inc_cur.net_income, inc_prev.net_income);
        m.eps_growth_qoq = growth(inc_cur.eps_diluted, inc_prev.eps_diluted);
        m.operating_income_growth_qoq =
            growth(inc_cur.operating_income, inc_prev.operating_income);

        m.gross_margin_delta_qoq = delta(m.gross_margin, prev.gross_margin);
        m.operating_margin_delta_qoq = delta(m.operating_margin, prev.operating_margin);
        m.net_margin_delta_qoq = delta(m.net_margin, prev.net_margin);
        m.ebitda_margin_delta_qoq = delta(m.ebitda_margin, prev.ebitda_margin);
        m.roe_delta_qoq = delta(m.roe, prev.roe);
        m.roic_delta_qoq = delta(m.roic, prev.roic);
    }

    // Pass 3: trailing-4Q CAGR and margin change (row i versus row i+3)
    for i in 0..results.len() {
        if i + 3 >= results.len() {
            continue;
        }
        let base = results[i + 3].clone();
        let (inc_cur, inc_base) = (&income[i], &income[i + 3]);
        let m = &mut results[i];

        m.revenue_cagr_4q = cagr(inc_cur.revenue, inc_base.revenue, 3);
        m.gross_profit_cagr_4q = cagr(inc_cur.gross_profit, inc_base.gross_profit, 3);
        m.operating_income_cagr_4q =
            cagr(inc_cur.operating_income, inc_base.operating_income, 3);
        m.ebitda_cagr_4q = cagr(inc_cur.ebitda, inc_base.ebitda, 3);
        m.net_income_cagr_4q = cagr(inc_cur.net_income, inc_base.net_income, 3);
        m.eps_cagr_4q = cagr(inc_cur.eps_diluted, inc_base.eps_diluted, 3);

        m.gross_margin_change_4q = delta(m.gross_margin, base.gross_margin);
        m.operating_margin_change_4q = delta(m.operating_margin, base.operating_margin);
        m.net_margin_change_4q = delta(m.net_margin, base.net_margin);
        m.ebitda_margin_change_4q = delta(m.ebitda_margin, base.ebitda_margin);
    }

    results
}
