//! Raw quarterly statement rows.
//!
//! Field names follow the provider's snake_case schema; missing values
//! are null in the input and `None` here.

use serde::{Deserialize, Serialize};

use levanter_traits::Date;

/// One quarterly income statement row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IncomeRow {
    /// Quarter end date.
    pub date: Date,
    /// Fiscal period, e.g. `"Q2"`.
    pub period: String,
    /// Fiscal year the period belongs to.
    pub fiscal_year: Option<i32>,
    /// Total revenue.
    pub revenue: Option<f64>,
    /// Revenue minus cost of revenue.
    pub gross_profit: Option<f64>,
    /// Cost of revenue.
    pub cost_of_revenue: Option<f64>,
    /// Operating income.
    pub operating_income: Option<f64>,
    /// Net income.
    pub net_income: Option<f64>,
    /// EBITDA.
    pub ebitda: Option<f64>,
    /// Income tax expense.
    pub income_tax_expense: Option<f64>,
    /// Pre-tax income.
    pub income_before_tax: Option<f64>,
    /// Diluted earnings per share.
    pub eps_diluted: Option<f64>,
}

/// One quarterly balance sheet row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BalanceRow {
    /// Quarter end date.
    pub date: Date,
    /// Total stockholders' equity.
    pub total_stockholders_equity: Option<f64>,
    /// Total assets.
    pub total_assets: Option<f64>,
    /// Total debt.
    pub total_debt: Option<f64>,
    /// Cash and cash equivalents.
    pub cash_and_cash_equivalents: Option<f64>,
    /// Total current assets.
    pub total_current_assets: Option<f64>,
    /// Total current liabilities.
    pub total_current_liabilities: Option<f64>,
    /// Inventory.
    pub inventory: Option<f64>,
    /// Net receivables.
    pub net_receivables: Option<f64>,
}

/// One quarterly cash flow row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CashFlowRow {
    /// Quarter end date.
    pub date: Date,
    /// Free cash flow.
    pub free_cash_flow: Option<f64>,
    /// Operating cash flow.
    pub operating_cash_flow: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_income_row_null_fields_deserialize() {
        let json = r#"{
            "date": "2024-03-30",
            "period": "Q2",
            "fiscal_year": 2024,
            "revenue": 1000.0,
            "net_income": null
        }"#;
        let row: IncomeRow = serde_json::from_str(json).unwrap();
        assert_eq!(row.revenue, Some(1000.0));
        assert_eq!(row.net_income, None);
        assert_eq!(row.ebitda, None);
        assert_eq!(row.period, "Q2");
    }
}
