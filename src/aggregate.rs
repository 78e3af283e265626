//! Budget metrics and the chart series derived from API payloads.
//!
//! The backend normally ships `spent_amount`, `remaining_amount` and `percentage_used` with
//! every budget; when it doesn't, [`compute_budget_metrics`] derives them with the same
//! rounding so the two never disagree.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{
    AnalysisSummary, Budget, BudgetComparison, CategoryTotal, EntryType, FinancialSummary,
    Totals, Transaction, amount,
};

/// Bars shown in the category breakdown and budget comparison charts.
pub const COMPARISON_LIMIT: usize = 5;
/// Budgets shown in the compact dashboard overview.
pub const OVERVIEW_LIMIT: usize = 3;
/// Above this share of the budget a row is flagged as nearly spent.
pub const WARNING_PERCENT: f64 = 80.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BudgetMetrics {
    pub spent_amount: f64,
    pub remaining_amount: f64,
    pub percentage_used: f64,
    pub over_budget: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetHealth {
    Healthy,
    Warning,
    Over,
}

impl BudgetHealth {
    pub fn from_percentage(percentage_used: f64) -> Self {
        if percentage_used > 100.0 {
            BudgetHealth::Over
        } else if percentage_used > WARNING_PERCENT {
            BudgetHealth::Warning
        } else {
            BudgetHealth::Healthy
        }
    }
}

fn round_cents(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// `100 * spent / amount`, 0 for an empty budget, never negative or non-finite.
pub fn percentage_used(amount: f64, spent: f64) -> f64 {
    if amount <= 0.0 || !amount.is_finite() || !spent.is_finite() {
        return 0.0;
    }
    let pct = spent / amount * 100.0;
    if pct.is_finite() { pct.max(0.0) } else { 0.0 }
}

/// Whether `t` counts against `budget`: an expense dated inside the budget's month, in the
/// budget's category (or any category for an all-categories budget).
pub fn counts_against(budget: &Budget, t: &Transaction) -> bool {
    t.entry_type == EntryType::Expense
        && budget.period().contains(t.date)
        && budget.category.is_none_or(|c| t.category == Some(c))
}

pub fn metrics_from_spent(amount: f64, spent: f64) -> BudgetMetrics {
    let percentage = percentage_used(amount, spent);
    BudgetMetrics {
        spent_amount: spent,
        remaining_amount: amount - spent,
        percentage_used: percentage,
        over_budget: percentage > 100.0,
    }
}

pub fn compute_budget_metrics(budget: &Budget, transactions: &[Transaction]) -> BudgetMetrics {
    let spent = round_cents(
        transactions
            .iter()
            .filter(|t| counts_against(budget, t))
            .map(|t| t.amount)
            .sum(),
    );
    metrics_from_spent(budget.amount, spent)
}

/// Metrics for a budget, preferring whatever the backend already supplied.
pub fn budget_metrics(budget: &Budget, transactions: Option<&[Transaction]>) -> BudgetMetrics {
    let spent = match (budget.spent_amount, transactions) {
        (Some(spent), _) => spent,
        (None, Some(txns)) => compute_budget_metrics(budget, txns).spent_amount,
        (None, None) => 0.0,
    };
    let derived = metrics_from_spent(budget.amount, spent);
    let percentage = budget
        .percentage_used
        .filter(|p| p.is_finite())
        .map(|p| p.max(0.0))
        .unwrap_or(derived.percentage_used);
    BudgetMetrics {
        spent_amount: spent,
        remaining_amount: budget.remaining_amount.unwrap_or(derived.remaining_amount),
        percentage_used: percentage,
        over_budget: percentage > 100.0,
    }
}

/// Fills only the derived fields the backend left out.
pub fn with_metrics(budget: &Budget, transactions: &[Transaction]) -> Budget {
    let m = budget_metrics(budget, Some(transactions));
    Budget {
        spent_amount: Some(m.spent_amount),
        remaining_amount: Some(m.remaining_amount),
        percentage_used: Some(m.percentage_used),
        ..budget.clone()
    }
}

pub fn needs_metrics(budget: &Budget) -> bool {
    budget.spent_amount.is_none()
        || budget.remaining_amount.is_none()
        || budget.percentage_used.is_none()
}

/// Share of a progress bar to fill, capped at a full bar.
pub fn progress_fraction(percentage_used: f64) -> f64 {
    (percentage_used.clamp(0.0, 100.0)) / 100.0
}

/// The first `limit` items, order untouched.
pub fn truncate<T>(series: &[T], limit: usize) -> &[T] {
    &series[..series.len().min(limit)]
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawTotals {
    #[serde(deserialize_with = "amount::optional")]
    total_budgeted: Option<f64>,
    #[serde(deserialize_with = "amount::optional")]
    total_spent: Option<f64>,
    #[serde(deserialize_with = "amount::optional")]
    total_remaining: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawAnalysis {
    summary: Option<RawTotals>,
    #[serde(flatten)]
    flat: RawTotals,
    category_breakdown: Option<Vec<CategoryTotal>>,
    budget_comparison: Option<Vec<BudgetComparison>>,
}

/// Typed view of the budget-analysis payload.
///
/// Totals may sit under `summary` or at the top level; missing sequences come back empty.
pub fn summarize(payload: &Value) -> crate::Result<AnalysisSummary> {
    if payload.is_null() {
        return Ok(AnalysisSummary::default());
    }
    let raw: RawAnalysis = serde_json::from_value(payload.clone())?;
    let totals = raw.summary.unwrap_or_default();
    let total_budgeted = totals.total_budgeted.or(raw.flat.total_budgeted).unwrap_or(0.0);
    let total_spent = totals.total_spent.or(raw.flat.total_spent).unwrap_or(0.0);
    let total_remaining = totals
        .total_remaining
        .or(raw.flat.total_remaining)
        .unwrap_or(total_budgeted - total_spent);

    Ok(AnalysisSummary {
        total_budgeted,
        total_spent,
        total_remaining,
        category_breakdown: raw.category_breakdown.unwrap_or_default(),
        budget_comparison: raw.budget_comparison.unwrap_or_default(),
    })
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawFinancialSummary {
    totals: Option<Totals>,
    category_breakdown: Option<Vec<CategoryTotal>>,
}

/// Typed view of the dashboard summary payload.
pub fn summarize_financial(payload: &Value) -> crate::Result<FinancialSummary> {
    if payload.is_null() {
        return Ok(FinancialSummary::default());
    }
    let raw: RawFinancialSummary = serde_json::from_value(payload.clone())?;
    Ok(FinancialSummary {
        totals: raw.totals.unwrap_or_default(),
        category_breakdown: raw.category_breakdown.unwrap_or_default(),
    })
}

/// Budget-vs-spent pairs for a set of budget records, in input order.
pub fn comparison_rows(budgets: &[Budget], transactions: Option<&[Transaction]>) -> Vec<BudgetComparison> {
    budgets
        .iter()
        .map(|b| {
            let m = budget_metrics(b, transactions);
            BudgetComparison {
                budget_name: b.name.clone(),
                budgeted_amount: b.amount,
                spent_amount: m.spent_amount,
                over_budget: m.over_budget,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BudgetId, CategoryId, TransactionId};
    use chrono::NaiveDate;
    use serde_json::json;

    fn budget(amount: f64, category: Option<u64>) -> Budget {
        Budget {
            id: BudgetId::new(1),
            name: "Groceries".into(),
            amount,
            category: category.map(CategoryId::new),
            category_name: None,
            month: 1,
            year: 2024,
            spent_amount: None,
            remaining_amount: None,
            percentage_used: None,
        }
    }

    fn txn(id: u64, amount: f64, kind: EntryType, category: u64, date: (i32, u32, u32)) -> Transaction {
        Transaction {
            id: TransactionId::new(id),
            title: format!("t{id}"),
            description: None,
            amount,
            entry_type: kind,
            category: Some(CategoryId::new(category)),
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            category_name: None,
            category_color: None,
        }
    }

    #[test]
    fn over_budget_example() {
        let m = metrics_from_spent(500.0, 520.0);
        assert_eq!(m.percentage_used, 104.0);
        assert!(m.over_budget);
        assert_eq!(m.remaining_amount, -20.0);
    }

    #[test]
    fn zero_budget_never_produces_nan() {
        for spent in [0.0, 10.0, -5.0] {
            let m = metrics_from_spent(0.0, spent);
            assert_eq!(m.percentage_used, 0.0);
            assert!(!m.over_budget);
            assert_eq!(m.remaining_amount, -spent);
        }
    }

    #[test]
    fn percentage_is_clamped_and_flag_tracks_it() {
        for (amount, spent) in [(100.0, -30.0), (100.0, 100.0), (100.0, 100.01), (3.0, 1.0)] {
            let m = metrics_from_spent(amount, spent);
            assert!(m.percentage_used >= 0.0);
            assert_eq!(m.over_budget, m.percentage_used > 100.0);
            assert_eq!(m.remaining_amount, amount - spent);
        }
        assert!(!metrics_from_spent(100.0, 100.0).over_budget);
    }

    #[test]
    fn computes_spent_from_matching_expenses_only() {
        let txns = vec![
            txn(1, 100.10, EntryType::Expense, 4, (2024, 1, 3)),
            txn(2, 50.20, EntryType::Expense, 4, (2024, 1, 31)),
            txn(3, 999.0, EntryType::Income, 4, (2024, 1, 10)),
            txn(4, 75.0, EntryType::Expense, 5, (2024, 1, 10)),
            txn(5, 60.0, EntryType::Expense, 4, (2024, 2, 1)),
        ];

        let scoped = compute_budget_metrics(&budget(200.0, Some(4)), &txns);
        assert_eq!(scoped.spent_amount, 150.3);
        assert_eq!(scoped.remaining_amount, 200.0 - 150.3);

        let all = compute_budget_metrics(&budget(200.0, None), &txns);
        assert_eq!(all.spent_amount, 225.3);
        assert!(all.over_budget);
    }

    #[test]
    fn mismatched_legacy_rows_are_tolerated() {
        let txns = vec![txn(1, 10.0, EntryType::Other, 4, (2024, 1, 3))];
        let m = compute_budget_metrics(&budget(100.0, Some(4)), &txns);
        assert_eq!(m.spent_amount, 0.0);
    }

    #[test]
    fn backend_values_win_over_local_derivation() {
        let mut b = budget(500.0, None);
        b.spent_amount = Some(520.0);
        b.percentage_used = Some(104.0);
        let m = budget_metrics(&b, Some(&[]));
        assert_eq!(m.spent_amount, 520.0);
        assert_eq!(m.remaining_amount, -20.0);
        assert!(m.over_budget);

        let filled = with_metrics(&b, &[]);
        assert_eq!(filled.remaining_amount, Some(-20.0));
        assert!(!needs_metrics(&filled));
        assert!(needs_metrics(&b));
    }

    #[test]
    fn health_tiers() {
        assert_eq!(BudgetHealth::from_percentage(50.0), BudgetHealth::Healthy);
        assert_eq!(BudgetHealth::from_percentage(80.0), BudgetHealth::Healthy);
        assert_eq!(BudgetHealth::from_percentage(80.5), BudgetHealth::Warning);
        assert_eq!(BudgetHealth::from_percentage(100.5), BudgetHealth::Over);
        assert_eq!(progress_fraction(140.0), 1.0);
        assert_eq!(progress_fraction(25.0), 0.25);
    }

    #[test]
    fn truncate_keeps_leading_order() {
        let series = [9, 3, 7, 1, 8, 2, 6];
        assert_eq!(truncate(&series, 5), &[9, 3, 7, 1, 8]);
        assert_eq!(truncate(&series, 3), &[9, 3, 7]);
        assert_eq!(truncate(&series[..2], 5), &[9, 3]);
        assert!(truncate::<u8>(&[], 5).is_empty());
    }

    #[test]
    fn summarize_defaults_missing_sequences() {
        let s = summarize(&json!({
            "summary": {"total_budgeted": "800.00", "total_spent": 650}
        }))
        .unwrap();
        assert_eq!(s.total_budgeted, 800.0);
        assert_eq!(s.total_spent, 650.0);
        assert_eq!(s.total_remaining, 150.0);
        assert!(s.category_breakdown.is_empty());
        assert!(s.budget_comparison.is_empty());

        let s = summarize(&json!({
            "total_budgeted": 10, "total_spent": 4, "total_remaining": 6,
            "budget_comparison": [
                {"budget_name": "Rent", "budgeted_amount": 10, "spent_amount": 4, "over_budget": false}
            ],
            "category_breakdown": null
        }))
        .unwrap();
        assert_eq!(s.budget_comparison.len(), 1);
        assert!(s.category_breakdown.is_empty());
        assert_eq!(summarize(&Value::Null).unwrap(), AnalysisSummary::default());
    }

    #[test]
    fn summarize_financial_passes_totals_through() {
        let s = summarize_financial(&json!({
            "totals": {"income": 3000, "expenses": "1250.50", "balance": 1749.5},
            "category_breakdown": [{"name": "Food", "total": 400, "color": "#ff0000"}]
        }))
        .unwrap();
        assert_eq!(s.totals.expenses, 1250.5);
        assert_eq!(s.category_breakdown[0].color.as_deref(), Some("#ff0000"));

        let empty = summarize_financial(&json!({})).unwrap();
        assert!(empty.category_breakdown.is_empty());
        assert_eq!(empty.totals.balance, 0.0);
    }
}
