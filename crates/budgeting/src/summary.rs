use serde::Serialize;

use homestock_core::Money;

use crate::{Budget, BudgetId, Expense};

/// Allocated versus spent for one budget.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetSummary {
    pub budget_id: BudgetId,
    pub name: String,
    pub allocated: Money,
    pub spent: Money,
    /// Signed cents; negative once the budget is overspent.
    pub remaining: i64,
    /// `spent / allocated * 100`, rounded to one decimal; `None` for a zero allocation.
    pub utilization_percent: Option<f64>,
    pub over_budget: bool,
    pub expense_count: usize,
}

/// Summarize a budget from its expenses. Expenses of other budgets are ignored.
pub fn summarize(budget: &Budget, expenses: &[Expense]) -> BudgetSummary {
    let own: Vec<&Expense> = expenses.iter().filter(|e| e.budget_id == budget.id).collect();
    let spent = Money::sum(own.iter().map(|e| e.amount));

    let utilization_percent = (!budget.allocated.is_zero()).then(|| {
        let pct = spent.cents() as f64 / budget.allocated.cents() as f64 * 100.0;
        (pct * 10.0).round() / 10.0
    });

    BudgetSummary {
        budget_id: budget.id,
        name: budget.name.clone(),
        allocated: budget.allocated,
        spent,
        remaining: budget.allocated.signed_diff(spent),
        utilization_percent,
        over_budget: spent > budget.allocated,
        expense_count: own.len(),
    }
}
