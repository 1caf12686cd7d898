use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use homestock_budgeting::{
    Budget, BudgetId, BudgetPatch, BudgetSummary, Expense, ExpenseId, ExpensePatch, NewBudget, NewExpense,
    summarize,
};
use homestock_core::{DomainError, HouseholdId};

use super::{ServiceResult, not_found};
use crate::store::HouseholdStore;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExpenseFilter {
    pub budget_id: Option<BudgetId>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl ExpenseFilter {
    fn matches(&self, e: &Expense) -> bool {
        self.budget_id.is_none_or(|b| e.budget_id == b)
            && self.from.is_none_or(|from| e.spent_on >= from)
            && self.to.is_none_or(|to| e.spent_on <= to)
    }
}

/// Budgets and the expenses recorded against them.
#[derive(Clone)]
pub struct BudgetService {
    budgets: Arc<dyn HouseholdStore<BudgetId, Budget>>,
    expenses: Arc<dyn HouseholdStore<ExpenseId, Expense>>,
}

impl BudgetService {
    pub fn new(
        budgets: Arc<dyn HouseholdStore<BudgetId, Budget>>,
        expenses: Arc<dyn HouseholdStore<ExpenseId, Expense>>,
    ) -> Self {
        Self { budgets, expenses }
    }

    pub async fn create_budget(&self, household_id: HouseholdId, input: NewBudget) -> ServiceResult<Budget> {
        let budget = Budget::create(household_id, input, Utc::now())?;
        self.budgets.upsert(household_id, budget.id, budget.clone()).await?;
        tracing::info!(household_id = %household_id, budget_id = %budget.id, allocated = %budget.allocated, "budget created");
        Ok(budget)
    }

    pub async fn get_budget(&self, household_id: HouseholdId, id: BudgetId) -> ServiceResult<Budget> {
        self.budgets.get(household_id, &id).await?.ok_or_else(not_found)
    }

    pub async fn list_budgets(&self, household_id: HouseholdId) -> ServiceResult<Vec<Budget>> {
        let mut budgets = self.budgets.list(household_id).await?;
        budgets.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(budgets)
    }

    /// A period change may not strand already recorded expenses.
    pub async fn update_budget(
        &self,
        household_id: HouseholdId,
        id: BudgetId,
        patch: BudgetPatch,
    ) -> ServiceResult<Budget> {
        let mut budget = self.get_budget(household_id, id).await?;
        budget.update(patch, Utc::now())?;

        let stranded = self
            .expenses_of(household_id, id)
            .await?
            .iter()
            .filter(|e| !budget.covers(e.spent_on))
            .count();
        if stranded > 0 {
            return Err(DomainError::invariant(format!(
                "{stranded} expense(s) would fall outside the new budget period"
            ))
            .into());
        }

        self.budgets.upsert(household_id, id, budget.clone()).await?;
        Ok(budget)
    }

    /// Delete a budget and its expenses; returns the number of expenses removed.
    pub async fn delete_budget(&self, household_id: HouseholdId, id: BudgetId) -> ServiceResult<usize> {
        self.budgets.remove(household_id, &id).await?.ok_or_else(not_found)?;

        let mut removed = 0;
        for expense in self.expenses_of(household_id, id).await? {
            if self.expenses.remove(household_id, &expense.id).await?.is_some() {
                removed += 1;
            }
        }
        tracing::info!(household_id = %household_id, budget_id = %id, expenses_removed = removed, "budget deleted");
        Ok(removed)
    }

    pub async fn create_expense(&self, household_id: HouseholdId, input: NewExpense) -> ServiceResult<Expense> {
        let budget = self.referenced_budget(household_id, input.budget_id).await?;
        let expense = Expense::record(&budget, input, Utc::now())?;
        self.expenses.upsert(household_id, expense.id, expense.clone()).await?;
        tracing::info!(household_id = %household_id, budget_id = %budget.id, amount = %expense.amount, "expense recorded");
        Ok(expense)
    }

    pub async fn get_expense(&self, household_id: HouseholdId, id: ExpenseId) -> ServiceResult<Expense> {
        self.expenses.get(household_id, &id).await?.ok_or_else(not_found)
    }

    /// Matching expenses by date, then recording time.
    pub async fn list_expenses(&self, household_id: HouseholdId, filter: &ExpenseFilter) -> ServiceResult<Vec<Expense>> {
        if let (Some(from), Some(to)) = (filter.from, filter.to) {
            if from > to {
                return Err(DomainError::validation("from cannot be after to").into());
            }
        }
        let mut expenses: Vec<Expense> = self
            .expenses
            .list(household_id)
            .await?
            .into_iter()
            .filter(|e| filter.matches(e))
            .collect();
        expenses.sort_by_key(|e| (e.spent_on, e.created_at, e.id));
        Ok(expenses)
    }

    pub async fn update_expense(
        &self,
        household_id: HouseholdId,
        id: ExpenseId,
        patch: ExpensePatch,
    ) -> ServiceResult<Expense> {
        let mut expense = self.get_expense(household_id, id).await?;
        let budget = self.get_budget(household_id, expense.budget_id).await?;
        expense.update(&budget, patch)?;
        self.expenses.upsert(household_id, id, expense.clone()).await?;
        Ok(expense)
    }

    pub async fn delete_expense(&self, household_id: HouseholdId, id: ExpenseId) -> ServiceResult<()> {
        self.expenses.remove(household_id, &id).await?.ok_or_else(not_found)?;
        Ok(())
    }

    pub async fn summary(&self, household_id: HouseholdId, id: BudgetId) -> ServiceResult<BudgetSummary> {
        let budget = self.get_budget(household_id, id).await?;
        let expenses = self.expenses_of(household_id, id).await?;
        Ok(summarize(&budget, &expenses))
    }

    /// One summary per budget, in budget order.
    pub async fn summaries(&self, household_id: HouseholdId) -> ServiceResult<Vec<BudgetSummary>> {
        let budgets = self.list_budgets(household_id).await?;
        let expenses = self.expenses.list(household_id).await?;
        Ok(budgets.iter().map(|b| summarize(b, &expenses)).collect())
    }

    async fn expenses_of(&self, household_id: HouseholdId, budget_id: BudgetId) -> ServiceResult<Vec<Expense>> {
        Ok(self
            .expenses
            .list(household_id)
            .await?
            .into_iter()
            .filter(|e| e.budget_id == budget_id)
            .collect())
    }

    async fn referenced_budget(&self, household_id: HouseholdId, id: BudgetId) -> ServiceResult<Budget> {
        self.budgets
            .get(household_id, &id)
            .await?
            .ok_or_else(|| DomainError::validation(format!("budget {id} does not exist")).into())
    }
}
