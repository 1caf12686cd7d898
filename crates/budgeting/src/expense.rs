use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use homestock_core::{DomainError, DomainResult, Entity, EntityId, HouseholdId, Money, optional_text};

use crate::{Budget, BudgetId};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpenseId(pub EntityId);

impl ExpenseId {
    pub fn generate() -> Self {
        Self(EntityId::new())
    }
}

impl core::fmt::Display for ExpenseId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl core::str::FromStr for ExpenseId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewExpense {
    pub budget_id: BudgetId,
    pub amount: Money,
    pub description: Option<String>,
    pub spent_on: NaiveDate,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExpensePatch {
    pub amount: Option<Money>,
    pub description: Option<String>,
    pub spent_on: Option<NaiveDate>,
}

/// A dated spend recorded against a budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub id: ExpenseId,
    pub household_id: HouseholdId,
    pub budget_id: BudgetId,
    pub amount: Money,
    pub description: Option<String>,
    pub spent_on: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl Entity for Expense {
    type Id = ExpenseId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

fn check_amount(amount: Money) -> DomainResult<Money> {
    if amount.is_zero() {
        return Err(DomainError::validation("amount must be greater than zero"));
    }
    Ok(amount)
}

fn check_in_period(budget: &Budget, spent_on: NaiveDate) -> DomainResult<()> {
    if !budget.covers(spent_on) {
        return Err(DomainError::invariant(format!(
            "expense date {spent_on} is outside the budget period"
        )));
    }
    Ok(())
}

impl Expense {
    /// Record an expense against `budget`; the caller resolves the budget
    /// within the same household.
    pub fn record(budget: &Budget, input: NewExpense, now: DateTime<Utc>) -> DomainResult<Self> {
        if budget.id != input.budget_id {
            return Err(DomainError::invariant("budget_id mismatch"));
        }
        check_in_period(budget, input.spent_on)?;
        Ok(Self {
            id: ExpenseId::generate(),
            household_id: budget.household_id,
            budget_id: budget.id,
            amount: check_amount(input.amount)?,
            description: optional_text("description", input.description.as_deref(), 200)?,
            spent_on: input.spent_on,
            created_at: now,
        })
    }

    pub fn update(&mut self, budget: &Budget, patch: ExpensePatch) -> DomainResult<()> {
        let mut next = self.clone();
        if let Some(amount) = patch.amount {
            next.amount = check_amount(amount)?;
        }
        if let Some(description) = patch.description {
            next.description = optional_text("description", Some(&description), 200)?;
        }
        if let Some(spent_on) = patch.spent_on {
            check_in_period(budget, spent_on)?;
            next.spent_on = spent_on;
        }
        *self = next;
        Ok(())
    }
}
