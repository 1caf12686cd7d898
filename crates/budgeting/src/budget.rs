use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use homestock_core::{
    DomainError, DomainResult, Entity, EntityId, HouseholdId, Money, optional_text, required_text,
};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BudgetId(pub EntityId);

impl BudgetId {
    pub fn generate() -> Self {
        Self(EntityId::new())
    }
}

impl core::fmt::Display for BudgetId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl core::str::FromStr for BudgetId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewBudget {
    pub name: String,
    pub category: Option<String>,
    pub allocated: Money,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BudgetPatch {
    pub name: Option<String>,
    pub category: Option<String>,
    pub allocated: Option<Money>,
    /// `null` opens the period at that end.
    #[serde(default, deserialize_with = "homestock_core::nullable")]
    pub period_start: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "homestock_core::nullable")]
    pub period_end: Option<Option<NaiveDate>>,
}

/// A spending category with an allocated amount for an optional period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    pub id: BudgetId,
    pub household_id: HouseholdId,
    pub name: String,
    pub category: Option<String>,
    pub allocated: Money,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Budget {
    type Id = BudgetId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

fn check_period(start: Option<NaiveDate>, end: Option<NaiveDate>) -> DomainResult<()> {
    if let (Some(s), Some(e)) = (start, end) {
        if s > e {
            return Err(DomainError::validation("period_start cannot be after period_end"));
        }
    }
    Ok(())
}

impl Budget {
    pub fn create(household_id: HouseholdId, input: NewBudget, now: DateTime<Utc>) -> DomainResult<Self> {
        check_period(input.period_start, input.period_end)?;
        Ok(Self {
            id: BudgetId::generate(),
            household_id,
            name: required_text("name", &input.name, 80)?,
            category: optional_text("category", input.category.as_deref(), 60)?,
            allocated: input.allocated,
            period_start: input.period_start,
            period_end: input.period_end,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn update(&mut self, patch: BudgetPatch, now: DateTime<Utc>) -> DomainResult<()> {
        let mut next = self.clone();
        if let Some(name) = patch.name {
            next.name = required_text("name", &name, 80)?;
        }
        if let Some(category) = patch.category {
            next.category = optional_text("category", Some(&category), 60)?;
        }
        if let Some(allocated) = patch.allocated {
            next.allocated = allocated;
        }
        if let Some(start) = patch.period_start {
            next.period_start = start;
        }
        if let Some(end) = patch.period_end {
            next.period_end = end;
        }
        check_period(next.period_start, next.period_end)?;
        next.updated_at = now;
        *self = next;
        Ok(())
    }

    /// Whether `date` falls inside the budget period (open ends are unbounded).
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.period_start.is_none_or(|s| s <= date) && self.period_end.is_none_or(|e| date <= e)
    }
}
