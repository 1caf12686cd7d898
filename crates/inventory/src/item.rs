use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use homestock_core::{
    DomainError, DomainResult, Entity, EntityId, HouseholdId, optional_text, required_text,
};

use crate::status::{StockStatus, derive_status};

pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 1;

/// Inventory item identifier (household-scoped via `household_id`).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InventoryItemId(pub EntityId);

impl InventoryItemId {
    pub fn new(id: EntityId) -> Self {
        Self(id)
    }

    pub fn generate() -> Self {
        Self(EntityId::new())
    }
}

impl core::fmt::Display for InventoryItemId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl core::str::FromStr for InventoryItemId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

/// Low-stock flag with acknowledgment metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LowStockAlert {
    pub active: bool,
    pub raised_at: Option<DateTime<Utc>>,
    pub acknowledged: bool,
    pub acknowledged_at: Option<DateTime<Utc>>,
    pub acknowledged_by: Option<String>,
}

impl LowStockAlert {
    fn raised(now: DateTime<Utc>) -> Self {
        Self {
            active: true,
            raised_at: Some(now),
            ..Self::default()
        }
    }

    /// Active and nobody has acknowledged it yet.
    pub fn is_pending(&self) -> bool {
        self.active && !self.acknowledged
    }
}

/// Creation input.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewItem {
    pub name: String,
    pub category: String,
    pub quantity: i64,
    pub unit: Option<String>,
    pub low_stock_threshold: Option<i64>,
    pub manufacture_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub storage_temperature: Option<String>,
    pub barcode: Option<String>,
    pub notes: Option<String>,
}

/// Partial update. Absent fields are left unchanged; blank text clears an
/// optional text field and `null` clears a date.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemPatch {
    pub name: Option<String>,
    pub category: Option<String>,
    pub quantity: Option<i64>,
    pub unit: Option<String>,
    pub low_stock_threshold: Option<i64>,
    #[serde(default, deserialize_with = "homestock_core::nullable")]
    pub manufacture_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "homestock_core::nullable")]
    pub expiry_date: Option<Option<NaiveDate>>,
    pub storage_temperature: Option<String>,
    pub barcode: Option<String>,
    pub notes: Option<String>,
}

/// Outcome of a status re-evaluation.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub previous: StockStatus,
    pub current: StockStatus,
    /// The low-stock flag went from inactive to active during this save.
    pub alert_raised: bool,
}

/// A tracked household good.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    id: InventoryItemId,
    household_id: HouseholdId,
    name: String,
    category: String,
    quantity: i64,
    unit: Option<String>,
    low_stock_threshold: i64,
    manufacture_date: Option<NaiveDate>,
    expiry_date: Option<NaiveDate>,
    storage_temperature: Option<String>,
    barcode: Option<String>,
    notes: Option<String>,
    status: StockStatus,
    low_stock_alert: LowStockAlert,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Entity for InventoryItem {
    type Id = InventoryItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

fn check_quantity(quantity: i64) -> DomainResult<i64> {
    if quantity < 0 {
        return Err(DomainError::validation("quantity cannot be negative"));
    }
    Ok(quantity)
}

fn check_threshold(threshold: i64) -> DomainResult<i64> {
    if threshold < 0 {
        return Err(DomainError::validation("low_stock_threshold cannot be negative"));
    }
    Ok(threshold)
}

fn check_dates(manufactured: Option<NaiveDate>, expires: Option<NaiveDate>) -> DomainResult<()> {
    if let (Some(m), Some(e)) = (manufactured, expires) {
        if m > e {
            return Err(DomainError::validation(
                "manufacture_date cannot be after expiry_date",
            ));
        }
    }
    Ok(())
}

impl InventoryItem {
    /// Validate input and build a new item with its initial status.
    pub fn create(
        household_id: HouseholdId,
        id: InventoryItemId,
        input: NewItem,
        now: DateTime<Utc>,
    ) -> DomainResult<(Self, StatusChange)> {
        check_dates(input.manufacture_date, input.expiry_date)?;

        let mut item = Self {
            id,
            household_id,
            name: required_text("name", &input.name, 120)?,
            category: required_text("category", &input.category, 60)?,
            quantity: check_quantity(input.quantity)?,
            unit: optional_text("unit", input.unit.as_deref(), 20)?,
            low_stock_threshold: check_threshold(
                input.low_stock_threshold.unwrap_or(DEFAULT_LOW_STOCK_THRESHOLD),
            )?,
            manufacture_date: input.manufacture_date,
            expiry_date: input.expiry_date,
            storage_temperature: optional_text(
                "storage_temperature",
                input.storage_temperature.as_deref(),
                40,
            )?,
            barcode: optional_text("barcode", input.barcode.as_deref(), 128)?,
            notes: optional_text("notes", input.notes.as_deref(), 1000)?,
            status: StockStatus::Available,
            low_stock_alert: LowStockAlert::default(),
            created_at: now,
            updated_at: now,
        };

        let change = item.reevaluate(now);
        Ok((item, change))
    }

    /// Apply a partial update; the whole item is re-validated and re-evaluated.
    pub fn update(&mut self, patch: ItemPatch, now: DateTime<Utc>) -> DomainResult<StatusChange> {
        let mut next = self.clone();

        if let Some(name) = patch.name {
            next.name = required_text("name", &name, 120)?;
        }
        if let Some(category) = patch.category {
            next.category = required_text("category", &category, 60)?;
        }
        if let Some(quantity) = patch.quantity {
            next.quantity = check_quantity(quantity)?;
        }
        if let Some(unit) = patch.unit {
            next.unit = optional_text("unit", Some(&unit), 20)?;
        }
        if let Some(threshold) = patch.low_stock_threshold {
            next.low_stock_threshold = check_threshold(threshold)?;
        }
        if let Some(date) = patch.manufacture_date {
            next.manufacture_date = date;
        }
        if let Some(date) = patch.expiry_date {
            next.expiry_date = date;
        }
        if let Some(temp) = patch.storage_temperature {
            next.storage_temperature = optional_text("storage_temperature", Some(&temp), 40)?;
        }
        if let Some(barcode) = patch.barcode {
            next.barcode = optional_text("barcode", Some(&barcode), 128)?;
        }
        if let Some(notes) = patch.notes {
            next.notes = optional_text("notes", Some(&notes), 1000)?;
        }
        check_dates(next.manufacture_date, next.expiry_date)?;

        next.updated_at = now;
        let change = next.reevaluate(now);
        *self = next;
        Ok(change)
    }

    /// Consume (negative) or restock (positive) by `delta`.
    pub fn adjust(&mut self, delta: i64, now: DateTime<Utc>) -> DomainResult<StatusChange> {
        if delta == 0 {
            return Err(DomainError::validation("delta cannot be zero"));
        }
        let new_quantity = self
            .quantity
            .checked_add(delta)
            .ok_or_else(|| DomainError::validation("quantity overflow"))?;
        if new_quantity < 0 {
            return Err(DomainError::invariant("stock cannot go negative"));
        }

        self.quantity = new_quantity;
        self.updated_at = now;
        Ok(self.reevaluate(now))
    }

    /// Mark the active low-stock alert as seen.
    pub fn acknowledge_alert(&mut self, by: &str, now: DateTime<Utc>) -> DomainResult<()> {
        if !self.low_stock_alert.active {
            return Err(DomainError::invariant("no active low-stock alert"));
        }
        if self.low_stock_alert.acknowledged {
            return Err(DomainError::conflict("low-stock alert already acknowledged"));
        }
        self.low_stock_alert.acknowledged = true;
        self.low_stock_alert.acknowledged_at = Some(now);
        self.low_stock_alert.acknowledged_by = Some(by.to_string());
        self.updated_at = now;
        Ok(())
    }

    /// Status rule + alert bookkeeping, run on every save.
    fn reevaluate(&mut self, now: DateTime<Utc>) -> StatusChange {
        let previous = self.status;
        let current = self.status_at(now);
        let mut alert_raised = false;

        match current {
            StockStatus::LowStock => {
                if !self.low_stock_alert.active {
                    self.low_stock_alert = LowStockAlert::raised(now);
                    alert_raised = true;
                }
            }
            StockStatus::Available => self.low_stock_alert = LowStockAlert::default(),
            StockStatus::OutOfStock | StockStatus::Expired => {}
        }

        self.status = current;
        StatusChange {
            previous,
            current,
            alert_raised,
        }
    }

    /// Status as of `now`, without touching stored state.
    pub fn status_at(&self, now: DateTime<Utc>) -> StockStatus {
        derive_status(
            self.quantity,
            self.low_stock_threshold,
            self.expiry_date,
            now.date_naive(),
        )
    }

    /// Read-side view: the stored item with its status brought up to `now`
    /// (items expire without being saved). Alert state is left as stored.
    pub fn observed_at(mut self, now: DateTime<Utc>) -> Self {
        self.status = self.status_at(now);
        self
    }

    /// Not yet expired, but expiring on or before `today + days`.
    /// A window past the calendar's end has no upper bound.
    pub fn expires_within(&self, days: i64, now: DateTime<Utc>) -> bool {
        let today = now.date_naive();
        let Some(expiry) = self.expiry_date else {
            return false;
        };
        let horizon = Duration::try_days(days).and_then(|d| today.checked_add_signed(d));
        expiry > today && horizon.is_none_or(|h| expiry <= h)
    }

    pub fn id_typed(&self) -> InventoryItemId {
        self.id
    }

    pub fn household_id(&self) -> HouseholdId {
        self.household_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn unit(&self) -> Option<&str> {
        self.unit.as_deref()
    }

    pub fn low_stock_threshold(&self) -> i64 {
        self.low_stock_threshold
    }

    pub fn manufacture_date(&self) -> Option<NaiveDate> {
        self.manufacture_date
    }

    pub fn expiry_date(&self) -> Option<NaiveDate> {
        self.expiry_date
    }

    pub fn storage_temperature(&self) -> Option<&str> {
        self.storage_temperature.as_deref()
    }

    pub fn barcode(&self) -> Option<&str> {
        self.barcode.as_deref()
    }

    pub fn status(&self) -> StockStatus {
        self.status
    }

    pub fn low_stock_alert(&self) -> &LowStockAlert {
        &self.low_stock_alert
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
