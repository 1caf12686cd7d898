use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use homestock_core::{
    DomainError, DomainResult, Entity, EntityId, HouseholdId, optional_text, required_text,
};
use homestock_inventory::{InventoryItem, InventoryItemId};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroceryItemId(pub EntityId);

impl GroceryItemId {
    pub fn generate() -> Self {
        Self(EntityId::new())
    }
}

impl core::fmt::Display for GroceryItemId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl core::str::FromStr for GroceryItemId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewGroceryItem {
    pub name: String,
    pub quantity: Option<u32>,
    pub unit: Option<String>,
    pub category: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GroceryPatch {
    pub name: Option<String>,
    pub quantity: Option<u32>,
    pub unit: Option<String>,
    pub category: Option<String>,
    pub notes: Option<String>,
}

/// One line on the household shopping list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroceryItem {
    pub id: GroceryItemId,
    pub household_id: HouseholdId,
    pub name: String,
    pub quantity: u32,
    pub unit: Option<String>,
    pub category: Option<String>,
    pub notes: Option<String>,
    pub purchased: bool,
    pub purchased_at: Option<DateTime<Utc>>,
    /// Inventory item this entry was generated from, if any.
    pub source_item_id: Option<InventoryItemId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for GroceryItem {
    type Id = GroceryItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

fn check_quantity(quantity: u32) -> DomainResult<u32> {
    if quantity == 0 {
        return Err(DomainError::validation("quantity must be at least 1"));
    }
    Ok(quantity)
}

impl GroceryItem {
    pub fn create(
        household_id: HouseholdId,
        input: NewGroceryItem,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        Ok(Self {
            id: GroceryItemId::generate(),
            household_id,
            name: required_text("name", &input.name, 120)?,
            quantity: check_quantity(input.quantity.unwrap_or(1))?,
            unit: optional_text("unit", input.unit.as_deref(), 20)?,
            category: optional_text("category", input.category.as_deref(), 60)?,
            notes: optional_text("notes", input.notes.as_deref(), 500)?,
            purchased: false,
            purchased_at: None,
            source_item_id: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn update(&mut self, patch: GroceryPatch, now: DateTime<Utc>) -> DomainResult<()> {
        let mut next = self.clone();
        if let Some(name) = patch.name {
            next.name = required_text("name", &name, 120)?;
        }
        if let Some(quantity) = patch.quantity {
            next.quantity = check_quantity(quantity)?;
        }
        if let Some(unit) = patch.unit {
            next.unit = optional_text("unit", Some(&unit), 20)?;
        }
        if let Some(category) = patch.category {
            next.category = optional_text("category", Some(&category), 60)?;
        }
        if let Some(notes) = patch.notes {
            next.notes = optional_text("notes", Some(&notes), 500)?;
        }
        next.updated_at = now;
        *self = next;
        Ok(())
    }

    /// Toggle the purchased flag. Setting the current value again is a no-op.
    pub fn set_purchased(&mut self, purchased: bool, now: DateTime<Utc>) {
        if self.purchased == purchased {
            return;
        }
        self.purchased = purchased;
        self.purchased_at = purchased.then_some(now);
        self.updated_at = now;
    }

    fn same_name(&self, name: &str) -> bool {
        self.name.trim().eq_ignore_ascii_case(name.trim())
    }
}

/// Build list entries for inventory that is low or out of stock.
///
/// Skips items already on the list (unpurchased entry with the same name,
/// case-insensitive). The quantity tops the item back above its threshold.
pub fn restock_entries(
    household_id: HouseholdId,
    inventory: &[InventoryItem],
    existing: &[GroceryItem],
    now: DateTime<Utc>,
) -> Vec<GroceryItem> {
    let mut added: Vec<GroceryItem> = Vec::new();

    for item in inventory {
        if !item.status().needs_restock() {
            continue;
        }
        let already_listed = existing
            .iter()
            .chain(added.iter())
            .any(|g| !g.purchased && g.same_name(item.name()));
        if already_listed {
            continue;
        }

        let shortfall = item
            .low_stock_threshold()
            .saturating_sub(item.quantity())
            .saturating_add(1);
        let quantity = u32::try_from(shortfall.max(1)).unwrap_or(u32::MAX);

        added.push(GroceryItem {
            id: GroceryItemId::generate(),
            household_id,
            name: item.name().to_string(),
            quantity,
            unit: item.unit().map(str::to_string),
            category: Some(item.category().to_string()),
            notes: None,
            purchased: false,
            purchased_at: None,
            source_item_id: Some(item.id_typed()),
            created_at: now,
            updated_at: now,
        });
    }

    added
}
