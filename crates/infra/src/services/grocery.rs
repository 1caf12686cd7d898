use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;

use homestock_core::HouseholdId;
use homestock_grocery::{GroceryItem, GroceryItemId, GroceryPatch, NewGroceryItem, restock_entries};
use homestock_inventory::{InventoryItem, InventoryItemId};

use super::{ServiceResult, not_found};
use crate::store::HouseholdStore;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GroceryFilter {
    pub purchased: Option<bool>,
}

#[derive(Clone)]
pub struct GroceryService {
    items: Arc<dyn HouseholdStore<GroceryItemId, GroceryItem>>,
    inventory: Arc<dyn HouseholdStore<InventoryItemId, InventoryItem>>,
}

impl GroceryService {
    pub fn new(
        items: Arc<dyn HouseholdStore<GroceryItemId, GroceryItem>>,
        inventory: Arc<dyn HouseholdStore<InventoryItemId, InventoryItem>>,
    ) -> Self {
        Self { items, inventory }
    }

    pub async fn create(&self, household_id: HouseholdId, input: NewGroceryItem) -> ServiceResult<GroceryItem> {
        let item = GroceryItem::create(household_id, input, Utc::now())?;
        self.items.upsert(household_id, item.id, item.clone()).await?;
        Ok(item)
    }

    pub async fn get(&self, household_id: HouseholdId, id: GroceryItemId) -> ServiceResult<GroceryItem> {
        self.items.get(household_id, &id).await?.ok_or_else(not_found)
    }

    /// Open entries first, then by creation time.
    pub async fn list(&self, household_id: HouseholdId, filter: &GroceryFilter) -> ServiceResult<Vec<GroceryItem>> {
        let mut items: Vec<GroceryItem> = self
            .items
            .list(household_id)
            .await?
            .into_iter()
            .filter(|i| filter.purchased.is_none_or(|p| i.purchased == p))
            .collect();
        items.sort_by_key(|i| (i.purchased, i.created_at, i.id));
        Ok(items)
    }

    pub async fn update(
        &self,
        household_id: HouseholdId,
        id: GroceryItemId,
        patch: GroceryPatch,
    ) -> ServiceResult<GroceryItem> {
        let mut item = self.get(household_id, id).await?;
        item.update(patch, Utc::now())?;
        self.items.upsert(household_id, id, item.clone()).await?;
        Ok(item)
    }

    pub async fn set_purchased(
        &self,
        household_id: HouseholdId,
        id: GroceryItemId,
        purchased: bool,
    ) -> ServiceResult<GroceryItem> {
        let mut item = self.get(household_id, id).await?;
        item.set_purchased(purchased, Utc::now());
        self.items.upsert(household_id, id, item.clone()).await?;
        Ok(item)
    }

    pub async fn delete(&self, household_id: HouseholdId, id: GroceryItemId) -> ServiceResult<()> {
        self.items.remove(household_id, &id).await?.ok_or_else(not_found)?;
        Ok(())
    }

    /// Drop every purchased entry; returns how many were removed.
    pub async fn clear_purchased(&self, household_id: HouseholdId) -> ServiceResult<usize> {
        let mut removed = 0;
        for item in self.items.list(household_id).await? {
            if item.purchased && self.items.remove(household_id, &item.id).await?.is_some() {
                removed += 1;
            }
        }
        tracing::info!(household_id = %household_id, removed, "purchased grocery entries cleared");
        Ok(removed)
    }

    /// Put every low or out-of-stock inventory item on the list.
    pub async fn restock(&self, household_id: HouseholdId) -> ServiceResult<Vec<GroceryItem>> {
        let now = Utc::now();
        let inventory: Vec<InventoryItem> = self
            .inventory
            .list(household_id)
            .await?
            .into_iter()
            .map(|i| i.observed_at(now))
            .collect();
        let existing = self.items.list(household_id).await?;

        let added = restock_entries(household_id, &inventory, &existing, now);
        for entry in &added {
            self.items.upsert(household_id, entry.id, entry.clone()).await?;
        }
        tracing::info!(household_id = %household_id, added = added.len(), "grocery list restocked");
        Ok(added)
    }
}
