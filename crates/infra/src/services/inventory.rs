use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;

use homestock_core::{DomainError, HouseholdId};
use homestock_inventory::{InventoryItem, InventoryItemId, ItemPatch, NewItem, StatusChange, StockStatus};

use super::{ServiceResult, not_found};
use crate::store::HouseholdStore;

pub const DEFAULT_EXPIRY_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InventoryFilter {
    pub status: Option<StockStatus>,
    pub category: Option<String>,
    /// Case-insensitive name substring.
    pub q: Option<String>,
}

impl InventoryFilter {
    fn matches(&self, item: &InventoryItem) -> bool {
        if self.status.is_some_and(|s| s != item.status()) {
            return false;
        }
        if let Some(category) = self.category.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            if !item.category().eq_ignore_ascii_case(category) {
                return false;
            }
        }
        if let Some(q) = self.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            if !item.name().to_lowercase().contains(&q.to_lowercase()) {
                return false;
            }
        }
        true
    }
}

#[derive(Clone)]
pub struct InventoryService {
    items: Arc<dyn HouseholdStore<InventoryItemId, InventoryItem>>,
}

impl InventoryService {
    pub fn new(items: Arc<dyn HouseholdStore<InventoryItemId, InventoryItem>>) -> Self {
        Self { items }
    }

    pub async fn create(
        &self,
        household_id: HouseholdId,
        input: NewItem,
    ) -> ServiceResult<(InventoryItem, StatusChange)> {
        let id = InventoryItemId::generate();
        let (item, change) = InventoryItem::create(household_id, id, input, Utc::now())?;
        if !self.items.insert_new(household_id, id, item.clone()).await? {
            return Err(DomainError::conflict("inventory item id already exists").into());
        }
        tracing::info!(household_id = %household_id, item_id = %id, status = %item.status(), "inventory item created");
        Ok((item, change))
    }

    /// The stored item with its status re-derived for today.
    pub async fn get(&self, household_id: HouseholdId, id: InventoryItemId) -> ServiceResult<InventoryItem> {
        Ok(self.load(household_id, id).await?.observed_at(Utc::now()))
    }

    /// Items matching `filter`, ordered by name.
    pub async fn list(
        &self,
        household_id: HouseholdId,
        filter: &InventoryFilter,
    ) -> ServiceResult<Vec<InventoryItem>> {
        let now = Utc::now();
        let mut items: Vec<InventoryItem> = self
            .items
            .list(household_id)
            .await?
            .into_iter()
            .map(|i| i.observed_at(now))
            .filter(|i| filter.matches(i))
            .collect();
        items.sort_by(|a, b| {
            a.name()
                .to_lowercase()
                .cmp(&b.name().to_lowercase())
                .then_with(|| a.id_typed().cmp(&b.id_typed()))
        });
        Ok(items)
    }

    pub async fn update(
        &self,
        household_id: HouseholdId,
        id: InventoryItemId,
        patch: ItemPatch,
    ) -> ServiceResult<(InventoryItem, StatusChange)> {
        let mut item = self.load(household_id, id).await?;
        let change = item.update(patch, Utc::now())?;
        self.save(household_id, &item, &change).await?;
        Ok((item, change))
    }

    /// Consume (negative `delta`) or restock (positive).
    pub async fn adjust(
        &self,
        household_id: HouseholdId,
        id: InventoryItemId,
        delta: i64,
    ) -> ServiceResult<(InventoryItem, StatusChange)> {
        let mut item = self.load(household_id, id).await?;
        let change = item.adjust(delta, Utc::now())?;
        self.save(household_id, &item, &change).await?;
        Ok((item, change))
    }

    pub async fn acknowledge(
        &self,
        household_id: HouseholdId,
        id: InventoryItemId,
        by: &str,
    ) -> ServiceResult<InventoryItem> {
        let mut item = self.load(household_id, id).await?;
        item.acknowledge_alert(by, Utc::now())?;
        self.items.upsert(household_id, id, item.clone()).await?;
        tracing::info!(household_id = %household_id, item_id = %id, by = %by, "low-stock alert acknowledged");
        Ok(item)
    }

    pub async fn delete(&self, household_id: HouseholdId, id: InventoryItemId) -> ServiceResult<()> {
        self.items.remove(household_id, &id).await?.ok_or_else(not_found)?;
        tracing::info!(household_id = %household_id, item_id = %id, "inventory item deleted");
        Ok(())
    }

    /// Items whose low-stock flag is active, unacknowledged first, oldest first.
    pub async fn alerts(&self, household_id: HouseholdId) -> ServiceResult<Vec<InventoryItem>> {
        let now = Utc::now();
        let mut items: Vec<InventoryItem> = self
            .items
            .list(household_id)
            .await?
            .into_iter()
            .filter(|i| i.low_stock_alert().active)
            .map(|i| i.observed_at(now))
            .collect();
        items.sort_by_key(|i| (i.low_stock_alert().acknowledged, i.low_stock_alert().raised_at));
        Ok(items)
    }

    /// Unexpired items expiring within `days`, soonest first.
    pub async fn expiring(&self, household_id: HouseholdId, days: i64) -> ServiceResult<Vec<InventoryItem>> {
        if days < 0 {
            return Err(DomainError::validation("days cannot be negative").into());
        }
        let now = Utc::now();
        let mut items: Vec<InventoryItem> = self
            .items
            .list(household_id)
            .await?
            .into_iter()
            .filter(|i| i.expires_within(days, now))
            .map(|i| i.observed_at(now))
            .collect();
        items.sort_by_key(|i| (i.expiry_date(), i.id_typed()));
        Ok(items)
    }

    async fn load(&self, household_id: HouseholdId, id: InventoryItemId) -> ServiceResult<InventoryItem> {
        self.items.get(household_id, &id).await?.ok_or_else(not_found)
    }

    async fn save(
        &self,
        household_id: HouseholdId,
        item: &InventoryItem,
        change: &StatusChange,
    ) -> ServiceResult<()> {
        self.items
            .upsert(household_id, item.id_typed(), item.clone())
            .await?;
        if change.previous != change.current {
            tracing::info!(
                household_id = %household_id,
                item_id = %item.id_typed(),
                from = %change.previous,
                to = %change.current,
                "inventory status changed"
            );
        }
        if change.alert_raised {
            tracing::warn!(household_id = %household_id, item_id = %item.id_typed(), quantity = item.quantity(), "low-stock alert raised");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryHouseholdStore;
    use chrono::Duration;

    fn service() -> InventoryService {
        InventoryService::new(Arc::new(InMemoryHouseholdStore::new()))
    }

    fn rice(quantity: i64) -> NewItem {
        NewItem {
            name: "Rice".into(),
            category: "Pantry".into(),
            quantity,
            low_stock_threshold: Some(2),
            ..NewItem::default()
        }
    }

    #[tokio::test]
    async fn consuming_stock_raises_alert_once() {
        let svc = service();
        let h = HouseholdId::new();
        let (item, change) = svc.create(h, rice(5)).await.unwrap();
        assert_eq!(change.current, StockStatus::Available);
        let id = item.id_typed();

        let (item, change) = svc.adjust(h, id, -3).await.unwrap();
        assert_eq!(item.status(), StockStatus::LowStock);
        assert!(change.alert_raised);

        let (_, change) = svc.adjust(h, id, -1).await.unwrap();
        assert!(!change.alert_raised);
        assert_eq!(svc.alerts(h).await.unwrap().len(), 1);

        let acked = svc.acknowledge(h, id, "alex").await.unwrap();
        assert!(acked.low_stock_alert().acknowledged);

        svc.adjust(h, id, 10).await.unwrap();
        assert!(svc.alerts(h).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn negative_stock_is_rejected_and_not_saved() {
        let svc = service();
        let h = HouseholdId::new();
        let (item, _) = svc.create(h, rice(1)).await.unwrap();
        assert!(svc.adjust(h, item.id_typed(), -2).await.is_err());
        assert_eq!(svc.get(h, item.id_typed()).await.unwrap().quantity(), 1);
    }

    #[tokio::test]
    async fn other_households_see_nothing() {
        let svc = service();
        let h = HouseholdId::new();
        let (item, _) = svc.create(h, rice(3)).await.unwrap();

        let other = HouseholdId::new();
        assert!(svc.get(other, item.id_typed()).await.is_err());
        assert!(svc.delete(other, item.id_typed()).await.is_err());
        assert!(svc.list(other, &InventoryFilter::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_filters_and_sorts() {
        let svc = service();
        let h = HouseholdId::new();
        svc.create(h, rice(5)).await.unwrap();
        svc.create(
            h,
            NewItem {
                name: "apples".into(),
                category: "Produce".into(),
                quantity: 0,
                ..NewItem::default()
            },
        )
        .await
        .unwrap();

        let all = svc.list(h, &InventoryFilter::default()).await.unwrap();
        let names: Vec<&str> = all.iter().map(|i| i.name()).collect();
        assert_eq!(names, vec!["apples", "Rice"]);

        let out = svc
            .list(
                h,
                &InventoryFilter {
                    status: Some(StockStatus::OutOfStock),
                    ..InventoryFilter::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(out.len(), 1);

        let by_q = svc
            .list(
                h,
                &InventoryFilter {
                    q: Some("RI".into()),
                    category: Some("pantry".into()),
                    ..InventoryFilter::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(by_q.len(), 1);
        assert_eq!(by_q[0].name(), "Rice");
    }

    #[tokio::test]
    async fn expiring_window() {
        let svc = service();
        let h = HouseholdId::new();
        let today = Utc::now().date_naive();
        for (name, offset) in [("yogurt", 2), ("cheese", 20), ("old milk", -1)] {
            svc.create(
                h,
                NewItem {
                    name: name.into(),
                    category: "Dairy".into(),
                    quantity: 3,
                    expiry_date: Some(today + Duration::days(offset)),
                    ..NewItem::default()
                },
            )
            .await
            .unwrap();
        }

        let soon = svc.expiring(h, DEFAULT_EXPIRY_WINDOW_DAYS).await.unwrap();
        assert_eq!(soon.len(), 1);
        assert_eq!(soon[0].name(), "yogurt");
        assert_eq!(svc.expiring(h, 30).await.unwrap().len(), 2);
        assert_eq!(svc.expiring(h, i64::MAX).await.unwrap().len(), 2);
        assert!(svc.expiring(h, -1).await.is_err());
    }
}
