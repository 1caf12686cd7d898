use std::collections::HashMap;
use std::hash::Hash;
use std::sync::RwLock;

use async_trait::async_trait;

use homestock_core::HouseholdId;

use super::{StoreError, HouseholdStore};

/// In-memory household-isolated store for tests/dev.
#[derive(Debug)]
pub struct InMemoryHouseholdStore<K, V> {
    inner: RwLock<HashMap<(HouseholdId, K), V>>,
}

impl<K, V> InMemoryHouseholdStore<K, V> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }
}

impl<K, V> Default for InMemoryHouseholdStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned() -> StoreError {
    StoreError::Backend("in-memory store lock poisoned".to_string())
}

#[async_trait]
impl<K, V> HouseholdStore<K, V> for InMemoryHouseholdStore<K, V>
where
    K: Clone + Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, household_id: HouseholdId, key: &K) -> Result<Option<V>, StoreError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.get(&(household_id, key.clone())).cloned())
    }

    async fn insert_new(&self, household_id: HouseholdId, key: K, value: V) -> Result<bool, StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        let slot = (household_id, key);
        if map.contains_key(&slot) {
            return Ok(false);
        }
        map.insert(slot, value);
        Ok(true)
    }

    async fn upsert(&self, household_id: HouseholdId, key: K, value: V) -> Result<(), StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        map.insert((household_id, key), value);
        Ok(())
    }

    async fn remove(&self, household_id: HouseholdId, key: &K) -> Result<Option<V>, StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        Ok(map.remove(&(household_id, key.clone())))
    }

    async fn list(&self, household_id: HouseholdId) -> Result<Vec<V>, StoreError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map
            .iter()
            .filter_map(|((h, _k), v)| if *h == household_id { Some(v.clone()) } else { None })
            .collect())
    }
}
