//! Household-scoped document storage.
//!
//! Every record lives under a scope (its household) and a key. Stores are
//! opaque key/value maps; filtering and ordering happen in the services.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use homestock_core::HouseholdId;

pub mod memory;
pub mod postgres;

pub use memory::InMemoryHouseholdStore;
pub use postgres::{PostgresHouseholdStore, migrate};

/// Reserved scope for records that are global rather than per household
/// (user accounts keyed by username).
pub const DIRECTORY_SCOPE: HouseholdId = HouseholdId::from_uuid(Uuid::nil());

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("stored document could not be (de)serialized: {0}")]
    Serialization(String),
}

/// Household-isolated key/value store.
#[async_trait]
pub trait HouseholdStore<K, V>: Send + Sync
where
    K: Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    async fn get(&self, household_id: HouseholdId, key: &K) -> Result<Option<V>, StoreError>;

    /// Insert only if `key` is free. Returns `false` when it was already taken.
    async fn insert_new(&self, household_id: HouseholdId, key: K, value: V) -> Result<bool, StoreError>;

    async fn upsert(&self, household_id: HouseholdId, key: K, value: V) -> Result<(), StoreError>;

    /// Remove and return the previous value, if any.
    async fn remove(&self, household_id: HouseholdId, key: &K) -> Result<Option<V>, StoreError>;

    async fn list(&self, household_id: HouseholdId) -> Result<Vec<V>, StoreError>;
}
