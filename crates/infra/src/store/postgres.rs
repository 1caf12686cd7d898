//! Postgres-backed household store.
//!
//! All record types share one `documents` table; each store instance owns a
//! `collection` name. Every query filters on `scope` (the household), so
//! cross-household access is impossible through this API.

use std::fmt::Display;
use std::marker::PhantomData;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use sqlx::{PgPool, Row, types::Json};

use homestock_core::HouseholdId;

use super::{HouseholdStore, StoreError};

const MIGRATION: &str = include_str!("../../migrations/0001_documents.sql");

/// Create the `documents` table if missing. Safe to run on every start.
pub async fn migrate(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::query(MIGRATION)
        .execute(pool)
        .await
        .map_err(backend)?;
    tracing::info!("documents table ready");
    Ok(())
}

fn backend(e: sqlx::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

fn decode<V: DeserializeOwned>(row: &sqlx::postgres::PgRow) -> Result<V, StoreError> {
    row.try_get::<Json<V>, _>("body")
        .map(|Json(v)| v)
        .map_err(|e| StoreError::Serialization(e.to_string()))
}

pub struct PostgresHouseholdStore<K, V> {
    pool: PgPool,
    collection: &'static str,
    _types: PhantomData<fn() -> (K, V)>,
}

impl<K, V> PostgresHouseholdStore<K, V> {
    pub fn new(pool: PgPool, collection: &'static str) -> Self {
        Self {
            pool,
            collection,
            _types: PhantomData,
        }
    }
}

#[async_trait]
impl<K, V> HouseholdStore<K, V> for PostgresHouseholdStore<K, V>
where
    K: Display + Send + Sync + 'static,
    V: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    async fn get(&self, household_id: HouseholdId, key: &K) -> Result<Option<V>, StoreError> {
        let row = sqlx::query(
            "SELECT body FROM documents WHERE scope = $1 AND collection = $2 AND key = $3",
        )
        .bind(*household_id.as_uuid())
        .bind(self.collection)
        .bind(key.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        row.as_ref().map(decode).transpose()
    }

    async fn insert_new(&self, household_id: HouseholdId, key: K, value: V) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO documents (scope, collection, key, body)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (scope, collection, key) DO NOTHING
            "#,
        )
        .bind(*household_id.as_uuid())
        .bind(self.collection)
        .bind(key.to_string())
        .bind(Json(&value))
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        Ok(result.rows_affected() == 1)
    }

    async fn upsert(&self, household_id: HouseholdId, key: K, value: V) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO documents (scope, collection, key, body)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (scope, collection, key)
            DO UPDATE SET body = EXCLUDED.body, updated_at = now()
            "#,
        )
        .bind(*household_id.as_uuid())
        .bind(self.collection)
        .bind(key.to_string())
        .bind(Json(&value))
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        Ok(())
    }

    async fn remove(&self, household_id: HouseholdId, key: &K) -> Result<Option<V>, StoreError> {
        let row = sqlx::query(
            "DELETE FROM documents WHERE scope = $1 AND collection = $2 AND key = $3 RETURNING body",
        )
        .bind(*household_id.as_uuid())
        .bind(self.collection)
        .bind(key.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        row.as_ref().map(decode).transpose()
    }

    async fn list(&self, household_id: HouseholdId) -> Result<Vec<V>, StoreError> {
        let rows = sqlx::query(
            "SELECT body FROM documents WHERE scope = $1 AND collection = $2 ORDER BY key",
        )
        .bind(*household_id.as_uuid())
        .bind(self.collection)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows.iter().map(decode).collect()
    }
}
