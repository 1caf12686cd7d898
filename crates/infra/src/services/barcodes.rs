use std::sync::Arc;

use chrono::Utc;

use homestock_core::HouseholdId;
use homestock_inventory::barcode::normalize_code;
use homestock_inventory::{BarcodeId, BarcodeRecord, DecodedBarcode, decode};

use super::{ServiceResult, not_found};
use crate::store::HouseholdStore;

#[derive(Clone)]
pub struct BarcodeService {
    records: Arc<dyn HouseholdStore<BarcodeId, BarcodeRecord>>,
}

impl BarcodeService {
    pub fn new(records: Arc<dyn HouseholdStore<BarcodeId, BarcodeRecord>>) -> Self {
        Self { records }
    }

    pub async fn create(&self, household_id: HouseholdId, code: &str) -> ServiceResult<BarcodeRecord> {
        let record = BarcodeRecord::create(household_id, code, Utc::now())?;
        self.records
            .upsert(household_id, record.id, record.clone())
            .await?;
        tracing::info!(household_id = %household_id, barcode_id = %record.id, "barcode stored");
        Ok(record)
    }

    /// Newest first.
    pub async fn list(&self, household_id: HouseholdId) -> ServiceResult<Vec<BarcodeRecord>> {
        let mut records = self.records.list(household_id).await?;
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(records)
    }

    pub async fn get(&self, household_id: HouseholdId, id: BarcodeId) -> ServiceResult<BarcodeRecord> {
        self.records.get(household_id, &id).await?.ok_or_else(not_found)
    }

    pub async fn delete(&self, household_id: HouseholdId, id: BarcodeId) -> ServiceResult<()> {
        self.records.remove(household_id, &id).await?.ok_or_else(not_found)?;
        Ok(())
    }

    /// Decode without storing anything.
    pub fn decode(&self, code: &str) -> ServiceResult<DecodedBarcode> {
        Ok(decode(&normalize_code(code)?))
    }
}
