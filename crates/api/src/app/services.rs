//! Service wiring for the HTTP layer: stores, domain services, device hub,
//! and the realtime channel.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use sqlx::postgres::PgPoolOptions;
use tokio::sync::broadcast;
use tokio_stream::{StreamExt, wrappers::BroadcastStream};

use homestock_auth::Hs256Jwt;
use homestock_core::HouseholdId;
use homestock_infra::services::{
    AccountService, BarcodeService, BudgetService, GroceryService, InventoryService, Services, Stores,
};
use homestock_infra::store::migrate;
use homestock_infra::{AppConfig, StorageConfig};
use homestock_inventory::InventoryItem;
use homestock_iot::{DeviceClient, DeviceHub, DeviceStatus, spawn_poller};

/// Realtime message broadcasted via SSE.
///
/// `household_id: None` reaches every connected household.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RealtimeMessage {
    pub household_id: Option<HouseholdId>,
    pub topic: String,
    pub payload: serde_json::Value,
}

pub struct AppServices {
    pub accounts: AccountService,
    pub inventory: InventoryService,
    pub barcodes: BarcodeService,
    pub grocery: GroceryService,
    pub budgets: BudgetService,
    pub devices: Arc<DeviceHub>,
    realtime_tx: broadcast::Sender<RealtimeMessage>,
}

impl AppServices {
    pub fn realtime_tx(&self) -> &broadcast::Sender<RealtimeMessage> {
        &self.realtime_tx
    }

    /// Fire-and-forget; nobody listening is fine.
    pub fn publish(&self, household_id: Option<HouseholdId>, topic: &str, payload: serde_json::Value) {
        let _ = self.realtime_tx.send(RealtimeMessage {
            household_id,
            topic: topic.to_string(),
            payload,
        });
    }

    pub fn publish_low_stock(&self, item: &InventoryItem) {
        self.publish(
            Some(item.household_id()),
            "inventory.low_stock",
            serde_json::json!({
                "item_id": item.id_typed().to_string(),
                "name": item.name(),
                "quantity": item.quantity(),
                "low_stock_threshold": item.low_stock_threshold(),
            }),
        );
    }

    /// Gas alarms go to every household.
    pub fn publish_gas_alarm(&self, status: &DeviceStatus) {
        let _ = self.realtime_tx.send(gas_alarm_message(status));
    }
}

fn gas_alarm_message(status: &DeviceStatus) -> RealtimeMessage {
    RealtimeMessage {
        household_id: None,
        topic: "iot.gas_alarm".to_string(),
        payload: serde_json::json!({
            "device_id": status.id,
            "gas": status.reading.and_then(|r| r.gas),
            "polled_at": status.last_polled_at,
        }),
    }
}

/// Build stores and services for `config`.
pub async fn build_services(
    config: &AppConfig,
    jwt: Arc<Hs256Jwt>,
    device_client: Arc<dyn DeviceClient>,
) -> anyhow::Result<AppServices> {
    let stores = match &config.storage {
        StorageConfig::InMemory => {
            tracing::info!("using in-memory stores");
            Stores::in_memory()
        }
        StorageConfig::Postgres {
            database_url,
            max_connections,
        } => {
            let pool = PgPoolOptions::new()
                .max_connections(*max_connections)
                .connect(database_url)
                .await
                .context("failed to connect to Postgres")?;
            migrate(&pool).await?;
            tracing::info!(max_connections, "using Postgres stores");
            Stores::postgres(pool)
        }
    };

    let Services {
        accounts,
        inventory,
        barcodes,
        grocery,
        budgets,
    } = Services::new(stores, jwt, config.token_ttl);

    // Realtime channel (SSE): lossy broadcast, household-filtered per stream.
    let (realtime_tx, _realtime_rx) = broadcast::channel::<RealtimeMessage>(256);

    let devices = Arc::new(DeviceHub::new(
        config.devices.clone(),
        device_client,
        config.gas_alarm_threshold,
    ));

    if !devices.is_empty() {
        let tx = realtime_tx.clone();
        spawn_poller(devices.clone(), config.poll_interval, move |status| {
            let _ = tx.send(gas_alarm_message(status));
        });
        tracing::info!(
            devices = config.devices.len(),
            interval_secs = config.poll_interval.as_secs(),
            "device poller started"
        );
    }

    Ok(AppServices {
        accounts,
        inventory,
        barcodes,
        grocery,
        budgets,
        devices,
        realtime_tx,
    })
}

/// Build an SSE stream for a household (used by `/stream`).
pub fn household_sse_stream(
    services: Arc<AppServices>,
    household_id: HouseholdId,
) -> Sse<impl tokio_stream::Stream<Item = Result<SseEvent, Infallible>>> {
    let rx = services.realtime_tx().subscribe();
    let stream = BroadcastStream::new(rx).filter_map(move |msg| match msg {
        Ok(m) if m.household_id.is_none_or(|h| h == household_id) => {
            let data = serde_json::to_string(&m.payload).unwrap_or_else(|_| "{}".to_string());
            Some(Ok(SseEvent::default().event(m.topic).data(data)))
        }
        _ => None,
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}
