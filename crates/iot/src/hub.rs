use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::JoinHandle;

use crate::{DeviceClient, DeviceConfig, DeviceError, SensorReading};

/// Last known state of one device.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceStatus {
    pub id: String,
    pub base_url: String,
    pub online: bool,
    pub reading: Option<SensorReading>,
    pub led_on: Option<bool>,
    pub last_polled_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub gas_alarm: bool,
}

impl DeviceStatus {
    fn unpolled(device: &DeviceConfig) -> Self {
        Self {
            id: device.id.clone(),
            base_url: device.base_url.to_string(),
            online: false,
            reading: None,
            led_on: None,
            last_polled_at: None,
            last_error: None,
            gas_alarm: false,
        }
    }
}

/// Result of polling one device.
#[derive(Debug, Clone)]
pub struct PollOutcome {
    pub status: DeviceStatus,
    /// The gas alarm switched on during this poll.
    pub alarm_raised: bool,
    pub error: Option<DeviceError>,
}

/// Latest status per configured device.
///
/// The status map lock is never held across an await.
pub struct DeviceHub {
    devices: Vec<DeviceConfig>,
    client: Arc<dyn DeviceClient>,
    gas_alarm_threshold: f64,
    statuses: RwLock<HashMap<String, DeviceStatus>>,
}

impl DeviceHub {
    pub fn new(devices: Vec<DeviceConfig>, client: Arc<dyn DeviceClient>, gas_alarm_threshold: f64) -> Self {
        let statuses = devices
            .iter()
            .map(|d| (d.id.clone(), DeviceStatus::unpolled(d)))
            .collect();
        Self {
            devices,
            client,
            gas_alarm_threshold,
            statuses: RwLock::new(statuses),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    fn device(&self, id: &str) -> Result<&DeviceConfig, DeviceError> {
        self.devices
            .iter()
            .find(|d| d.id == id)
            .ok_or_else(|| DeviceError::UnknownDevice(id.to_string()))
    }

    // A poisoned map still holds the last known statuses.
    fn read_statuses(&self) -> RwLockReadGuard<'_, HashMap<String, DeviceStatus>> {
        self.statuses.read().unwrap_or_else(|poisoned| {
            tracing::error!("device status lock poisoned; recovering");
            PoisonError::into_inner(poisoned)
        })
    }

    fn write_statuses(&self) -> RwLockWriteGuard<'_, HashMap<String, DeviceStatus>> {
        self.statuses.write().unwrap_or_else(|poisoned| {
            tracing::error!("device status lock poisoned; recovering");
            PoisonError::into_inner(poisoned)
        })
    }

    /// Snapshot of every device, in configuration order.
    pub fn statuses(&self) -> Vec<DeviceStatus> {
        let map = self.read_statuses();
        self.devices
            .iter()
            .filter_map(|d| map.get(&d.id).cloned())
            .collect()
    }

    pub fn status(&self, id: &str) -> Result<DeviceStatus, DeviceError> {
        let device = self.device(id)?;
        Ok(self
            .read_statuses()
            .get(id)
            .cloned()
            .unwrap_or_else(|| DeviceStatus::unpolled(device)))
    }

    fn update<F>(&self, device: &DeviceConfig, f: F) -> DeviceStatus
    where
        F: FnOnce(&mut DeviceStatus),
    {
        let mut map = self.write_statuses();
        let entry = map
            .entry(device.id.clone())
            .or_insert_with(|| DeviceStatus::unpolled(device));
        f(entry);
        entry.clone()
    }

    /// Read one device's sensors and record the outcome.
    pub async fn poll_one(&self, id: &str) -> Result<PollOutcome, DeviceError> {
        let device = self.device(id)?;
        let result = self.client.read_sensors(device).await;
        let now = Utc::now();
        let threshold = self.gas_alarm_threshold;

        let mut alarm_raised = false;
        let mut error = None;
        let status = match result {
            Ok(reading) => self.update(device, |s| {
                let alarm = reading.gas_exceeds(threshold);
                alarm_raised = alarm && !s.gas_alarm;
                s.online = true;
                s.reading = Some(reading);
                s.last_polled_at = Some(now);
                s.last_error = None;
                s.gas_alarm = alarm;
            }),
            Err(e) => {
                tracing::warn!(device_id = %device.id, error = %e, "sensor poll failed");
                let message = e.to_string();
                error = Some(e);
                self.update(device, |s| {
                    s.online = false;
                    s.last_polled_at = Some(now);
                    s.last_error = Some(message);
                })
            }
        };

        if alarm_raised {
            tracing::warn!(device_id = %device.id, gas = ?status.reading.and_then(|r| r.gas), "gas alarm raised");
        }

        Ok(PollOutcome {
            status,
            alarm_raised,
            error,
        })
    }

    /// Poll every device sequentially.
    pub async fn poll_all(&self) -> Vec<PollOutcome> {
        let mut outcomes = Vec::with_capacity(self.devices.len());
        for device in &self.devices {
            if let Ok(outcome) = self.poll_one(&device.id).await {
                outcomes.push(outcome);
            }
        }
        outcomes
    }

    /// Switch a device LED; the stored state follows what the device echoes.
    pub async fn set_led(&self, id: &str, on: bool) -> Result<DeviceStatus, DeviceError> {
        let device = self.device(id)?;
        match self.client.set_led(device, on).await {
            Ok(state) => {
                tracing::info!(device_id = %device.id, on = state.on, "led switched");
                Ok(self.update(device, |s| {
                    s.online = true;
                    s.led_on = Some(state.on);
                    s.last_error = None;
                }))
            }
            Err(e) => {
                let message = e.to_string();
                self.update(device, |s| {
                    s.online = false;
                    s.last_error = Some(message);
                });
                Err(e)
            }
        }
    }
}

/// Poll all devices every `interval` until the returned task is aborted.
///
/// `on_alarm` runs for each device whose gas alarm switched on.
pub fn spawn_poller<F>(hub: Arc<DeviceHub>, interval: Duration, on_alarm: F) -> JoinHandle<()>
where
    F: Fn(&DeviceStatus) + Send + Sync + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            for outcome in hub.poll_all().await {
                if outcome.alarm_raised {
                    on_alarm(&outcome.status);
                }
            }
        }
    })
}
