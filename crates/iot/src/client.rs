use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::{DeviceConfig, LedState, SensorReading};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeviceError {
    #[error("invalid device configuration: {0}")]
    Config(String),

    #[error("unknown device '{0}'")]
    UnknownDevice(String),

    #[error("device request failed: {0}")]
    Request(String),

    #[error("device answered with status {0}")]
    Status(u16),

    #[error("device sent an unreadable body: {0}")]
    Decode(String),
}

/// Transport to a single device.
#[async_trait]
pub trait DeviceClient: Send + Sync {
    async fn read_sensors(&self, device: &DeviceConfig) -> Result<SensorReading, DeviceError>;

    async fn set_led(&self, device: &DeviceConfig, on: bool) -> Result<LedState, DeviceError>;
}

/// Plain HTTP+JSON client with a per-request timeout.
#[derive(Debug, Clone)]
pub struct HttpDeviceClient {
    http: reqwest::Client,
}

impl HttpDeviceClient {
    pub fn new(timeout: Duration) -> Result<Self, DeviceError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DeviceError::Config(e.to_string()))?;
        Ok(Self { http })
    }
}

async fn decode_json<T: serde::de::DeserializeOwned>(res: reqwest::Response) -> Result<T, DeviceError> {
    let status = res.status();
    if !status.is_success() {
        return Err(DeviceError::Status(status.as_u16()));
    }
    res.json::<T>()
        .await
        .map_err(|e| DeviceError::Decode(e.to_string()))
}

#[async_trait]
impl DeviceClient for HttpDeviceClient {
    async fn read_sensors(&self, device: &DeviceConfig) -> Result<SensorReading, DeviceError> {
        let res = self
            .http
            .get(device.endpoint("sensor")?)
            .send()
            .await
            .map_err(|e| DeviceError::Request(e.to_string()))?;
        decode_json(res).await
    }

    async fn set_led(&self, device: &DeviceConfig, on: bool) -> Result<LedState, DeviceError> {
        let res = self
            .http
            .post(device.endpoint("led")?)
            .json(&LedState { on })
            .send()
            .await
            .map_err(|e| DeviceError::Request(e.to_string()))?;
        decode_json(res).await
    }
}
