use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::DeviceError;

/// One configured device on the local network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceConfig {
    pub id: String,
    pub base_url: Url,
}

impl DeviceConfig {
    pub fn new(id: &str, base_url: &str) -> Result<Self, DeviceError> {
        let id = id.trim();
        if id.is_empty()
            || !id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(DeviceError::Config(format!("invalid device id '{id}'")));
        }

        let mut base_url = Url::parse(base_url.trim())
            .map_err(|e| DeviceError::Config(format!("device '{id}': {e}")))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(DeviceError::Config(format!(
                "device '{id}': only http(s) urls are supported"
            )));
        }

        // Endpoints are joined relative to the base, so it must name a directory.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            id: id.to_string(),
            base_url,
        })
    }

    /// Parse `id=url` pairs separated by commas. Blank input yields no devices.
    pub fn parse_list(raw: &str) -> Result<Vec<Self>, DeviceError> {
        let mut devices: Vec<DeviceConfig> = Vec::new();
        for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (id, url) = entry
                .split_once('=')
                .ok_or_else(|| DeviceError::Config(format!("expected id=url, got '{entry}'")))?;
            let device = DeviceConfig::new(id, url)?;
            if devices.iter().any(|d| d.id == device.id) {
                return Err(DeviceError::Config(format!("duplicate device id '{}'", device.id)));
            }
            devices.push(device);
        }
        Ok(devices)
    }

    pub fn endpoint(&self, path: &str) -> Result<Url, DeviceError> {
        self.base_url
            .join(path)
            .map_err(|e| DeviceError::Config(format!("device '{}': {e}", self.id)))
    }
}

/// Latest sensor values. Devices may omit sensors they do not carry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub humidity: Option<f64>,
    #[serde(default)]
    pub gas: Option<f64>,
}

impl SensorReading {
    pub fn gas_exceeds(&self, threshold: f64) -> bool {
        self.gas.is_some_and(|g| g > threshold)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedState {
    pub on: bool,
}
