//! Process configuration read from the environment.

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

use homestock_iot::DeviceConfig;
pub use homestock_observability::LogFormat;

const DEV_JWT_SECRET: &str = "dev-secret";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}: {message}")]
    Invalid { var: &'static str, message: String },

    #[error("{0} is required when USE_PERSISTENT_STORES=true")]
    Missing(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    InMemory,
    Postgres {
        database_url: String,
        max_connections: u32,
    },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub token_ttl: chrono::Duration,
    pub storage: StorageConfig,
    pub devices: Vec<DeviceConfig>,
    pub poll_interval: Duration,
    pub device_timeout: Duration,
    pub gas_alarm_threshold: f64,
    pub log_format: LogFormat,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let bind_addr = parse_or(&get, "BIND_ADDR", "0.0.0.0:8080".parse().ok())?;

        let jwt_secret = match get("JWT_SECRET") {
            Some(secret) => secret,
            None => {
                tracing::warn!("JWT_SECRET not set; using the development secret");
                DEV_JWT_SECRET.to_string()
            }
        };

        let ttl_minutes: i64 = parse_or(&get, "TOKEN_TTL_MINUTES", Some(720))?;
        if ttl_minutes <= 0 {
            return Err(invalid("TOKEN_TTL_MINUTES", "must be positive"));
        }

        let persistent = match get("USE_PERSISTENT_STORES") {
            None => false,
            Some(v) => parse_bool(&v).ok_or_else(|| invalid("USE_PERSISTENT_STORES", "expected true or false"))?,
        };
        let storage = if persistent {
            StorageConfig::Postgres {
                database_url: get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?,
                max_connections: parse_or(&get, "DATABASE_MAX_CONNECTIONS", Some(5))?,
            }
        } else {
            StorageConfig::InMemory
        };

        let devices = DeviceConfig::parse_list(&get("HOMESTOCK_DEVICES").unwrap_or_default())
            .map_err(|e| invalid("HOMESTOCK_DEVICES", e.to_string()))?;

        let poll_secs: u64 = parse_or(&get, "IOT_POLL_INTERVAL_SECS", Some(10))?;
        let timeout_ms: u64 = parse_or(&get, "IOT_REQUEST_TIMEOUT_MS", Some(2000))?;
        let gas_alarm_threshold: f64 = parse_or(&get, "IOT_GAS_ALARM_THRESHOLD", Some(400.0))?;
        if !gas_alarm_threshold.is_finite() {
            return Err(invalid("IOT_GAS_ALARM_THRESHOLD", "must be a finite number"));
        }

        let log_format: LogFormat = parse_or(&get, "LOG_FORMAT", Some(LogFormat::Json))?;

        Ok(Self {
            bind_addr,
            jwt_secret,
            token_ttl: chrono::Duration::minutes(ttl_minutes),
            storage,
            devices,
            poll_interval: Duration::from_secs(poll_secs.max(1)),
            device_timeout: Duration::from_millis(timeout_ms),
            gas_alarm_threshold,
            log_format,
        })
    }

    /// In-memory defaults, no devices.
    pub fn for_tests(jwt_secret: &str) -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            jwt_secret: jwt_secret.to_string(),
            token_ttl: chrono::Duration::minutes(60),
            storage: StorageConfig::InMemory,
            devices: vec![],
            poll_interval: Duration::from_secs(10),
            device_timeout: Duration::from_millis(500),
            gas_alarm_threshold: 400.0,
            log_format: LogFormat::Pretty,
        }
    }
}

fn invalid(var: &'static str, message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        var,
        message: message.into(),
    }
}

fn parse_or<T, G>(get: &G, var: &'static str, default: Option<T>) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(var) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| invalid(var, e.to_string())),
        None => default.ok_or(ConfigError::Missing(var)),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
