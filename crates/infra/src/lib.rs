//! Infrastructure layer: configuration, storage, application services, exports.

pub mod config;
pub mod export;
pub mod services;
pub mod store;

pub use config::{AppConfig, ConfigError, LogFormat, StorageConfig};
pub use services::{ServiceError, ServiceResult};
pub use store::{InMemoryHouseholdStore, PostgresHouseholdStore, StoreError, HouseholdStore};
