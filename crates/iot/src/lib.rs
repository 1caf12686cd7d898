//! Simulated household sensors: fixed LAN devices polled over HTTP+JSON.
//!
//! A device answers `GET {base}/sensor` with `{temperature, humidity, gas}`
//! and `POST {base}/led` with `{"on": bool}`, echoing the new LED state.

pub mod client;
pub mod device;
pub mod hub;

pub use client::{DeviceClient, DeviceError, HttpDeviceClient};
pub use device::{DeviceConfig, LedState, SensorReading};
pub use hub::{DeviceHub, DeviceStatus, PollOutcome, spawn_poller};
