//! Inventory domain module.
//!
//! Household goods with a derived availability status, low-stock alerts, and
//! stored barcode records. Pure domain logic: no IO, no HTTP, no storage.

pub mod barcode;
pub mod item;
pub mod status;

pub use barcode::{BarcodeId, BarcodeRecord, DecodedBarcode, decode};
pub use item::{InventoryItem, InventoryItemId, ItemPatch, LowStockAlert, NewItem, StatusChange};
pub use status::{StockStatus, derive_status};
