//! Availability status derivation.

use core::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use homestock_core::{DomainError, ValueObject};

/// Availability of an inventory item, derived on every save.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StockStatus {
    #[serde(rename = "Available")]
    Available,
    #[serde(rename = "Low Stock")]
    LowStock,
    #[serde(rename = "Out of Stock")]
    OutOfStock,
    #[serde(rename = "Expired")]
    Expired,
}

impl ValueObject for StockStatus {}

impl StockStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            StockStatus::Available => "Available",
            StockStatus::LowStock => "Low Stock",
            StockStatus::OutOfStock => "Out of Stock",
            StockStatus::Expired => "Expired",
        }
    }

    /// Statuses that call for buying more.
    pub fn needs_restock(self) -> bool {
        matches!(self, StockStatus::LowStock | StockStatus::OutOfStock)
    }
}

impl core::fmt::Display for StockStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StockStatus {
    type Err = DomainError;

    /// Accepts the display form ("Low Stock") as well as snake/kebab case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "available" => Ok(StockStatus::Available),
            "lowstock" => Ok(StockStatus::LowStock),
            "outofstock" => Ok(StockStatus::OutOfStock),
            "expired" => Ok(StockStatus::Expired),
            _ => Err(DomainError::validation(format!("unknown stock status '{s}'"))),
        }
    }
}

/// Status rule, first match wins:
/// expired (`expiry_date <= today`), then out of stock (`quantity <= 0`),
/// then low stock (`quantity <= threshold`), else available.
pub fn derive_status(
    quantity: i64,
    threshold: i64,
    expiry_date: Option<NaiveDate>,
    today: NaiveDate,
) -> StockStatus {
    if expiry_date.is_some_and(|d| d <= today) {
        StockStatus::Expired
    } else if quantity <= 0 {
        StockStatus::OutOfStock
    } else if quantity <= threshold {
        StockStatus::LowStock
    } else {
        StockStatus::Available
    }
}
