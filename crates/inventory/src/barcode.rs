//! Stored barcode records and loose date extraction.
//!
//! Codes are scanned from packaging and stored as-is. Two kinds of dates are
//! pulled out of them:
//! - GS1 element strings in human-readable form, `(11)YYMMDD` (production)
//!   and `(17)YYMMDD` (expiry). A day of `00` means the last day of the month.
//! - Any embedded `YYYYMMDD` digit window, or failing that a standalone
//!   six-digit `YYMMDD` run.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use homestock_core::{DomainError, DomainResult, Entity, EntityId, HouseholdId, ValueObject};

const MAX_CODE_LEN: usize = 128;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BarcodeId(pub EntityId);

impl BarcodeId {
    pub fn generate() -> Self {
        Self(EntityId::new())
    }
}

impl core::fmt::Display for BarcodeId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl core::str::FromStr for BarcodeId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedBarcode {
    pub production_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub embedded_date: Option<NaiveDate>,
}

impl ValueObject for DecodedBarcode {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarcodeRecord {
    pub id: BarcodeId,
    pub household_id: HouseholdId,
    pub code: String,
    pub created_at: DateTime<Utc>,
    pub decoded: DecodedBarcode,
}

impl Entity for BarcodeRecord {
    type Id = BarcodeId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl BarcodeRecord {
    pub fn create(household_id: HouseholdId, code: &str, now: DateTime<Utc>) -> DomainResult<Self> {
        let code = normalize_code(code)?;
        let decoded = decode(&code);
        Ok(Self {
            id: BarcodeId::generate(),
            household_id,
            code,
            created_at: now,
            decoded,
        })
    }
}

pub fn normalize_code(raw: &str) -> DomainResult<String> {
    let code = raw.trim();
    if code.is_empty() {
        return Err(DomainError::validation("barcode cannot be empty"));
    }
    if code.chars().count() > MAX_CODE_LEN {
        return Err(DomainError::validation(format!(
            "barcode cannot exceed {MAX_CODE_LEN} characters"
        )));
    }
    if code.chars().any(char::is_control) {
        return Err(DomainError::validation("barcode contains control characters"));
    }
    Ok(code.to_string())
}

/// Pull whatever dates can be found in a code. Never fails.
pub fn decode(code: &str) -> DecodedBarcode {
    DecodedBarcode {
        production_date: gs1_date(code, "(11)"),
        expiry_date: gs1_date(code, "(17)"),
        embedded_date: embedded_date(code),
    }
}

fn gs1_date(code: &str, ai: &str) -> Option<NaiveDate> {
    let start = code.find(ai)? + ai.len();
    let digits = code.get(start..start + 6)?;
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let (yy, mm, dd) = split_yymmdd(digits)?;
    let year = 2000 + yy;
    if dd == 0 {
        last_day_of_month(year, mm)
    } else {
        NaiveDate::from_ymd_opt(year, mm, dd)
    }
}

fn embedded_date(code: &str) -> Option<NaiveDate> {
    let runs: Vec<&str> = code
        .split(|c: char| !c.is_ascii_digit())
        .filter(|run| !run.is_empty())
        .collect();

    let long = runs.iter().find_map(|run| {
        windows(run, 8).find_map(|w| {
            let year: i32 = w[0..4].parse().ok()?;
            let month: u32 = w[4..6].parse().ok()?;
            let day: u32 = w[6..8].parse().ok()?;
            if !(2000..=2099).contains(&year) {
                return None;
            }
            NaiveDate::from_ymd_opt(year, month, day)
        })
    });

    // Six-digit dates only count as a whole run; inside longer runs (EAN/UPC
    // bodies) nearly every window parses as some date.
    long.or_else(|| {
        runs.iter().filter(|run| run.len() == 6).find_map(|run| {
            let (yy, mm, dd) = split_yymmdd(run)?;
            NaiveDate::from_ymd_opt(2000 + yy, mm, dd)
        })
    })
}

fn windows(run: &str, len: usize) -> impl Iterator<Item = &str> {
    // Runs are ASCII digits, so byte offsets are char offsets.
    (0..=run.len().saturating_sub(len))
        .filter(move |_| run.len() >= len)
        .map(move |i| &run[i..i + len])
}

fn split_yymmdd(digits: &str) -> Option<(i32, u32, u32)> {
    let yy: i32 = digits.get(0..2)?.parse().ok()?;
    let mm: u32 = digits.get(2..4)?.parse().ok()?;
    let dd: u32 = digits.get(4..6)?.parse().ok()?;
    Some((yy, mm, dd))
}

fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if first.month() == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    next.pred_opt()
}
