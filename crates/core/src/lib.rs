//! `homestock-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod entity;
pub mod error;
pub mod id;
pub mod money;
pub mod value_object;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{EntityId, HouseholdId};
pub use money::Money;
pub use value_object::ValueObject;

/// Serde helper for patch fields: absent stays `None`, `null` becomes
/// `Some(None)` (clear), a value becomes `Some(Some(v))`.
///
/// Use with `#[serde(default, deserialize_with = "homestock_core::nullable")]`.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: serde::Deserialize<'de>,
{
    <Option<T> as serde::Deserialize>::deserialize(deserializer).map(Some)
}

/// Trim a free-text field and reject it when empty or longer than `max` chars.
pub fn required_text(field: &str, value: &str, max: usize) -> DomainResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(format!("{field} cannot be empty")));
    }
    if trimmed.chars().count() > max {
        return Err(DomainError::validation(format!(
            "{field} cannot exceed {max} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Like [`required_text`], but blank input collapses to `None`.
pub fn optional_text(field: &str, value: Option<&str>, max: usize) -> DomainResult<Option<String>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => required_text(field, v, max).map(Some),
    }
}
