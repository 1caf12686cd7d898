//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects have no identity and are compared by their attribute values
/// (`Money`, `StockStatus`, decoded barcode dates). To "modify" one, build a new one.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
