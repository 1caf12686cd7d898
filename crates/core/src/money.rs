//! Money in minor units.

use serde::{Deserialize, Serialize};

use crate::ValueObject;

/// Non-negative amount of money in minor units (cents).
///
/// Serialized as a bare integer so the wire format stays exact.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(u64);

impl ValueObject for Money {}

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    pub const fn cents(self) -> u64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    pub fn saturating_add(self, other: Money) -> Money {
        Money(self.0.saturating_add(other.0))
    }

    pub fn saturating_sub(self, other: Money) -> Money {
        Money(self.0.saturating_sub(other.0))
    }

    /// Signed difference `self - other` in cents, clamped to `i64`.
    pub fn signed_diff(self, other: Money) -> i64 {
        let diff = i128::from(self.0) - i128::from(other.0);
        diff.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
    }

    pub fn sum<I: IntoIterator<Item = Money>>(items: I) -> Money {
        items.into_iter().fold(Money::ZERO, Money::saturating_add)
    }
}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn display_formats_two_decimals() {
        assert_eq!(Money::from_cents(0).to_string(), "0.00");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
        assert_eq!(Money::from_cents(123456).to_string(), "1234.56");
    }

    #[test]
    fn serializes_as_integer_cents() {
        let json = serde_json::to_string(&Money::from_cents(2599)).unwrap();
        assert_eq!(json, "2599");
    }

    #[test]
    fn signed_diff_goes_negative() {
        assert_eq!(Money::from_cents(100).signed_diff(Money::from_cents(250)), -150);
    }

    proptest! {
        #[test]
        fn sum_matches_integer_sum(values in proptest::collection::vec(0u64..1_000_000, 0..50)) {
            let total = Money::sum(values.iter().copied().map(Money::from_cents));
            prop_assert_eq!(total.cents(), values.iter().sum::<u64>());
        }

        #[test]
        fn signed_diff_is_antisymmetric(a in 0u64..u32::MAX as u64, b in 0u64..u32::MAX as u64) {
            let x = Money::from_cents(a);
            let y = Money::from_cents(b);
            prop_assert_eq!(x.signed_diff(y), -y.signed_diff(x));
        }
    }
}
