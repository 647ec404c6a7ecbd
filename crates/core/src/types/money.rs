//! Monetary amounts using decimal arithmetic.
//!
//! Prices are stored as `NUMERIC(10, 2)`, so every `Money` value is kept at
//! two decimal places. Line totals are computed with [`Money::times`] and
//! summed with the `Sum` impl so order totals never pass through floats.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// A non-negative amount in the shop currency, at two decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Create an amount, rounding to two decimal places.
    #[must_use]
    pub fn new(amount: Decimal) -> Self {
        Self(amount.round_dp(2))
    }

    /// Create an amount from minor units (e.g. paise or cents).
    #[must_use]
    pub fn from_minor(minor: i64) -> Self {
        Self(Decimal::new(minor, 2))
    }

    #[must_use]
    pub const fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price of `quantity` units at this unit price.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self::new(self.0 * Decimal::from(quantity))
    }

    /// Amount in minor units, as payment gateways expect.
    ///
    /// Returns `None` if the amount does not fit in an `i64`.
    #[must_use]
    pub fn to_minor(&self) -> Option<i64> {
        (self.0 * Decimal::ONE_HUNDRED).round().to_i64()
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.0 + rhs.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::zero(), Add::add)
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self::new(amount)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_times_and_display() {
        let price = Money::from_minor(10_000);
        assert_eq!(price.to_string(), "100.00");
        assert_eq!(price.times(2).to_string(), "200.00");
        assert_eq!(price.times(2), Money::from_minor(20_000));
    }

    #[test]
    fn test_sum() {
        let total: Money = [Money::from_minor(1999), Money::from_minor(1), Money::from_minor(500)]
            .into_iter()
            .sum();
        assert_eq!(total.to_string(), "25.00");

        let empty: Money = std::iter::empty().sum();
        assert_eq!(empty, Money::zero());
        assert_eq!(empty.to_string(), "0.00");
    }

    #[test]
    fn test_new_rounds_to_cents() {
        let m = Money::new(Decimal::new(12_346, 3));
        assert_eq!(m.to_string(), "12.35");
    }

    #[test]
    fn test_to_minor() {
        assert_eq!(Money::from_minor(20_050).to_minor(), Some(20_050));
        assert_eq!(Money::zero().to_minor(), Some(0));
    }
}
