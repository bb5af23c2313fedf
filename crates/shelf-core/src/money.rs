//! # Money Module
//!
//! Book prices as integer cents.
//!
//! ## Where Floats Stop
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  GraphQL wire            decode boundary            everything else     │
//! │  ─────────────           ───────────────            ───────────────     │
//! │  price: 12.5   ────────► Money::from_dollars ─────► Money(1250)         │
//! │  (Float)                 (rounded once)             cart math, display  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use shelf_core::money::Money;
//!
//! let price = Money::from_cents(1250);
//! assert_eq!(price.to_string(), "$12.50");
//! assert_eq!((price * 2).cents(), 2500);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul};
use ts_rs::TS;

/// A monetary value in cents.
///
/// Serializes as a bare integer so offline records stay compact.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[serde(transparent)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Converts a dollar amount from the wire into cents, rounding half away
    /// from zero.
    ///
    /// Returns `None` for NaN, infinities and negative prices.
    ///
    /// ```rust
    /// use shelf_core::money::Money;
    ///
    /// assert_eq!(Money::from_dollars(12.5), Some(Money::from_cents(1250)));
    /// assert_eq!(Money::from_dollars(0.1 + 0.2), Some(Money::from_cents(30)));
    /// assert_eq!(Money::from_dollars(-1.0), None);
    /// ```
    pub fn from_dollars(dollars: f64) -> Option<Self> {
        if !dollars.is_finite() || dollars < 0.0 {
            return None;
        }
        let cents = (dollars * 100.0).round();
        if cents > i64::MAX as f64 {
            return None;
        }
        Some(Money(cents as i64))
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the whole-dollar portion.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the cents portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Line total for `qty` copies, saturating instead of overflowing.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}${}.{:02}", sign, self.dollars().abs(), self.cents_part())
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        self.multiply_quantity(qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "$10.99");
        assert_eq!(Money::from_cents(500).to_string(), "$5.00");
        assert_eq!(Money::from_cents(0).to_string(), "$0.00");
        assert_eq!(Money::from_cents(-550).to_string(), "-$5.50");
    }

    #[test]
    fn test_from_dollars_rounds_once() {
        assert_eq!(Money::from_dollars(19.99).unwrap().cents(), 1999);
        assert_eq!(Money::from_dollars(7.0).unwrap().cents(), 700);
        assert_eq!(Money::from_dollars(0.005).unwrap().cents(), 1);
        assert!(Money::from_dollars(f64::NAN).is_none());
        assert!(Money::from_dollars(f64::INFINITY).is_none());
        assert!(Money::from_dollars(-0.01).is_none());
    }

    #[test]
    fn test_sum_and_multiply() {
        let total: Money = [Money::from_cents(250), Money::from_cents(1000)]
            .into_iter()
            .sum();
        assert_eq!(total.cents(), 1250);
        assert_eq!((Money::from_cents(299) * 3).cents(), 897);
    }

    #[test]
    fn test_serializes_as_integer() {
        let json = serde_json::to_string(&Money::from_cents(1250)).unwrap();
        assert_eq!(json, "1250");
    }
}
