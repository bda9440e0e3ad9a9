//! # Money Module
//!
//! Canonical rounding, tolerance comparison and the `Money` type.
//!
//! ## Two Representations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  PARSED (Decimal)                      RECONCILED (Money, i64 cents)    │
//! │                                                                         │
//! │  OCR says "2 x 2.495"   ──round2──►    499 cents                        │
//! │  Subtotal "22.004"      ──round2──►    2200 cents                       │
//! │                                                                         │
//! │  Decimal keeps whatever the parser saw. The moment a value takes part  │
//! │  in a comparison or a split it goes through round2() and becomes      │
//! │  integer cents. Nothing downstream of reconciliation ever sees a       │
//! │  fractional cent.                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use rust_decimal::Decimal;
//! use tabsplit_core::money::{round2, Money};
//!
//! assert_eq!(round2(Decimal::new(125, 3)), Decimal::new(13, 2)); // 0.125 → 0.13
//!
//! let subtotal = Money::try_from_decimal(Decimal::new(2198, 2)).unwrap();
//! assert_eq!(subtotal.cents(), 2198);
//! assert!(subtotal.equals_within(Money::from_cents(2200), Money::from_cents(2)));
//! ```

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use ts_rs::TS;

/// Default tolerance for "equal" money: absorbs up to 2 cents of OCR noise.
pub const DEFAULT_TOLERANCE: Money = Money::from_cents(2);

// =============================================================================
// Decimal Helpers
// =============================================================================

/// Rounds a decimal to 2 fractional digits, half away from zero.
///
/// ## Examples
/// ```text
///  0.125 →  0.13
/// -0.125 → -0.13
///  2.675 →  2.68   (exact decimal, no binary float surprise)
/// ```
///
/// Total function: every decimal has a 2-digit rounding.
#[inline]
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Returns true iff `|a - b| <= tolerance`.
#[inline]
pub fn equals_within(a: Decimal, b: Decimal, tolerance: Decimal) -> bool {
    (a - b).abs() <= tolerance
}

/// The default tolerance as a decimal (0.02).
#[inline]
pub fn default_tolerance() -> Decimal {
    DEFAULT_TOLERANCE.to_decimal()
}

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents for USD).
///
/// ## Design Decisions
/// - **i64 (signed)**: discrepancies and drift can be negative
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Serialized as cents**: `{"tax_alloc": 34}` means $0.34
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use tabsplit_core::money::Money;
    ///
    /// let price = Money::from_cents(1299); // Represents $12.99
    /// assert_eq!(price.cents(), 1299);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units (dollars and cents).
    ///
    /// For negative amounts, only the major unit should be negative:
    /// `from_major_minor(-5, 50)` = -$5.50, not -$4.50
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Converts a parsed decimal into cents via [`round2`].
    ///
    /// Returns `None` when the rounded value does not fit in `i64` cents.
    ///
    /// ## Example
    /// ```rust
    /// use rust_decimal::Decimal;
    /// use tabsplit_core::money::Money;
    ///
    /// let m = Money::try_from_decimal(Decimal::new(-125, 3)).unwrap(); // -0.125
    /// assert_eq!(m.cents(), -13);
    /// ```
    pub fn try_from_decimal(value: Decimal) -> Option<Self> {
        round2(value)
            .checked_mul(Decimal::ONE_HUNDRED)?
            .to_i64()
            .map(Money)
    }

    /// Returns the exact decimal value (always 2 fractional digits).
    #[inline]
    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    /// Returns the value in cents (smallest currency unit).
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (dollars) portion.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit (cents) portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Returns true iff `|self - other| <= tolerance`.
    ///
    /// ## Example
    /// ```rust
    /// use tabsplit_core::money::{Money, DEFAULT_TOLERANCE};
    ///
    /// let items = Money::from_cents(2198);
    /// assert!(items.equals_within(Money::from_cents(2200), DEFAULT_TOLERANCE));
    /// assert!(!items.equals_within(Money::from_cents(2201), DEFAULT_TOLERANCE));
    /// ```
    #[inline]
    pub fn equals_within(&self, other: Money, tolerance: Money) -> bool {
        (self.0 as i128 - other.0 as i128).abs() <= tolerance.0 as i128
    }

    /// `self + other`, or `None` if the result does not fit in i64 cents.
    #[inline]
    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    /// `self - other`, or `None` if the result does not fit in i64 cents.
    #[inline]
    pub fn checked_sub(self, other: Money) -> Option<Money> {
        self.0.checked_sub(other.0).map(Money)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// ## Note
/// Used in reconciliation reasons and audit messages. Localized display is
/// the frontend's job.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}${}.{:02}",
            sign,
            self.dollars().abs(),
            self.cents_part()
        )
    }
}

/// Default money is zero.
impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

/// Multiplication by i64 (quantity).
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
