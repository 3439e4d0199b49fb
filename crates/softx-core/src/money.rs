//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  With floats:                                                           │
//! │    10.00 * 2 + 5.50 - 3.00 = 22.499999999999996  ❌                     │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Centavos                                         │
//! │    1000 * 2 + 550 - 300 = 2250  →  R$ 22.50  ✅                         │
//! │                                                                         │
//! │  Prices, sale totals and ledger amounts are all stored as centavos.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use softx_core::money::Money;
//!
//! let price = Money::from_cents(1099); // R$ 10.99
//! let doubled = price * 2;             // R$ 21.98
//! assert_eq!(doubled.cents(), 2198);
//!
//! // Text typed into a form field
//! let discount = Money::parse("3,00").unwrap();
//! assert_eq!(discount.cents(), 300);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::error::ValidationError;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in centavos (the smallest BRL unit).
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative intermediate values (subtotal - discount)
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Transparent sqlx type**: Stored as an INTEGER column
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from centavos.
    ///
    /// ## Example
    /// ```rust
    /// use softx_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // Represents R$ 10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from reais and centavos.
    ///
    /// For negative amounts, only the major unit should be negative:
    /// `from_major_minor(-5, 50)` is -R$ 5.50.
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Parses an amount typed by the user.
    ///
    /// ## Rules
    /// - Surrounding whitespace is ignored
    /// - `,` and `.` are both accepted as decimal separator
    /// - Empty text is zero (an untouched field)
    /// - A leading `-` is allowed
    /// - Digits past the second decimal place round half up
    ///
    /// ## Example
    /// ```rust
    /// use softx_core::money::Money;
    ///
    /// assert_eq!(Money::parse("20").unwrap().cents(), 2000);
    /// assert_eq!(Money::parse("5,5").unwrap().cents(), 550);
    /// assert_eq!(Money::parse("").unwrap().cents(), 0);
    /// assert!(Money::parse("abc").is_err());
    /// ```
    pub fn parse(input: &str) -> Result<Money, ValidationError> {
        let text = input.trim().replace(',', ".");
        if text.is_empty() {
            return Ok(Money::zero());
        }

        let invalid = || ValidationError::InvalidFormat {
            field: "amount".to_string(),
            reason: "must be a number such as 10.50".to_string(),
        };

        let (negative, unsigned) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text.as_str()),
        };

        let (major, minor) = unsigned.split_once('.').unwrap_or((unsigned, ""));
        let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if (major.is_empty() && minor.is_empty()) || !all_digits(major) || !all_digits(minor) {
            return Err(invalid());
        }

        let reais: i64 = if major.is_empty() {
            0
        } else {
            major.parse().map_err(|_| invalid())?
        };

        let mut fraction = minor.bytes().map(|b| i64::from(b - b'0'));
        let tenths = fraction.next().unwrap_or(0);
        let hundredths = fraction.next().unwrap_or(0);
        let round_up = fraction.next().is_some_and(|d| d >= 5);

        let cents = reais
            .checked_mul(100)
            .and_then(|c| c.checked_add(tenths * 10 + hundredths + i64::from(round_up)))
            .ok_or_else(invalid)?;

        Ok(Money(if negative { -cents } else { cents }))
    }

    /// Returns the value in centavos.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the reais portion.
    #[inline]
    pub const fn reais(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the centavos portion (always 0-99).
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

    /// Floors negative values at zero.
    ///
    /// ## Example
    /// ```rust
    /// use softx_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(-250).non_negative(), Money::zero());
    /// assert_eq!(Money::from_cents(250).non_negative().cents(), 250);
    /// ```
    #[inline]
    pub const fn non_negative(&self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            Money(self.0)
        }
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use softx_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(550);
    /// assert_eq!(unit_price.multiply_quantity(3).cents(), 1650);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Multiplies by a quantity, `None` on overflow.
    #[inline]
    pub const fn checked_multiply_quantity(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(v) => Some(Money(v)),
            None => None,
        }
    }

    /// Adds, `None` on overflow.
    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(v) => Some(Money(v)),
            None => None,
        }
    }

    /// Subtracts, clamping at the bounds of `i64`.
    #[inline]
    pub const fn saturating_sub(&self, other: Money) -> Self {
        Money(self.0.saturating_sub(other.0))
    }

    /// Formats the amount without currency symbol, e.g. `25.50`.
    ///
    /// Used for the subtotal label, which the sale screen shows bare.
    pub fn to_plain_string(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        format!("{}{}.{:02}", sign, self.reais().abs(), self.cents_part())
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows the amount in reais, e.g. `R$ 10.99`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}R$ {}.{:02}",
            sign,
            self.reais().abs(),
            self.cents_part()
        )
    }
}

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

// =============================================================================
// Unit Tests
// =============================================================================
