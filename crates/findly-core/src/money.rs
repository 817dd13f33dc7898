//! # Money Module
//!
//! Provides the `Money` type for offer prices and price-alert thresholds.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  The catalog API sends prices as JSON decimals: 249.9                  │
//! │  As f64 that is 249.90000000000000568...                               │
//! │                                                                         │
//! │  Sorting offers, comparing an alert threshold to a price, or echoing   │
//! │  a typed "249,90" back to the server must not drift by a kopeck.       │
//! │                                                                         │
//! │  OUR SOLUTION: integer minor units, converted once at the serde edge   │
//! │    JSON 249.9  ──► Money(24990) ──► JSON 249.9                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use findly_core::money::Money;
//!
//! let price = Money::from_minor(24990);
//! assert_eq!(price.to_string(), "249.90");
//! assert_eq!(Money::parse_decimal("249,9"), Some(price));
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in minor units (kopecks).
///
/// ## Wire Format
/// Serialized as a JSON number with two decimals of precision, because that is
/// what the catalog API speaks. Deserialization rounds half away from zero to
/// the nearest minor unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    ///
    /// ```rust
    /// use findly_core::money::Money;
    ///
    /// let price = Money::from_minor(1099);
    /// assert_eq!(price.minor(), 1099);
    /// ```
    #[inline]
    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    /// Converts an API decimal into minor units, rounding half away from zero.
    ///
    /// Only used at the serde boundary.
    pub fn from_decimal(value: f64) -> Self {
        Money((value * 100.0).round() as i64)
    }

    /// Returns the value as an API decimal.
    pub fn to_decimal(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Parses user input such as `"249"`, `"249.9"` or `"249,90"`.
    ///
    /// Both `.` and `,` are accepted as the decimal separator. At most two
    /// fractional digits; no sign; no thousands separators.
    ///
    /// ```rust
    /// use findly_core::money::Money;
    ///
    /// assert_eq!(Money::parse_decimal("12,5"), Some(Money::from_minor(1250)));
    /// assert_eq!(Money::parse_decimal(".5"), Some(Money::from_minor(50)));
    /// assert_eq!(Money::parse_decimal("12.345"), None);
    /// assert_eq!(Money::parse_decimal("abc"), None);
    /// ```
    pub fn parse_decimal(input: &str) -> Option<Self> {
        let normalized = input.trim().replace(',', ".");
        let (major, minor) = match normalized.split_once('.') {
            Some((major, minor)) => (major, minor),
            None => (normalized.as_str(), ""),
        };

        if major.is_empty() && minor.is_empty() {
            return None;
        }
        if minor.len() > 2 {
            return None;
        }
        let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
        if !all_digits(major) || !all_digits(minor) {
            return None;
        }

        let major: i64 = if major.is_empty() { 0 } else { major.parse().ok()? };
        let minor: i64 = match minor.len() {
            0 => 0,
            1 => minor.parse::<i64>().ok()? * 10,
            _ => minor.parse().ok()?,
        };

        major.checked_mul(100)?.checked_add(minor).map(Money)
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn minor(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor_part())
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.to_decimal())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        if !value.is_finite() {
            return Err(serde::de::Error::custom("price must be a finite number"));
        }
        Ok(Money::from_decimal(value))
    }
}
