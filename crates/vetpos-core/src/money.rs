//! # Money Module
//!
//! Provides the `Money` type for monetary values and the `ExchangeRate`
//! used to fold local-currency payments into the base currency.
//!
//! ## Fixed-Point Arithmetic
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Dose line: 0.33 ml at 2.10 per ml                                      │
//! │                                                                         │
//! │    price     210 cents                                                  │
//! │    quantity   33 hundredths                                             │
//! │    product  6930 cents·hundredths  ──► ÷ 100, half away from zero      │
//! │    subtotal   69 cents                                                  │
//! │                                                                         │
//! │  One rounding step per line. Sums of lines are exact.                   │
//! │                                                                         │
//! │  Bs payment: 1460.00 Bs at 36.500000 Bs/$                               │
//! │    146000 cents × 10^6 ÷ 36500000 micros ──► 4000 cents ($40.00)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use vetpos_core::money::Money;
//! use vetpos_core::quantity::Quantity;
//!
//! let per_dose = Money::from_cents(200); // 2.00
//! let subtotal = per_dose.times(Quantity::from_whole(5));
//! assert_eq!(subtotal.cents(), 1000);
//!
//! let parsed: Money = "10.50".parse().unwrap();
//! assert_eq!(parsed.cents(), 1050);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use std::str::FromStr;
use ts_rs::TS;

use crate::numeric::{div_round, format_fixed, parse_fixed, pow10, ParseFixedError};
use crate::quantity::Quantity;

/// Decimal places carried by [`Money`].
pub const MONEY_SCALE: u32 = 2;

/// Decimal places carried by [`ExchangeRate`].
pub const RATE_SCALE: u32 = 6;

/// Largest amount accepted from the operator or the catalog: 1,000,000,000.00.
///
/// Sums of bounded amounts stay far from `i64::MAX`; arithmetic still
/// saturates so an unbounded value can never wrap.
pub const MAX_MONEY_CENTS: i64 = 100_000_000_000;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: a line total may dip below zero while a discount is
///   being edited; only the order total is clamped
/// - **Saturating**: `+`, `-` and [`Money::times`] clamp at the i64 range
///   instead of wrapping, so a clamp like `max(0, …)` always holds
/// - **Currency-agnostic**: base-currency and local-currency amounts share
///   the type; which is which is carried by the field name
///
/// ## User Workflow Context
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                    Where Money is Used                                  │
/// │                                                                         │
/// │  Product.sale_price ─────┬──► CartLine.unit_price ──► CartLine.subtotal │
/// │  Product.sale_price_per_dose ┘                                          │
/// │                                                                         │
/// │  Cart.subtotal − discounts ──► Cart.total ──► PaymentSummary.remaining  │
/// │                                                                         │
/// │  amount_paid_bs ──► ExchangeRate::to_base ──► tendered (base currency)  │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use vetpos_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // Represents 10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

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

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.saturating_abs())
    }

    /// True when the magnitude is within [`MAX_MONEY_CENTS`].
    #[inline]
    pub const fn is_within_limit(&self) -> bool {
        self.0 >= -MAX_MONEY_CENTS && self.0 <= MAX_MONEY_CENTS
    }

    #[inline]
    pub const fn saturating_sub(&self, other: Money) -> Money {
        Money(self.0.saturating_sub(other.0))
    }

    /// Clamps negative values up to zero.
    ///
    /// ## Example
    /// ```rust
    /// use vetpos_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(-500).clamp_non_negative(), Money::zero());
    /// assert_eq!(Money::from_cents(500).clamp_non_negative().cents(), 500);
    /// ```
    #[inline]
    pub const fn clamp_non_negative(&self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            Money(self.0)
        }
    }

    /// Multiplies a unit price by a (possibly fractional) quantity.
    ///
    /// The exact product is computed in i128 and rounded once, half away
    /// from zero, to the cent. A result outside the i64 range saturates.
    ///
    /// ## Example
    /// ```rust
    /// use vetpos_core::money::Money;
    /// use vetpos_core::quantity::Quantity;
    ///
    /// let per_ml = Money::from_cents(125); // 1.25
    /// let half_ml = Quantity::from_hundredths(50);
    /// // 1.25 × 0.5 = 0.625 → 0.63
    /// assert_eq!(per_ml.times(half_ml).cents(), 63);
    /// ```
    pub fn times(&self, qty: Quantity) -> Money {
        let product = self.0 as i128 * qty.hundredths() as i128;
        Money(saturate(div_round(product, 100)))
    }

    /// Converts to an `f64` number of major units.
    ///
    /// Only for wire payloads whose schema demands a JSON number. Never
    /// feed the result back into arithmetic.
    pub fn to_major_f64(&self) -> f64 {
        self.0 as f64 / 100.0
    }
}

/// Displays as a plain two-place decimal (`12.34`, `-5.50`).
///
/// Currency symbols belong to the presentation layer, which knows whether
/// an amount is in the base or the local currency.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_fixed(self.0, MONEY_SCALE))
    }
}

impl FromStr for Money {
    type Err = ParseFixedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_fixed(s, MONEY_SCALE).map(Money)
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
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_sub(other.0);
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}

/// Narrows an exact i128 result back to i64, clamping at the range ends.
fn saturate(value: i128) -> i64 {
    i64::try_from(value).unwrap_or(if value < 0 { i64::MIN } else { i64::MAX })
}

// =============================================================================
// Exchange Rate
// =============================================================================

/// Local-currency units per one base-currency unit, in millionths.
///
/// `36.5421` Bs per USD is stored as `36_542_100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ExchangeRate(i64);

impl ExchangeRate {
    #[inline]
    pub const fn from_micros(micros: i64) -> Self {
        ExchangeRate(micros)
    }

    #[inline]
    pub const fn micros(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Converts a local-currency amount into the base currency.
    ///
    /// Returns `None` for a non-positive rate.
    ///
    /// ## Example
    /// ```rust
    /// use vetpos_core::money::{ExchangeRate, Money};
    ///
    /// let rate: ExchangeRate = "40".parse().unwrap();
    /// let bs = Money::from_cents(80_000); // 800.00 Bs
    /// assert_eq!(rate.to_base(bs).unwrap().cents(), 2_000); // 20.00
    /// ```
    pub fn to_base(&self, local: Money) -> Option<Money> {
        if self.0 <= 0 {
            return None;
        }
        let scaled = local.cents() as i128 * pow10(RATE_SCALE);
        Some(Money(saturate(div_round(scaled, self.0 as i128))))
    }

    pub fn to_f64(&self) -> f64 {
        self.0 as f64 / pow10(RATE_SCALE) as f64
    }
}

impl fmt::Display for ExchangeRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_fixed(self.0, RATE_SCALE))
    }
}

impl FromStr for ExchangeRate {
    type Err = ParseFixedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_fixed(s, RATE_SCALE).map(ExchangeRate)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert!(money.is_within_limit());
        assert!(!Money::from_cents(MAX_MONEY_CENTS + 1).is_within_limit());
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "10.99");
        assert_eq!(Money::from_cents(500).to_string(), "5.00");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
        assert_eq!(Money::from_cents(0).to_string(), "0.00");
    }

    #[test]
    fn test_parse() {
        assert_eq!("10".parse::<Money>().unwrap().cents(), 1000);
        assert_eq!("0.1".parse::<Money>().unwrap().cents(), 10);
        assert_eq!("2.005".parse::<Money>().unwrap().cents(), 201);
        assert!("ten".parse::<Money>().is_err());
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);
        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((b - a).clamp_non_negative(), Money::zero());

        let total: Money = [a, b, b].iter().sum();
        assert_eq!(total.cents(), 2000);
    }

    #[test]
    fn test_arithmetic_saturates() {
        let huge = Money::from_cents(i64::MAX - 10);
        assert_eq!((huge + huge).cents(), i64::MAX);
        assert_eq!((Money::from_cents(1000) - huge - huge).cents(), i64::MIN);
        assert_eq!(
            (Money::from_cents(1000) - huge - huge).clamp_non_negative(),
            Money::zero()
        );

        let total: Money = [huge, huge, Money::from_cents(1)].iter().sum();
        assert_eq!(total.cents(), i64::MAX);

        assert_eq!(
            Money::from_cents(500).saturating_sub(Money::from_cents(200)).cents(),
            300
        );
    }

    #[test]
    fn test_times_saturates_instead_of_wrapping() {
        // 46116860184273879.13 × 2 does not fit in i64 cents
        let price = Money::from_cents(4_611_686_018_427_387_913);
        let subtotal = price.times(Quantity::from_whole(2));
        assert_eq!(subtotal.cents(), i64::MAX);
        assert!(!subtotal.is_negative());

        let negative = Money::from_cents(-4_611_686_018_427_387_913);
        assert_eq!(negative.times(Quantity::from_whole(2)).cents(), i64::MIN);
    }

    #[test]
    fn test_times_whole_quantity() {
        let unit_price = Money::from_cents(299);
        assert_eq!(unit_price.times(Quantity::from_whole(3)).cents(), 897);
    }

    #[test]
    fn test_times_rounds_once() {
        // 0.10 × 0.33 = 0.033 → 0.03
        let price = Money::from_cents(10);
        assert_eq!(price.times(Quantity::from_hundredths(33)).cents(), 3);
        // 2.10 × 0.5 = 1.05 exactly
        let price = Money::from_cents(210);
        assert_eq!(price.times(Quantity::from_hundredths(50)).cents(), 105);
    }

    /// 0.1 + 0.2 must be exactly 0.3 here, unlike f64.
    #[test]
    fn test_no_float_drift() {
        let a: Money = "0.1".parse().unwrap();
        let b: Money = "0.2".parse().unwrap();
        assert_eq!(a + b, "0.3".parse::<Money>().unwrap());
    }

    #[test]
    fn test_exchange_rate_conversion() {
        let rate: ExchangeRate = "36.5".parse().unwrap();
        assert_eq!(rate.micros(), 36_500_000);
        // 365.00 Bs / 36.5 = 10.00
        assert_eq!(rate.to_base(Money::from_cents(36_500)).unwrap().cents(), 1_000);
        // 100.00 Bs / 36.5 = 2.7397… → 2.74
        assert_eq!(rate.to_base(Money::from_cents(10_000)).unwrap().cents(), 274);
    }

    #[test]
    fn test_exchange_rate_rejects_non_positive() {
        assert!(ExchangeRate::from_micros(0).to_base(Money::from_cents(100)).is_none());
        assert!(ExchangeRate::from_micros(-1).to_base(Money::from_cents(100)).is_none());
    }
}
