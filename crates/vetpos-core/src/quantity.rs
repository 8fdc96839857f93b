//! # Quantity Module
//!
//! Sellable amounts, stored as hundredths so that half a milliliter or a
//! ninth of a tablet rounded to two places is exact.
//!
//! ```text
//! Quantity::from_whole(3)          →  300 hundredths  →  "3"
//! "2.5".parse::<Quantity>()        →  250 hundredths  →  "2.50"
//! "0.333".parse::<Quantity>()      →   33 hundredths  →  "0.33"
//! ```
//!
//! Whole-unit lines only ever hold whole quantities; dose lines may hold
//! any two-place value. That rule lives in
//! [`validation::coerce_quantity`](crate::validation::coerce_quantity).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub};
use std::str::FromStr;
use ts_rs::TS;

use crate::numeric::{div_round, format_fixed, parse_fixed, ParseFixedError};

/// Decimal places carried by a [`Quantity`].
pub const QUANTITY_SCALE: u32 = 2;

const HUNDRED: i64 = 100;

/// A quantity in hundredths of a unit (whole unit or dose, depending on the
/// sale mode it is paired with).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Quantity(i64);

impl Quantity {
    pub const ZERO: Quantity = Quantity(0);
    pub const ONE: Quantity = Quantity(HUNDRED);

    /// Creates a whole quantity (`from_whole(3)` is three units).
    #[inline]
    pub const fn from_whole(units: i64) -> Self {
        Quantity(units * HUNDRED)
    }

    #[inline]
    pub const fn from_hundredths(hundredths: i64) -> Self {
        Quantity(hundredths)
    }

    #[inline]
    pub const fn hundredths(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// True when the quantity has no fractional part.
    #[inline]
    pub const fn is_whole(&self) -> bool {
        self.0 % HUNDRED == 0
    }

    /// Drops any fractional part (toward zero).
    #[inline]
    pub const fn floor_whole(&self) -> Self {
        Quantity(self.0 / HUNDRED * HUNDRED)
    }

    /// The whole-unit count, truncating any fraction.
    #[inline]
    pub const fn whole_units(&self) -> i64 {
        self.0 / HUNDRED
    }

    /// Multiplies two quantities (e.g. units × doses per unit), rounding
    /// the product back to two places. Saturates at the i64 range.
    pub fn times(&self, other: Quantity) -> Quantity {
        let product = self.0 as i128 * other.0 as i128;
        let rounded = div_round(product, HUNDRED as i128);
        Quantity(i64::try_from(rounded).unwrap_or(if rounded < 0 { i64::MIN } else { i64::MAX }))
    }

    /// Float form for JSON payloads only. Never compute with it.
    pub fn to_f64(&self) -> f64 {
        self.0 as f64 / HUNDRED as f64
    }
}

/// Displays whole quantities without decimals, fractional ones with two.
impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_whole() {
            write!(f, "{}", self.0 / HUNDRED)
        } else {
            f.write_str(&format_fixed(self.0, QUANTITY_SCALE))
        }
    }
}

impl FromStr for Quantity {
    type Err = ParseFixedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_fixed(s, QUANTITY_SCALE).map(Quantity)
    }
}

impl Add for Quantity {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Quantity(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Quantity {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Quantity {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Quantity(self.0.saturating_sub(other.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_whole_and_display() {
        assert_eq!(Quantity::from_whole(3).hundredths(), 300);
        assert_eq!(Quantity::from_whole(3).to_string(), "3");
        assert_eq!(Quantity::from_hundredths(250).to_string(), "2.50");
        assert_eq!(Quantity::from_hundredths(5).to_string(), "0.05");
    }

    #[test]
    fn test_parse_coerces_to_two_places() {
        let q: Quantity = "0.333".parse().unwrap();
        assert_eq!(q.hundredths(), 33);
        let q: Quantity = "0.125".parse().unwrap();
        assert_eq!(q.hundredths(), 13);
        assert!("half".parse::<Quantity>().is_err());
    }

    #[test]
    fn test_whole_checks() {
        assert!(Quantity::from_whole(2).is_whole());
        assert!(!Quantity::from_hundredths(250).is_whole());
        assert_eq!(Quantity::from_hundredths(250).floor_whole(), Quantity::from_whole(2));
        assert_eq!(Quantity::from_hundredths(250).whole_units(), 2);
    }

    #[test]
    fn test_times() {
        // 1 unit × 9 doses per unit = 9 doses
        assert_eq!(Quantity::ONE.times(Quantity::from_whole(9)), Quantity::from_whole(9));
        // 2.5 × 0.5 = 1.25
        assert_eq!(
            Quantity::from_hundredths(250).times(Quantity::from_hundredths(50)),
            Quantity::from_hundredths(125)
        );
    }

    #[test]
    fn test_arithmetic_saturates() {
        let huge = Quantity::from_hundredths(i64::MAX - 1);
        assert_eq!(huge.times(Quantity::from_whole(3)).hundredths(), i64::MAX);
        assert_eq!((huge + huge).hundredths(), i64::MAX);
        assert_eq!((Quantity::ZERO - huge - huge).hundredths(), i64::MIN);
    }
}
