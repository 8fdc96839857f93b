//! # Fixed-Point Helpers
//!
//! Shared integer arithmetic behind [`Money`](crate::money::Money),
//! [`Quantity`](crate::quantity::Quantity) and
//! [`ExchangeRate`](crate::money::ExchangeRate).
//!
//! ## Rounding Rule
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  HALF AWAY FROM ZERO, applied once per derived value                   │
//! │                                                                         │
//! │   2.345 → 2.35        -2.345 → -2.35        2.344 → 2.34               │
//! │                                                                         │
//! │  Every intermediate product is carried in i128 and rounded at the end, │
//! │  so repeated price × quantity never accumulates float error.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Failure to read a decimal literal into fixed point.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseFixedError {
    #[error("empty number")]
    Empty,

    #[error("'{0}' is not a plain decimal number")]
    Invalid(String),

    #[error("'{0}' is too large")]
    Overflow(String),
}

/// Divides `num` by `den` rounding half away from zero.
///
/// `den` must be positive.
pub fn div_round(num: i128, den: i128) -> i128 {
    debug_assert!(den > 0, "denominator must be positive");
    let half = den / 2;
    if num >= 0 {
        (num + half) / den
    } else {
        (num - half) / den
    }
}

/// Returns `10^scale` as i128.
#[inline]
pub const fn pow10(scale: u32) -> i128 {
    10_i128.pow(scale)
}

/// Parses a decimal literal into an integer count of `10^-scale` units.
///
/// Accepts an optional sign, digits, and an optional fractional part
/// (`"12"`, `"-0.5"`, `"3.14159"`, `".25"`). Digits beyond `scale` are
/// rounded half away from zero. Exponents, thousands separators and
/// surrounding garbage are rejected.
///
/// ## Example
/// ```rust
/// use vetpos_core::numeric::parse_fixed;
///
/// assert_eq!(parse_fixed("10.5", 2).unwrap(), 1050);
/// assert_eq!(parse_fixed("0.125", 2).unwrap(), 13);
/// assert_eq!(parse_fixed("-1.005", 2).unwrap(), -101);
/// ```
pub fn parse_fixed(text: &str, scale: u32) -> Result<i64, ParseFixedError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ParseFixedError::Empty);
    }

    let invalid = || ParseFixedError::Invalid(trimmed.to_string());

    let (negative, body) = match trimmed.as_bytes()[0] {
        b'-' => (true, &trimmed[1..]),
        b'+' => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let (int_part, frac_part) = match body.split_once('.') {
        Some((i, f)) => (i, f),
        None => (body, ""),
    };

    if int_part.is_empty() && frac_part.is_empty() {
        return Err(invalid());
    }
    if !int_part.bytes().all(|b| b.is_ascii_digit())
        || !frac_part.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(invalid());
    }

    let overflow = || ParseFixedError::Overflow(trimmed.to_string());

    let mut units: i128 = 0;
    for b in int_part.bytes() {
        units = units
            .checked_mul(10)
            .and_then(|u| u.checked_add((b - b'0') as i128))
            .ok_or_else(overflow)?;
        if units > i64::MAX as i128 {
            return Err(overflow());
        }
    }
    units *= pow10(scale);

    let frac = frac_part.as_bytes();
    let mut frac_units: i128 = 0;
    for i in 0..scale as usize {
        let digit = frac.get(i).map(|b| (b - b'0') as i128).unwrap_or(0);
        frac_units = frac_units * 10 + digit;
    }
    // First dropped digit decides the rounding.
    if frac.get(scale as usize).is_some_and(|b| *b >= b'5') {
        frac_units += 1;
    }

    let magnitude = units + frac_units;
    if magnitude > i64::MAX as i128 {
        return Err(overflow());
    }

    Ok(if negative {
        -(magnitude as i64)
    } else {
        magnitude as i64
    })
}

/// Writes a fixed-point integer as a decimal string with exactly `scale`
/// fractional digits.
pub fn format_fixed(value: i64, scale: u32) -> String {
    let divisor = pow10(scale) as i64;
    let sign = if value < 0 { "-" } else { "" };
    let abs = (value as i128).abs();
    let whole = abs / divisor as i128;
    let frac = abs % divisor as i128;
    if scale == 0 {
        format!("{}{}", sign, whole)
    } else {
        format!("{}{}.{:0width$}", sign, whole, frac, width = scale as usize)
    }
}
