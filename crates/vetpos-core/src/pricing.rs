//! # Price Resolver
//!
//! The unit price a cart line freezes at add-time.
//!
//! A divisible product with no configured per-dose price falls back to
//! the whole-unit price. The fallback is tagged rather than silent so
//! the caller can warn the operator about the missing catalog data.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{Product, SaleMode};

/// Outcome of price resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", content = "price", rename_all = "snake_case")]
pub enum PriceResolution {
    /// The catalog carries a price for this mode.
    Resolved(Money),
    /// Dose mode, but `sale_price_per_dose` is unset; this is the
    /// whole-unit price used in its place.
    MissingDosePriceFallback(Money),
}

impl PriceResolution {
    #[inline]
    pub fn price(&self) -> Money {
        match self {
            PriceResolution::Resolved(p) | PriceResolution::MissingDosePriceFallback(p) => *p,
        }
    }

    #[inline]
    pub fn is_fallback(&self) -> bool {
        matches!(self, PriceResolution::MissingDosePriceFallback(_))
    }
}

/// Resolves the price of one unit of `mode` for `product`.
///
/// ## Example
/// ```rust
/// use vetpos_core::pricing::{unit_price, PriceResolution};
/// use vetpos_core::{Money, Product, Quantity, SaleMode};
///
/// let product = Product {
///     id: "amox".into(),
///     name: "Amoxicillin 250mg".into(),
///     category: None,
///     unit: "blister".into(),
///     dose_unit: "tablet".into(),
///     doses_per_unit: Quantity::from_whole(10),
///     divisible: true,
///     sale_price: Money::from_cents(1500),
///     sale_price_per_dose: None,
/// };
///
/// assert_eq!(unit_price(&product, SaleMode::FullUnit), PriceResolution::Resolved(Money::from_cents(1500)));
/// assert!(unit_price(&product, SaleMode::Dose).is_fallback());
/// ```
pub fn unit_price(product: &Product, mode: SaleMode) -> PriceResolution {
    match mode {
        SaleMode::FullUnit => PriceResolution::Resolved(product.sale_price),
        SaleMode::Dose => match product.sale_price_per_dose {
            Some(per_dose) => PriceResolution::Resolved(per_dose),
            None => PriceResolution::MissingDosePriceFallback(product.sale_price),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stock::tests::divisible_product;

    #[test]
    fn test_full_unit_uses_sale_price() {
        let product = divisible_product();
        assert_eq!(
            unit_price(&product, SaleMode::FullUnit),
            PriceResolution::Resolved(Money::from_cents(1000))
        );
    }

    #[test]
    fn test_dose_uses_per_dose_price() {
        let product = divisible_product();
        let resolved = unit_price(&product, SaleMode::Dose);
        assert_eq!(resolved.price(), Money::from_cents(200));
        assert!(!resolved.is_fallback());
    }

    #[test]
    fn test_dose_without_per_dose_price_is_tagged_fallback() {
        let mut product = divisible_product();
        product.sale_price_per_dose = None;
        let resolved = unit_price(&product, SaleMode::Dose);
        assert_eq!(
            resolved,
            PriceResolution::MissingDosePriceFallback(Money::from_cents(1000))
        );
        assert_eq!(resolved.price(), Money::from_cents(1000));
    }
}
