//! # Stock Resolver
//!
//! How much of a product can be put in the cart in a given sale mode.
//!
//! ```text
//! Inventory { stock_units: 1, stock_doses: 3 }, doses_per_unit: 9
//!
//!   FullUnit  ─►  1
//!   Dose      ─►  1 × 9 + 3 = 12
//!   (no inventory record) ─► 0
//! ```
//!
//! The result is a point-in-time ceiling. It must be recomputed whenever a
//! fresh snapshot arrives; the backend has the final word at commit.

use crate::quantity::Quantity;
use crate::types::{CatalogEntry, Inventory, Product, SaleMode};

/// Quantity sellable in `mode`, given a snapshot of the product's stock.
///
/// Dose mode on a non-divisible product yields zero; callers reject that
/// combination before asking.
pub fn available_stock(product: &Product, inventory: Option<&Inventory>, mode: SaleMode) -> Quantity {
    let Some(inventory) = inventory else {
        return Quantity::ZERO;
    };

    match mode {
        SaleMode::FullUnit => Quantity::from_whole(inventory.stock_units),
        SaleMode::Dose if product.divisible => inventory.total_doses(product.doses_per_unit),
        SaleMode::Dose => Quantity::ZERO,
    }
}

/// [`available_stock`] for a catalog entry.
#[inline]
pub fn entry_available_stock(entry: &CatalogEntry, mode: SaleMode) -> Quantity {
    available_stock(&entry.product, entry.inventory.as_ref(), mode)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::money::Money;

    pub(crate) fn divisible_product() -> Product {
        Product {
            id: "melox".to_string(),
            name: "Meloxicam 1.5mg".to_string(),
            category: Some("NSAID".to_string()),
            unit: "tablet".to_string(),
            dose_unit: "dose".to_string(),
            doses_per_unit: Quantity::from_whole(9),
            divisible: true,
            sale_price: Money::from_cents(1000),
            sale_price_per_dose: Some(Money::from_cents(200)),
        }
    }

    #[test]
    fn test_full_unit_is_stock_units() {
        let product = divisible_product();
        let inv = Inventory::new(1, Quantity::from_whole(3));
        assert_eq!(
            available_stock(&product, Some(&inv), SaleMode::FullUnit),
            Quantity::from_whole(1)
        );
    }

    #[test]
    fn test_dose_mode_counts_loose_doses() {
        let product = divisible_product();
        let inv = Inventory::new(1, Quantity::from_whole(3));
        assert_eq!(
            available_stock(&product, Some(&inv), SaleMode::Dose),
            Quantity::from_whole(12)
        );
    }

    #[test]
    fn test_missing_inventory_is_zero() {
        let product = divisible_product();
        assert_eq!(available_stock(&product, None, SaleMode::FullUnit), Quantity::ZERO);
        assert_eq!(available_stock(&product, None, SaleMode::Dose), Quantity::ZERO);
    }

    #[test]
    fn test_dose_mode_on_indivisible_product_is_zero() {
        let mut product = divisible_product();
        product.divisible = false;
        let inv = Inventory::new(4, Quantity::from_whole(2));
        assert_eq!(available_stock(&product, Some(&inv), SaleMode::Dose), Quantity::ZERO);
        assert_eq!(
            available_stock(&product, Some(&inv), SaleMode::FullUnit),
            Quantity::from_whole(4)
        );
    }

    #[test]
    fn test_fractional_doses_per_unit() {
        // A 2.5 ml vial, 3 sealed + 1.25 ml open
        let mut product = divisible_product();
        product.doses_per_unit = Quantity::from_hundredths(250);
        let inv = Inventory::new(3, Quantity::from_hundredths(125));
        assert_eq!(
            available_stock(&product, Some(&inv), SaleMode::Dose),
            Quantity::from_hundredths(875)
        );
    }
}
