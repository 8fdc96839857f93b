//! # Cart Aggregator
//!
//! The sale being built at the counter: lines keyed by
//! `(product, sale mode)`, plus an order-level discount.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  Operator Action          Operation               Line Change           │
//! │  ───────────────          ─────────               ───────────           │
//! │                                                                         │
//! │  Click product ─────────► add_line() ──────────► insert q=1 / q += 1   │
//! │                                                                         │
//! │  Type quantity ─────────► update_quantity() ───► q = n (≤ ceiling)     │
//! │                                                                         │
//! │  Unit/dose switch ──────► toggle_mode() ───────► re-price, re-ceiling  │
//! │                                                                         │
//! │  Click remove ──────────► remove_line() ───────► gone (idempotent)     │
//! │                                                                         │
//! │  Discount fields ───────► set_line_discount()                          │
//! │                           set_order_discount()                          │
//! │                                                                         │
//! │  Catalog refetch ───────► refresh_ceilings() ──► clamp / drop lines    │
//! │                                                                         │
//! │  Every mutation recomputes the touched line; totals() always sums      │
//! │  from the lines, so nothing cached can drift.                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - Every line satisfies `0 < quantity ≤ available_stock`
//! - Whole-unit lines hold whole quantities
//! - A failed operation leaves the cart exactly as it was
//! - Line totals may go negative; only the order total is clamped

use serde::Serialize;
use std::collections::HashMap;
use ts_rs::TS;

use crate::catalog::Catalog;
use crate::error::{CartError, CartResult};
use crate::money::Money;
use crate::pricing::unit_price;
use crate::quantity::Quantity;
use crate::stock::available_stock;
use crate::types::{CatalogEntry, Inventory, LineKey, Product, SaleMode};
use crate::validation::{coerce_quantity, validate_cart_size, validate_discount};
use crate::MAX_CART_LINES;

// =============================================================================
// Cart Line
// =============================================================================

/// One product, in one sale mode, in the cart.
///
/// ## Price Freezing
/// Prices are copied from the catalog when the line is created (or its
/// mode is toggled). A later catalog refresh updates the stock ceiling
/// but not the price.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    product_id: String,
    product_name: String,
    mode: SaleMode,
    /// "tablet" or "dose", whichever matches `mode`.
    unit_label: String,
    quantity: Quantity,
    /// Whole-unit price frozen at add-time.
    unit_price: Money,
    /// Per-dose price frozen at add-time, if the catalog had one.
    price_per_dose: Option<Money>,
    /// The price actually applied for `mode`.
    applied_price: Money,
    /// Dose line priced with the whole-unit price for lack of a dose price.
    price_fallback: bool,
    available_stock: Quantity,
    discount: Money,
    subtotal: Money,
    total: Money,

    #[serde(skip)]
    #[ts(skip)]
    snapshot: LineSnapshot,
}

/// Catalog data a line needs to re-derive itself in the other mode.
#[derive(Debug, Clone)]
struct LineSnapshot {
    product: Product,
    inventory: Option<Inventory>,
}

impl CartLine {
    fn new(
        product: &Product,
        inventory: Option<&Inventory>,
        mode: SaleMode,
        quantity: Quantity,
        available: Quantity,
        discount: Money,
    ) -> Self {
        let resolved = unit_price(product, mode);
        let mut line = CartLine {
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            mode,
            unit_label: product.unit_label(mode).to_string(),
            quantity,
            unit_price: product.sale_price,
            price_per_dose: product.sale_price_per_dose,
            applied_price: resolved.price(),
            price_fallback: resolved.is_fallback(),
            available_stock: available,
            discount,
            subtotal: Money::zero(),
            total: Money::zero(),
            snapshot: LineSnapshot {
                product: product.clone(),
                inventory: inventory.copied(),
            },
        };
        line.recompute();
        line
    }

    fn recompute(&mut self) {
        self.subtotal = self.applied_price.times(self.quantity);
        self.total = self.subtotal - self.discount;
    }

    pub fn key(&self) -> LineKey {
        LineKey::new(self.product_id.clone(), self.mode)
    }

    pub fn product_id(&self) -> &str {
        &self.product_id
    }

    pub fn product_name(&self) -> &str {
        &self.product_name
    }

    pub fn mode(&self) -> SaleMode {
        self.mode
    }

    pub fn is_full_unit(&self) -> bool {
        self.mode.is_full_unit()
    }

    pub fn unit_label(&self) -> &str {
        &self.unit_label
    }

    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    pub fn price_per_dose(&self) -> Option<Money> {
        self.price_per_dose
    }

    pub fn applied_price(&self) -> Money {
        self.applied_price
    }

    pub fn price_fallback(&self) -> bool {
        self.price_fallback
    }

    pub fn available_stock(&self) -> Quantity {
        self.available_stock
    }

    pub fn discount(&self) -> Money {
        self.discount
    }

    /// `applied_price × quantity`.
    pub fn subtotal(&self) -> Money {
        self.subtotal
    }

    /// `subtotal − discount`; may be negative.
    pub fn total(&self) -> Money {
        self.total
    }

    pub fn is_divisible(&self) -> bool {
        self.snapshot.product.divisible
    }
}

// =============================================================================
// Totals
// =============================================================================

/// Derived order totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    pub line_count: usize,
    /// Σ line subtotal.
    pub subtotal: Money,
    /// Σ line discount.
    pub item_discounts: Money,
    pub order_discount: Money,
    /// `max(0, subtotal − item_discounts − order_discount)`.
    pub total: Money,
}

// =============================================================================
// Toggle Outcome
// =============================================================================

/// Result of [`Cart::toggle_mode`]. Toggling never fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ToggleOutcome {
    /// The line now sells in the other mode.
    Switched { quantity: Quantity, clamped: bool },
    /// The other mode already had a line; quantities were combined there.
    Merged { quantity: Quantity, clamped: bool },
    /// Nothing changed.
    Unchanged { reason: UnchangedReason },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum UnchangedReason {
    NotDivisible,
    NoStockInTargetMode,
    LineNotFound,
}

// =============================================================================
// Ceiling Adjustment
// =============================================================================

/// A line changed because a fresh snapshot lowered its ceiling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CeilingAdjustment {
    pub key: LineKey,
    pub product_name: String,
    pub previous_quantity: Quantity,
    /// `None` when the line was dropped because nothing is left.
    pub new_quantity: Option<Quantity>,
    pub available_stock: Quantity,
}

// =============================================================================
// Cart
// =============================================================================

/// The in-memory cart.
///
/// ## Storage
/// Lines live in a map keyed by [`LineKey`] for constant-time lookup; a
/// separate key list keeps insertion order for display.
#[derive(Debug, Clone, Default)]
pub struct Cart {
    lines: HashMap<LineKey, CartLine>,
    order: Vec<LineKey>,
    order_discount: Money,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Self::default()
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// Lines in insertion order.
    pub fn lines(&self) -> impl Iterator<Item = &CartLine> {
        self.order.iter().filter_map(|key| self.lines.get(key))
    }

    pub fn line(&self, key: &LineKey) -> Option<&CartLine> {
        self.lines.get(key)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn order_discount(&self) -> Money {
        self.order_discount
    }

    /// Recomputes the order totals from the current lines.
    pub fn totals(&self) -> CartTotals {
        let subtotal: Money = self.lines().map(CartLine::subtotal).sum();
        let item_discounts: Money = self.lines().map(CartLine::discount).sum();
        let total = subtotal
            .saturating_sub(item_discounts)
            .saturating_sub(self.order_discount)
            .clamp_non_negative();

        CartTotals {
            line_count: self.lines.len(),
            subtotal,
            item_discounts,
            order_discount: self.order_discount,
            total,
        }
    }

    // -------------------------------------------------------------------------
    // Mutations
    // -------------------------------------------------------------------------

    /// Adds one unit (or dose) of a product.
    ///
    /// ## Behavior
    /// - Nothing available in `mode`: `OutOfStock`, cart unchanged
    /// - Line already present: quantity + 1, bounded by the ceiling;
    ///   `StockExceeded` if it is already there
    /// - Otherwise: a new line with quantity 1 at the resolved price
    ///   (or the whole remaining stock if less than one dose is left)
    ///
    /// The ceiling is recomputed from the snapshot passed in, so adding
    /// again after a catalog refresh uses the newer figure.
    pub fn add_line(
        &mut self,
        product: &Product,
        inventory: Option<&Inventory>,
        mode: SaleMode,
    ) -> CartResult<&CartLine> {
        if !product.supports(mode) {
            return Err(CartError::NotDivisible {
                product: product.name.clone(),
            });
        }

        let available = available_stock(product, inventory, mode);
        if !available.is_positive() {
            return Err(CartError::OutOfStock {
                product: product.name.clone(),
                mode,
            });
        }

        let key = LineKey::new(product.id.clone(), mode);

        if let Some(line) = self.lines.get_mut(&key) {
            if line.quantity >= available {
                return Err(CartError::StockExceeded {
                    product: line.product_name.clone(),
                    mode,
                    available,
                    requested: line.quantity + Quantity::ONE,
                });
            }
            line.quantity = (line.quantity + Quantity::ONE).min(available);
            line.available_stock = available;
            line.snapshot.inventory = inventory.copied();
            line.recompute();
        } else {
            validate_cart_size(self.lines.len())
                .map_err(|_| CartError::CartTooLarge { max: MAX_CART_LINES })?;

            let quantity = Quantity::ONE.min(available);
            let line = CartLine::new(product, inventory, mode, quantity, available, Money::zero());
            self.order.push(key.clone());
            self.lines.insert(key.clone(), line);
        }

        self.line(&key).ok_or(CartError::LineNotFound {
            product_id: product.id.clone(),
            mode,
        })
    }

    /// [`Cart::add_line`] for a catalog entry.
    pub fn add_entry(&mut self, entry: &CatalogEntry, mode: SaleMode) -> CartResult<&CartLine> {
        self.add_line(&entry.product, entry.inventory.as_ref(), mode)
    }

    /// Sets a line's quantity.
    ///
    /// ## Behavior
    /// - `new_quantity ≤ 0`: removes the line, returns `Ok(None)`
    /// - Precision rule for the mode is applied before the ceiling check
    /// - Above the recorded ceiling: `StockExceeded`, quantity unchanged
    pub fn update_quantity(
        &mut self,
        key: &LineKey,
        new_quantity: Quantity,
    ) -> CartResult<Option<&CartLine>> {
        if !new_quantity.is_positive() {
            self.remove_line(key);
            return Ok(None);
        }

        let line = self.lines.get_mut(key).ok_or_else(|| CartError::LineNotFound {
            product_id: key.product_id.clone(),
            mode: key.mode,
        })?;

        let quantity = coerce_quantity(new_quantity, key.mode)?;

        if quantity > line.available_stock {
            return Err(CartError::StockExceeded {
                product: line.product_name.clone(),
                mode: key.mode,
                available: line.available_stock,
                requested: quantity,
            });
        }

        line.quantity = quantity;
        line.recompute();
        Ok(Some(&*line))
    }

    /// Switches a line between whole-unit and dose sale.
    ///
    /// ## Behavior
    /// - Indivisible product, unknown line, or nothing in stock for the
    ///   other mode: no change
    /// - Price and ceiling are re-resolved for the other mode
    /// - Dose → unit drops any fraction (minimum 1)
    /// - Quantity above the new ceiling is clamped down to it
    /// - If the other mode already has a line, the quantity is merged
    ///   into it and this line disappears
    pub fn toggle_mode(&mut self, key: &LineKey) -> ToggleOutcome {
        let Some(line) = self.lines.get(key) else {
            return ToggleOutcome::Unchanged {
                reason: UnchangedReason::LineNotFound,
            };
        };

        let product = line.snapshot.product.clone();
        let inventory = line.snapshot.inventory;

        if !product.divisible {
            return ToggleOutcome::Unchanged {
                reason: UnchangedReason::NotDivisible,
            };
        }

        let target = key.mode.opposite();
        let ceiling = available_stock(&product, inventory.as_ref(), target);
        if !ceiling.is_positive() {
            return ToggleOutcome::Unchanged {
                reason: UnchangedReason::NoStockInTargetMode,
            };
        }

        let original = line.quantity;
        let discount = line.discount;
        let mut quantity = original;
        if target.is_full_unit() {
            quantity = quantity.floor_whole().max(Quantity::ONE);
        }
        quantity = quantity.min(ceiling);

        let target_key = key.flipped();

        if let Some(existing) = self.lines.get_mut(&target_key) {
            let limit = existing.available_stock.min(ceiling);
            let wanted = existing.quantity + quantity;
            let merged = wanted.min(limit).max(existing.quantity);
            existing.quantity = merged;
            existing.discount += discount;
            existing.recompute();

            self.remove_line(key);
            return ToggleOutcome::Merged {
                quantity: merged,
                clamped: merged != wanted,
            };
        }

        let line = CartLine::new(&product, inventory.as_ref(), target, quantity, ceiling, discount);
        self.lines.remove(key);
        self.lines.insert(target_key.clone(), line);
        if let Some(slot) = self.order.iter_mut().find(|k| *k == key) {
            *slot = target_key;
        }

        ToggleOutcome::Switched {
            quantity,
            clamped: quantity != original,
        }
    }

    /// Removes a line. Removing a missing line is a no-op.
    pub fn remove_line(&mut self, key: &LineKey) -> Option<CartLine> {
        let removed = self.lines.remove(key);
        if removed.is_some() {
            self.order.retain(|k| k != key);
        }
        removed
    }

    /// Sets a line-level discount. Zero clears it.
    pub fn set_line_discount(&mut self, key: &LineKey, amount: Money) -> CartResult<&CartLine> {
        validate_discount("line discount", amount)?;

        let line = self.lines.get_mut(key).ok_or_else(|| CartError::LineNotFound {
            product_id: key.product_id.clone(),
            mode: key.mode,
        })?;

        line.discount = amount;
        line.recompute();
        Ok(&*line)
    }

    /// Sets the order-level discount. Negative values are rejected.
    pub fn set_order_discount(&mut self, amount: Money) -> CartResult<()> {
        validate_discount("order discount", amount)?;
        self.order_discount = amount;
        Ok(())
    }

    /// Re-evaluates every line's ceiling against a fresh catalog snapshot.
    ///
    /// Lines above their new ceiling are clamped; lines with nothing left
    /// (or whose product vanished or stopped being divisible) are dropped.
    /// Prices stay as they were when the line was added.
    pub fn refresh_ceilings(&mut self, catalog: &Catalog) -> Vec<CeilingAdjustment> {
        let mut adjustments = Vec::new();
        let mut dropped = Vec::new();

        for key in &self.order {
            let Some(line) = self.lines.get_mut(key) else {
                continue;
            };

            let ceiling = match catalog.get(&key.product_id) {
                Some(entry) if entry.product.supports(key.mode) => {
                    line.snapshot.product = entry.product.clone();
                    line.snapshot.inventory = entry.inventory;
                    available_stock(&entry.product, entry.inventory.as_ref(), key.mode)
                }
                _ => Quantity::ZERO,
            };
            line.available_stock = ceiling;

            if line.quantity <= ceiling {
                continue;
            }

            let previous = line.quantity;
            let clamped = if key.mode.is_full_unit() {
                ceiling.floor_whole()
            } else {
                ceiling
            };

            if clamped.is_positive() {
                line.quantity = clamped;
                line.recompute();
                adjustments.push(CeilingAdjustment {
                    key: key.clone(),
                    product_name: line.product_name.clone(),
                    previous_quantity: previous,
                    new_quantity: Some(clamped),
                    available_stock: ceiling,
                });
            } else {
                dropped.push(key.clone());
                adjustments.push(CeilingAdjustment {
                    key: key.clone(),
                    product_name: line.product_name.clone(),
                    previous_quantity: previous,
                    new_quantity: None,
                    available_stock: ceiling,
                });
            }
        }

        for key in &dropped {
            self.remove_line(key);
        }

        adjustments
    }

    /// Empties the cart and resets the order discount.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.order.clear();
        self.order_discount = Money::zero();
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::stock::tests::divisible_product;

    fn scenario_stock() -> Inventory {
        Inventory::new(1, Quantity::from_whole(3))
    }

    fn indivisible_product() -> Product {
        Product {
            id: "rabies".to_string(),
            name: "Rabies Vaccine".to_string(),
            category: Some("Vaccines".to_string()),
            unit: "vial".to_string(),
            dose_unit: "dose".to_string(),
            doses_per_unit: Quantity::ONE,
            divisible: false,
            sale_price: Money::from_cents(2500),
            sale_price_per_dose: None,
        }
    }

    fn dose_key() -> LineKey {
        LineKey::new("melox", SaleMode::Dose)
    }

    fn unit_key() -> LineKey {
        LineKey::new("melox", SaleMode::FullUnit)
    }

    #[test]
    fn test_add_line_creates_line_at_resolved_price() {
        let mut cart = Cart::new();
        let product = divisible_product();
        let line = cart.add_line(&product, Some(&scenario_stock()), SaleMode::Dose).unwrap();

        assert_eq!(line.quantity(), Quantity::ONE);
        assert_eq!(line.applied_price(), Money::from_cents(200));
        assert_eq!(line.available_stock(), Quantity::from_whole(12));
        assert_eq!(line.unit_label(), "dose");
        assert_eq!(line.subtotal(), Money::from_cents(200));
    }

    #[test]
    fn test_add_same_key_increments() {
        let mut cart = Cart::new();
        let product = divisible_product();
        cart.add_line(&product, Some(&scenario_stock()), SaleMode::Dose).unwrap();
        cart.add_line(&product, Some(&scenario_stock()), SaleMode::Dose).unwrap();

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.line(&dose_key()).unwrap().quantity(), Quantity::from_whole(2));
    }

    #[test]
    fn test_same_product_in_both_modes_is_two_lines() {
        let mut cart = Cart::new();
        let product = divisible_product();
        cart.add_line(&product, Some(&scenario_stock()), SaleMode::Dose).unwrap();
        cart.add_line(&product, Some(&scenario_stock()), SaleMode::FullUnit).unwrap();

        assert_eq!(cart.len(), 2);
        let keys: Vec<LineKey> = cart.lines().map(CartLine::key).collect();
        assert_eq!(keys, vec![dose_key(), unit_key()]);
    }

    #[test]
    fn test_add_out_of_stock_leaves_cart_unchanged() {
        let mut cart = Cart::new();
        let product = divisible_product();

        let err = cart.add_line(&product, None, SaleMode::FullUnit).unwrap_err();
        assert!(matches!(err, CartError::OutOfStock { .. }));

        let empty = Inventory::new(0, Quantity::ZERO);
        let err = cart.add_line(&product, Some(&empty), SaleMode::Dose).unwrap_err();
        assert!(matches!(err, CartError::OutOfStock { mode: SaleMode::Dose, .. }));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_add_at_ceiling_fails_and_keeps_line() {
        let mut cart = Cart::new();
        let product = divisible_product();
        let stock = scenario_stock();

        cart.add_line(&product, Some(&stock), SaleMode::FullUnit).unwrap();
        let err = cart.add_line(&product, Some(&stock), SaleMode::FullUnit).unwrap_err();

        assert!(matches!(err, CartError::StockExceeded { .. }));
        assert_eq!(cart.line(&unit_key()).unwrap().quantity(), Quantity::ONE);
    }

    #[test]
    fn test_add_dose_mode_on_indivisible_product() {
        let mut cart = Cart::new();
        let product = indivisible_product();
        let stock = Inventory::new(5, Quantity::ZERO);
        let err = cart.add_line(&product, Some(&stock), SaleMode::Dose).unwrap_err();
        assert_eq!(
            err,
            CartError::NotDivisible {
                product: "Rabies Vaccine".to_string()
            }
        );
    }

    #[test]
    fn test_add_with_less_than_one_dose_left() {
        let mut cart = Cart::new();
        let product = divisible_product();
        let stock = Inventory::new(0, Quantity::from_hundredths(50));
        let line = cart.add_line(&product, Some(&stock), SaleMode::Dose).unwrap();
        assert_eq!(line.quantity(), Quantity::from_hundredths(50));
        assert_eq!(line.subtotal(), Money::from_cents(100));
    }

    #[test]
    fn test_add_reports_price_fallback() {
        let mut cart = Cart::new();
        let mut product = divisible_product();
        product.sale_price_per_dose = None;
        let line = cart.add_line(&product, Some(&scenario_stock()), SaleMode::Dose).unwrap();
        assert!(line.price_fallback());
        assert_eq!(line.applied_price(), Money::from_cents(1000));
    }

    /// Scenario A: 5 doses at 2.00 = 10.00.
    #[test]
    fn test_scenario_a_dose_subtotal() {
        let mut cart = Cart::new();
        let product = divisible_product();
        cart.add_line(&product, Some(&scenario_stock()), SaleMode::Dose).unwrap();
        let line = cart
            .update_quantity(&dose_key(), Quantity::from_whole(5))
            .unwrap()
            .unwrap();

        assert_eq!(line.available_stock(), Quantity::from_whole(12));
        assert_eq!(line.subtotal(), Money::from_cents(1000));
    }

    /// Scenario B: 13 doses against a ceiling of 12 fails; quantity stays 5.
    #[test]
    fn test_scenario_b_update_past_ceiling() {
        let mut cart = Cart::new();
        let product = divisible_product();
        cart.add_line(&product, Some(&scenario_stock()), SaleMode::Dose).unwrap();
        cart.update_quantity(&dose_key(), Quantity::from_whole(5)).unwrap();

        let err = cart
            .update_quantity(&dose_key(), Quantity::from_whole(13))
            .unwrap_err();
        assert_eq!(
            err,
            CartError::StockExceeded {
                product: "Meloxicam 1.5mg".to_string(),
                mode: SaleMode::Dose,
                available: Quantity::from_whole(12),
                requested: Quantity::from_whole(13),
            }
        );
        assert_eq!(cart.line(&dose_key()).unwrap().quantity(), Quantity::from_whole(5));
    }

    #[test]
    fn test_update_to_zero_removes() {
        let mut cart = Cart::new();
        let product = divisible_product();
        cart.add_line(&product, Some(&scenario_stock()), SaleMode::Dose).unwrap();

        assert!(cart.update_quantity(&dose_key(), Quantity::ZERO).unwrap().is_none());
        assert!(cart.is_empty());
        // Removing again through update is still fine
        assert!(cart
            .update_quantity(&dose_key(), Quantity::from_whole(-1))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_update_fractional_whole_units_rejected() {
        let mut cart = Cart::new();
        let product = divisible_product();
        let stock = Inventory::new(5, Quantity::ZERO);
        cart.add_line(&product, Some(&stock), SaleMode::FullUnit).unwrap();

        let err = cart
            .update_quantity(&unit_key(), Quantity::from_hundredths(150))
            .unwrap_err();
        assert!(matches!(err, CartError::Validation(_)));
        assert_eq!(cart.line(&unit_key()).unwrap().quantity(), Quantity::ONE);
    }

    #[test]
    fn test_update_fractional_doses_accepted() {
        let mut cart = Cart::new();
        let product = divisible_product();
        cart.add_line(&product, Some(&scenario_stock()), SaleMode::Dose).unwrap();

        let line = cart
            .update_quantity(&dose_key(), Quantity::from_hundredths(250))
            .unwrap()
            .unwrap();
        assert_eq!(line.subtotal(), Money::from_cents(500));
    }

    #[test]
    fn test_update_missing_line() {
        let mut cart = Cart::new();
        let err = cart
            .update_quantity(&dose_key(), Quantity::from_whole(2))
            .unwrap_err();
        assert!(matches!(err, CartError::LineNotFound { .. }));
    }

    #[test]
    fn test_toggle_indivisible_is_noop() {
        let mut cart = Cart::new();
        let product = indivisible_product();
        let stock = Inventory::new(5, Quantity::ZERO);
        cart.add_line(&product, Some(&stock), SaleMode::FullUnit).unwrap();

        let key = LineKey::new("rabies", SaleMode::FullUnit);
        assert_eq!(
            cart.toggle_mode(&key),
            ToggleOutcome::Unchanged {
                reason: UnchangedReason::NotDivisible
            }
        );
        assert_eq!(cart.line(&key).unwrap().mode(), SaleMode::FullUnit);
    }

    #[test]
    fn test_toggle_unit_to_dose_keeps_quantity() {
        let mut cart = Cart::new();
        let product = divisible_product();
        cart.add_line(&product, Some(&scenario_stock()), SaleMode::FullUnit).unwrap();

        let outcome = cart.toggle_mode(&unit_key());
        assert_eq!(
            outcome,
            ToggleOutcome::Switched {
                quantity: Quantity::ONE,
                clamped: false
            }
        );

        let line = cart.line(&dose_key()).unwrap();
        assert_eq!(line.applied_price(), Money::from_cents(200));
        assert_eq!(line.available_stock(), Quantity::from_whole(12));
        assert_eq!(line.subtotal(), Money::from_cents(200));
        assert!(cart.line(&unit_key()).is_none());
    }

    #[test]
    fn test_toggle_dose_to_unit_clamps_to_ceiling() {
        let mut cart = Cart::new();
        let product = divisible_product();
        cart.add_line(&product, Some(&scenario_stock()), SaleMode::Dose).unwrap();
        cart.update_quantity(&dose_key(), Quantity::from_whole(5)).unwrap();

        let outcome = cart.toggle_mode(&dose_key());
        assert_eq!(
            outcome,
            ToggleOutcome::Switched {
                quantity: Quantity::ONE,
                clamped: true
            }
        );
        let line = cart.line(&unit_key()).unwrap();
        assert_eq!(line.quantity(), Quantity::ONE);
        assert_eq!(line.subtotal(), Money::from_cents(1000));
    }

    #[test]
    fn test_toggle_fractional_dose_to_unit_floors_to_one() {
        let mut cart = Cart::new();
        let product = divisible_product();
        let stock = Inventory::new(3, Quantity::ZERO);
        cart.add_line(&product, Some(&stock), SaleMode::Dose).unwrap();
        cart.update_quantity(&dose_key(), Quantity::from_hundredths(50)).unwrap();

        cart.toggle_mode(&dose_key());
        assert_eq!(cart.line(&unit_key()).unwrap().quantity(), Quantity::ONE);
    }

    #[test]
    fn test_toggle_without_whole_units_left_is_noop() {
        let mut cart = Cart::new();
        let product = divisible_product();
        let stock = Inventory::new(0, Quantity::from_whole(4));
        cart.add_line(&product, Some(&stock), SaleMode::Dose).unwrap();

        assert_eq!(
            cart.toggle_mode(&dose_key()),
            ToggleOutcome::Unchanged {
                reason: UnchangedReason::NoStockInTargetMode
            }
        );
        assert!(cart.line(&dose_key()).is_some());
    }

    #[test]
    fn test_toggle_into_existing_line_merges() {
        let mut cart = Cart::new();
        let product = divisible_product();
        let stock = Inventory::new(2, Quantity::ZERO);
        cart.add_line(&product, Some(&stock), SaleMode::FullUnit).unwrap();
        cart.add_line(&product, Some(&stock), SaleMode::Dose).unwrap();
        cart.update_quantity(&dose_key(), Quantity::from_whole(3)).unwrap();

        let outcome = cart.toggle_mode(&unit_key());
        assert_eq!(
            outcome,
            ToggleOutcome::Merged {
                quantity: Quantity::from_whole(4),
                clamped: false
            }
        );
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.line(&dose_key()).unwrap().quantity(), Quantity::from_whole(4));
    }

    #[test]
    fn test_toggle_keeps_display_position() {
        let mut cart = Cart::new();
        let melox = divisible_product();
        let vaccine = indivisible_product();
        let stock = Inventory::new(2, Quantity::ZERO);
        cart.add_line(&melox, Some(&stock), SaleMode::FullUnit).unwrap();
        cart.add_line(&vaccine, Some(&stock), SaleMode::FullUnit).unwrap();

        cart.toggle_mode(&unit_key());
        let ids: Vec<LineKey> = cart.lines().map(CartLine::key).collect();
        assert_eq!(ids[0], dose_key());
        assert_eq!(ids[1].product_id, "rabies");
    }

    #[test]
    fn test_remove_line_twice_is_safe() {
        let mut cart = Cart::new();
        let product = divisible_product();
        cart.add_line(&product, Some(&scenario_stock()), SaleMode::Dose).unwrap();

        assert!(cart.remove_line(&dose_key()).is_some());
        assert!(cart.remove_line(&dose_key()).is_none());
        assert!(cart.is_empty());
    }

    #[test]
    fn test_line_discount_can_exceed_subtotal() {
        let mut cart = Cart::new();
        let product = divisible_product();
        cart.add_line(&product, Some(&scenario_stock()), SaleMode::Dose).unwrap();

        let line = cart.set_line_discount(&dose_key(), Money::from_cents(500)).unwrap();
        assert_eq!(line.total(), Money::from_cents(-300));
        assert_eq!(cart.totals().total, Money::zero());

        assert!(cart.set_line_discount(&dose_key(), Money::from_cents(-1)).is_err());
    }

    #[test]
    fn test_order_discount_rejects_negative() {
        let mut cart = Cart::new();
        assert!(cart.set_order_discount(Money::from_cents(-100)).is_err());
        assert_eq!(cart.order_discount(), Money::zero());
        cart.set_order_discount(Money::from_cents(100)).unwrap();
        assert_eq!(cart.order_discount(), Money::from_cents(100));
    }

    /// Scenario C arithmetic: 10.00 − 0 − 15.00 clamps to 0.
    #[test]
    fn test_totals_clamp_at_zero() {
        let mut cart = Cart::new();
        let product = divisible_product();
        cart.add_line(&product, Some(&scenario_stock()), SaleMode::Dose).unwrap();
        cart.update_quantity(&dose_key(), Quantity::from_whole(5)).unwrap();
        cart.set_order_discount(Money::from_cents(1500)).unwrap();

        let totals = cart.totals();
        assert_eq!(totals.subtotal, Money::from_cents(1000));
        assert_eq!(totals.item_discounts, Money::zero());
        assert_eq!(totals.total, Money::zero());
    }

    #[test]
    fn test_oversized_discounts_rejected_and_total_stays_clamped() {
        let mut cart = Cart::new();
        let product = divisible_product();
        cart.add_line(&product, Some(&Inventory::new(4, Quantity::ZERO)), SaleMode::FullUnit)
            .unwrap();

        let near_max: Money = "92233720368547758".parse().unwrap();
        assert!(matches!(
            cart.set_line_discount(&unit_key(), near_max),
            Err(CartError::Validation(ValidationError::TooLarge { .. }))
        ));
        assert!(matches!(
            cart.set_order_discount(near_max),
            Err(CartError::Validation(ValidationError::TooLarge { .. }))
        ));
        assert_eq!(cart.totals().total, Money::from_cents(1000));

        // The largest accepted discounts on both levels still clamp to zero
        let max = Money::from_cents(crate::money::MAX_MONEY_CENTS);
        cart.set_line_discount(&unit_key(), max).unwrap();
        cart.set_order_discount(max).unwrap();
        let totals = cart.totals();
        assert_eq!(totals.item_discounts, max);
        assert_eq!(totals.total, Money::zero());
    }

    #[test]
    fn test_unvalidated_huge_price_saturates_subtotal() {
        let mut cart = Cart::new();
        let mut product = divisible_product();
        product.sale_price = "46116860184273879.13".parse().unwrap();
        cart.add_line(&product, Some(&Inventory::new(4, Quantity::ZERO)), SaleMode::FullUnit)
            .unwrap();

        let line = cart
            .update_quantity(&unit_key(), Quantity::from_whole(2))
            .unwrap()
            .unwrap();
        assert!(!line.subtotal().is_negative());
        assert_eq!(line.subtotal().cents(), i64::MAX);
        assert!(!cart.totals().total.is_negative());
    }

    #[test]
    fn test_totals_compose_discounts() {
        let mut cart = Cart::new();
        let product = divisible_product();
        let stock = Inventory::new(5, Quantity::ZERO);
        cart.add_line(&product, Some(&stock), SaleMode::FullUnit).unwrap();
        cart.update_quantity(&unit_key(), Quantity::from_whole(3)).unwrap();
        cart.add_line(&product, Some(&stock), SaleMode::Dose).unwrap();
        cart.set_line_discount(&unit_key(), Money::from_cents(250)).unwrap();
        cart.set_order_discount(Money::from_cents(100)).unwrap();

        let totals = cart.totals();
        assert_eq!(totals.line_count, 2);
        assert_eq!(totals.subtotal, Money::from_cents(3200));
        assert_eq!(totals.item_discounts, Money::from_cents(250));
        assert_eq!(totals.total, Money::from_cents(2850));
    }

    #[test]
    fn test_refresh_ceilings_clamps_and_drops() {
        let mut cart = Cart::new();
        let product = divisible_product();
        let vaccine = indivisible_product();
        let stock = Inventory::new(3, Quantity::ZERO);
        cart.add_line(&product, Some(&stock), SaleMode::Dose).unwrap();
        cart.update_quantity(&dose_key(), Quantity::from_whole(20)).unwrap();
        cart.add_line(&vaccine, Some(&stock), SaleMode::FullUnit).unwrap();

        // Backend now reports 1 unit + 2 loose doses of meloxicam, no vaccine.
        let catalog = Catalog::from_entries(vec![
            CatalogEntry::new(product, Some(Inventory::new(1, Quantity::from_whole(2)))),
            CatalogEntry::new(vaccine, Some(Inventory::new(0, Quantity::ZERO))),
        ]);

        let adjustments = cart.refresh_ceilings(&catalog);
        assert_eq!(adjustments.len(), 2);
        assert_eq!(adjustments[0].new_quantity, Some(Quantity::from_whole(11)));
        assert_eq!(adjustments[1].new_quantity, None);

        assert_eq!(cart.len(), 1);
        let line = cart.line(&dose_key()).unwrap();
        assert_eq!(line.quantity(), Quantity::from_whole(11));
        assert_eq!(line.available_stock(), Quantity::from_whole(11));
        assert_eq!(line.subtotal(), Money::from_cents(2200));
    }

    #[test]
    fn test_refresh_ceilings_keeps_frozen_price() {
        let mut cart = Cart::new();
        let product = divisible_product();
        cart.add_line(&product, Some(&scenario_stock()), SaleMode::Dose).unwrap();

        let mut repriced = product;
        repriced.sale_price_per_dose = Some(Money::from_cents(999));
        let catalog = Catalog::from_entries(vec![CatalogEntry::new(
            repriced,
            Some(Inventory::new(10, Quantity::ZERO)),
        )]);

        assert!(cart.refresh_ceilings(&catalog).is_empty());
        let line = cart.line(&dose_key()).unwrap();
        assert_eq!(line.applied_price(), Money::from_cents(200));
        assert_eq!(line.available_stock(), Quantity::from_whole(90));
    }

    #[test]
    fn test_cart_size_limit() {
        let mut cart = Cart::new();
        let stock = Inventory::new(1, Quantity::ZERO);
        for i in 0..MAX_CART_LINES {
            let mut p = indivisible_product();
            p.id = format!("p{}", i);
            cart.add_line(&p, Some(&stock), SaleMode::FullUnit).unwrap();
        }
        let mut extra = indivisible_product();
        extra.id = "extra".to_string();
        let err = cart.add_line(&extra, Some(&stock), SaleMode::FullUnit).unwrap_err();
        assert_eq!(err, CartError::CartTooLarge { max: MAX_CART_LINES });
    }

    #[test]
    fn test_clear() {
        let mut cart = Cart::new();
        let product = divisible_product();
        cart.add_line(&product, Some(&scenario_stock()), SaleMode::Dose).unwrap();
        cart.set_order_discount(Money::from_cents(50)).unwrap();

        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.totals().order_discount, Money::zero());
    }
}
