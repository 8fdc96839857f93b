//! # Cart Commands
//!
//! Commands for building the sale.
//!
//! ## Cart Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Lifecycle                                       │
//! │                                                                         │
//! │  ┌──────────┐     ┌──────────┐     ┌──────────┐     ┌──────────┐       │
//! │  │  Empty   │────►│ In Cart  │────►│ Checkout │────►│ Recorded │       │
//! │  │  Cart    │     │          │     │ in flight│     │   Sale   │       │
//! │  └──────────┘     └──────────┘     └──────────┘     └──────────┘       │
//! │                        │                 │                │             │
//! │                   add_to_cart            │ failure        │             │
//! │                   update_quantity        └──► back to     │             │
//! │                   toggle_mode                 In Cart     │             │
//! │                   remove_from_cart                        │             │
//! │                   set_*_discount                          │             │
//! │                        │                                  │             │
//! │                        ▼                                  ▼             │
//! │                   clear_cart ────────────────────► (back to empty)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Lines are addressed by product id plus sale mode; the same product can
//! sit in the cart once by the unit and once by the dose.

use serde::Serialize;
use tracing::debug;

use vetpos_core::{
    CartLine, CartTotals, Client, LineKey, Money, Quantity, SaleMode, SaleSession, ToggleOutcome,
    UnchangedReason,
};

use crate::error::ApiError;
use crate::notification::Notification;
use crate::state::{CatalogState, SessionState};

/// Cart response including lines, totals, and the selected client.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub client: Option<Client>,
    pub lines: Vec<CartLine>,
    pub totals: CartTotals,
    pub notifications: Vec<Notification>,
}

impl From<&SaleSession> for CartResponse {
    fn from(session: &SaleSession) -> Self {
        CartResponse {
            client: session.client().cloned(),
            lines: session.cart().lines().cloned().collect(),
            totals: session.cart().totals(),
            notifications: Vec::new(),
        }
    }
}

impl CartResponse {
    fn with_notification(mut self, notification: Option<Notification>) -> Self {
        self.notifications.extend(notification);
        self
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleResponse {
    pub outcome: ToggleOutcome,
    pub cart: CartResponse,
}

/// Gets the current cart contents.
///
/// ## Display
/// ```text
/// ┌────────────────────────────────────────────────────────────────┐
/// │  CART  (Maria Perez)                              2 lines      │
/// ├────────────────────────────────────────────────────────────────┤
/// │  Meloxicam 1.5mg      2.00 tablet x $10.00        $20.00       │
/// │  Meloxicam 1.5mg      5.00 dose   x  $2.00        $10.00       │
/// ├────────────────────────────────────────────────────────────────┤
/// │  TOTAL                                            $30.00       │
/// └────────────────────────────────────────────────────────────────┘
/// ```
pub fn get_cart(session: &SessionState) -> CartResponse {
    debug!("get_cart command");
    session.with_session(|s| CartResponse::from(s))
}

/// Adds one unit (or one dose) of a product.
///
/// ## Behavior
/// - Product not in the current catalog: `NOT_FOUND`
/// - Nothing left in `mode`: `OUT_OF_STOCK`
/// - Already in the cart: quantity goes up by one, `STOCK_EXCEEDED` at
///   the ceiling
/// - Dose line without a per-dose price: added at the unit price with a
///   warning
pub fn add_to_cart(
    catalog: &CatalogState,
    session: &SessionState,
    product_id: &str,
    mode: SaleMode,
) -> Result<CartResponse, ApiError> {
    debug!(product_id = %product_id, mode = %mode, "add_to_cart command");

    let snapshot = catalog.catalog();
    let entry = snapshot
        .get(product_id)
        .ok_or_else(|| ApiError::not_found("Product", product_id))?;

    let fallback = session.with_session_mut(|s| {
        s.cart_mut()
            .add_entry(entry, mode)
            .map(|line| line.price_fallback().then(|| line.product_name().to_string()))
    })??;

    Ok(get_cart(session).with_notification(fallback.map(|name| Notification::price_fallback(&name))))
}

/// Sets the quantity of a line. Zero or less removes it.
pub fn update_quantity(
    session: &SessionState,
    product_id: &str,
    mode: SaleMode,
    quantity: Quantity,
) -> Result<CartResponse, ApiError> {
    debug!(product_id = %product_id, mode = %mode, quantity = %quantity, "update_quantity command");

    let key = LineKey::new(product_id, mode);
    session.with_session_mut(|s| s.cart_mut().update_quantity(&key, quantity).map(|_| ()))??;
    Ok(get_cart(session))
}

/// Switches a line between unit and dose sale.
///
/// Never fails on cart grounds: when the switch is impossible the cart is
/// left alone and the response carries a warning saying why.
pub fn toggle_mode(
    session: &SessionState,
    product_id: &str,
    mode: SaleMode,
) -> Result<ToggleResponse, ApiError> {
    debug!(product_id = %product_id, mode = %mode, "toggle_mode command");

    let key = LineKey::new(product_id, mode);
    let (outcome, name) = session.with_session_mut(|s| {
        let name = s
            .cart()
            .line(&key)
            .map(|l| l.product_name().to_string())
            .unwrap_or_else(|| product_id.to_string());
        (s.cart_mut().toggle_mode(&key), name)
    })?;

    let target = mode.opposite();
    let notification = match outcome {
        ToggleOutcome::Switched { clamped: false, .. } => None,
        ToggleOutcome::Switched { quantity, clamped: true } => Some(Notification::warning(format!(
            "{} switched to {}, reduced to {} by available stock",
            name, target, quantity
        ))),
        ToggleOutcome::Merged { quantity, clamped } => Some(Notification::warning(format!(
            "{} merged into the existing {} line, now {}{}",
            name,
            target,
            quantity,
            if clamped { " (limited by stock)" } else { "" }
        ))),
        ToggleOutcome::Unchanged { reason } => Some(Notification::warning(match reason {
            UnchangedReason::NotDivisible => format!("{} cannot be sold by dose", name),
            UnchangedReason::NoStockInTargetMode => {
                format!("{} has no {} in stock", name, target)
            }
            UnchangedReason::LineNotFound => format!("{} ({}) is not in the cart", name, mode),
        })),
    };

    Ok(ToggleResponse {
        outcome,
        cart: get_cart(session).with_notification(notification),
    })
}

/// Removes a line. Removing a line that is not there is not an error.
pub fn remove_from_cart(
    session: &SessionState,
    product_id: &str,
    mode: SaleMode,
) -> Result<CartResponse, ApiError> {
    debug!(product_id = %product_id, mode = %mode, "remove_from_cart command");

    let key = LineKey::new(product_id, mode);
    session.with_session_mut(|s| s.cart_mut().remove_line(&key))?;
    Ok(get_cart(session))
}

pub fn set_line_discount(
    session: &SessionState,
    product_id: &str,
    mode: SaleMode,
    amount: Money,
) -> Result<CartResponse, ApiError> {
    debug!(product_id = %product_id, mode = %mode, amount = %amount, "set_line_discount command");

    let key = LineKey::new(product_id, mode);
    session.with_session_mut(|s| s.cart_mut().set_line_discount(&key, amount).map(|_| ()))??;
    Ok(get_cart(session))
}

pub fn set_order_discount(session: &SessionState, amount: Money) -> Result<CartResponse, ApiError> {
    debug!(amount = %amount, "set_order_discount command");

    session.with_session_mut(|s| s.cart_mut().set_order_discount(amount))??;
    Ok(get_cart(session))
}

/// Empties the cart and deselects the client.
pub fn clear_cart(session: &SessionState) -> Result<CartResponse, ApiError> {
    debug!("clear_cart command");

    session.with_session_mut(|s| s.reset())?;
    Ok(get_cart(session))
}

#[cfg(test)]
mod tests {
    use super::*;
    use vetpos_core::{Catalog, CatalogEntry, Inventory, Product};

    use crate::error::ErrorCode;
    use crate::notification::NotificationLevel;

    fn product(id: &str, dpu: i64, unit_price: i64, dose_price: Option<i64>, divisible: bool) -> Product {
        Product {
            id: id.to_string(),
            name: format!("Product {}", id),
            category: None,
            unit: "tablet".to_string(),
            dose_unit: "dose".to_string(),
            doses_per_unit: Quantity::from_whole(dpu),
            divisible,
            sale_price: Money::from_cents(unit_price),
            sale_price_per_dose: dose_price.map(Money::from_cents),
        }
    }

    fn states() -> (CatalogState, SessionState) {
        let catalog = CatalogState::new();
        catalog.replace_catalog(Catalog::from_entries(vec![
            CatalogEntry::new(
                product("melox", 10, 1000, Some(150), true),
                Some(Inventory::new(2, Quantity::from_whole(5))),
            ),
            CatalogEntry::new(
                product("iver", 50, 1800, None, true),
                Some(Inventory::new(1, Quantity::ZERO)),
            ),
            CatalogEntry::new(
                product("rabies", 1, 2500, None, false),
                Some(Inventory::new(3, Quantity::ZERO)),
            ),
            CatalogEntry::new(product("empty", 1, 500, None, false), None),
        ]));
        (catalog, SessionState::new())
    }

    #[test]
    fn test_add_and_increment() {
        let (catalog, session) = states();

        add_to_cart(&catalog, &session, "melox", SaleMode::Dose).unwrap();
        let cart = add_to_cart(&catalog, &session, "melox", SaleMode::Dose).unwrap();

        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.lines[0].quantity(), Quantity::from_whole(2));
        assert_eq!(cart.totals.total, Money::from_cents(300));
        assert!(cart.notifications.is_empty());
    }

    #[test]
    fn test_add_unknown_and_out_of_stock() {
        let (catalog, session) = states();

        let err = add_to_cart(&catalog, &session, "nope", SaleMode::FullUnit).unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        let err = add_to_cart(&catalog, &session, "empty", SaleMode::FullUnit).unwrap_err();
        assert_eq!(err.code, ErrorCode::OutOfStock);
        assert!(get_cart(&session).lines.is_empty());
    }

    #[test]
    fn test_price_fallback_warns() {
        let (catalog, session) = states();

        let cart = add_to_cart(&catalog, &session, "iver", SaleMode::Dose).unwrap();
        assert_eq!(cart.lines[0].applied_price(), Money::from_cents(1800));
        assert_eq!(cart.notifications.len(), 1);
        assert_eq!(cart.notifications[0].level, NotificationLevel::Warning);
    }

    #[test]
    fn test_update_quantity_over_ceiling_is_rejected() {
        let (catalog, session) = states();
        add_to_cart(&catalog, &session, "melox", SaleMode::Dose).unwrap();

        // 2 units × 10 + 5 loose = 25 doses
        let err = update_quantity(&session, "melox", SaleMode::Dose, Quantity::from_whole(26))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::StockExceeded);

        let cart = get_cart(&session);
        assert_eq!(cart.lines[0].quantity(), Quantity::ONE);

        let cart = update_quantity(&session, "melox", SaleMode::Dose, Quantity::from_hundredths(2550))
            .unwrap_err();
        assert_eq!(cart.code, ErrorCode::StockExceeded);

        let cart =
            update_quantity(&session, "melox", SaleMode::Dose, Quantity::from_hundredths(250)).unwrap();
        assert_eq!(cart.totals.total, Money::from_cents(375));
    }

    #[test]
    fn test_update_quantity_zero_removes() {
        let (catalog, session) = states();
        add_to_cart(&catalog, &session, "rabies", SaleMode::FullUnit).unwrap();

        let cart = update_quantity(&session, "rabies", SaleMode::FullUnit, Quantity::ZERO).unwrap();
        assert!(cart.lines.is_empty());
    }

    #[test]
    fn test_toggle_indivisible_warns_and_keeps_line() {
        let (catalog, session) = states();
        add_to_cart(&catalog, &session, "rabies", SaleMode::FullUnit).unwrap();

        let response = toggle_mode(&session, "rabies", SaleMode::FullUnit).unwrap();
        assert_eq!(
            response.outcome,
            ToggleOutcome::Unchanged {
                reason: UnchangedReason::NotDivisible
            }
        );
        assert_eq!(response.cart.notifications.len(), 1);
        assert_eq!(response.cart.lines[0].mode(), SaleMode::FullUnit);
    }

    #[test]
    fn test_toggle_dose_to_unit_clamps() {
        let (catalog, session) = states();
        add_to_cart(&catalog, &session, "melox", SaleMode::Dose).unwrap();
        update_quantity(&session, "melox", SaleMode::Dose, Quantity::from_whole(5)).unwrap();

        let response = toggle_mode(&session, "melox", SaleMode::Dose).unwrap();
        assert_eq!(
            response.outcome,
            ToggleOutcome::Switched {
                quantity: Quantity::from_whole(2),
                clamped: true
            }
        );
        assert_eq!(response.cart.lines[0].mode(), SaleMode::FullUnit);
        assert_eq!(response.cart.totals.total, Money::from_cents(2000));
    }

    #[test]
    fn test_discounts() {
        let (catalog, session) = states();
        add_to_cart(&catalog, &session, "rabies", SaleMode::FullUnit).unwrap();

        set_line_discount(&session, "rabies", SaleMode::FullUnit, Money::from_cents(500)).unwrap();
        let cart = set_order_discount(&session, Money::from_cents(300)).unwrap();
        assert_eq!(cart.totals.total, Money::from_cents(1700));

        let err = set_order_discount(&session, Money::from_cents(-1)).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = set_line_discount(&session, "melox", SaleMode::Dose, Money::from_cents(1)).unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[test]
    fn test_commands_refused_while_submitting() {
        let (catalog, session) = states();
        add_to_cart(&catalog, &session, "rabies", SaleMode::FullUnit).unwrap();

        let _guard = session.begin_checkout().unwrap();
        let err = add_to_cart(&catalog, &session, "rabies", SaleMode::FullUnit).unwrap_err();
        assert_eq!(err.code, ErrorCode::CheckoutPending);
        let err = clear_cart(&session).unwrap_err();
        assert_eq!(err.code, ErrorCode::CheckoutPending);

        assert_eq!(get_cart(&session).lines[0].quantity(), Quantity::ONE);
    }
}
