//! # Operator Notifications
//!
//! Short messages surfaced to the person at the counter after a command.
//! Commands return them alongside their result; the shell prints them.

use serde::Serialize;

use vetpos_core::{CeilingAdjustment, PaymentSummary};

use crate::error::ApiError;
use crate::state::ConfigState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Notification {
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Notification {
            level: NotificationLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Notification {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }

    /// Warning for a line added at the whole-unit price because the
    /// product has no per-dose price.
    pub fn price_fallback(product_name: &str) -> Self {
        Notification::warning(format!(
            "{} has no per-dose price; charged at the unit price",
            product_name
        ))
    }

    /// Tells the operator a fresh stock snapshot shrank or removed a line.
    pub fn ceiling_adjusted(adjustment: &CeilingAdjustment) -> Self {
        match adjustment.new_quantity {
            Some(qty) => Notification::warning(format!(
                "{} ({}) reduced from {} to {}: only {} left",
                adjustment.product_name,
                adjustment.key.mode,
                adjustment.previous_quantity,
                qty,
                adjustment.available_stock
            )),
            None => Notification::warning(format!(
                "{} ({}) removed from the cart: no stock left",
                adjustment.product_name, adjustment.key.mode
            )),
        }
    }

    /// Warns when the payment leaves part of the total owed.
    pub fn partial_payment(summary: &PaymentSummary, config: &ConfigState) -> Option<Self> {
        summary.is_partial.then(|| {
            Notification::warning(format!(
                "Partial payment: {} of {} still owed",
                config.format_base(summary.remaining),
                config.format_base(summary.total)
            ))
        })
    }
}

impl From<&ApiError> for Notification {
    fn from(err: &ApiError) -> Self {
        Notification::error(err.message.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vetpos_core::{LineKey, Money, Quantity, SaleMode};

    #[test]
    fn test_ceiling_adjusted_messages() {
        let mut adjustment = CeilingAdjustment {
            key: LineKey::new("melox", SaleMode::Dose),
            product_name: "Meloxicam".to_string(),
            previous_quantity: Quantity::from_whole(10),
            new_quantity: Some(Quantity::from_whole(4)),
            available_stock: Quantity::from_whole(4),
        };
        let note = Notification::ceiling_adjusted(&adjustment);
        assert_eq!(note.level, NotificationLevel::Warning);
        assert!(note.message.contains("reduced"));

        adjustment.new_quantity = None;
        let note = Notification::ceiling_adjusted(&adjustment);
        assert!(note.message.contains("removed"));
    }

    #[test]
    fn test_partial_payment_only_when_owed() {
        let config = ConfigState::default();
        let mut summary = PaymentSummary {
            total: Money::from_cents(1000),
            paid_base: Money::from_cents(400),
            paid_local_in_base: Money::zero(),
            credit_used: Money::zero(),
            tendered: Money::from_cents(400),
            remaining: Money::from_cents(600),
            change: Money::zero(),
            is_partial: true,
        };
        let note = Notification::partial_payment(&summary, &config).unwrap();
        assert!(note.message.contains("$6.00"));

        summary.is_partial = false;
        assert!(Notification::partial_payment(&summary, &config).is_none());
    }
}
