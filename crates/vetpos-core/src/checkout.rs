//! # Checkout Composer
//!
//! Turns a cart, a selected client and the operator's payment
//! instructions into the one payload the backend receives.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Checkout Flow                                   │
//! │                                                                         │
//! │  build_submission(cart, client, payment)                               │
//! │       │                                                                 │
//! │       ├── client selected?        no ──► MissingClient                 │
//! │       ├── cart has lines?         no ──► EmptyCart                     │
//! │       ├── totals().total > 0?     no ──► ZeroTotal                     │
//! │       ├── payment amounts sane?   no ──► Validation / InsufficientCredit│
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  PreparedCheckout                                                       │
//! │  ├── submission: SaleSubmission   (minimal per-line fields)            │
//! │  └── payment:    PaymentSummary   (is_partial for operator feedback)   │
//! │                                                                         │
//! │  A partial payment is still a valid submission; the backend decides    │
//! │  what partial-payment policy allows.                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cart::{Cart, CartLine};
use crate::error::{CartError, CartResult, ValidationError};
use crate::money::{ExchangeRate, Money};
use crate::quantity::Quantity;
use crate::types::Client;
use crate::validation::{validate_exchange_rate, validate_payment_amount};

// =============================================================================
// Payment Instructions
// =============================================================================

/// How the client intends to pay, as collected by the payment dialog.
///
/// `amount_paid_base` is in the store's base currency (USD);
/// `amount_paid_local` is in local currency (Bs) and converted with
/// `exchange_rate`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInstructions {
    pub amount_paid_base: Money,
    pub amount_paid_local: Money,
    pub exchange_rate: Option<ExchangeRate>,
    pub credit_used: Money,
    pub payment_method_id: Option<String>,
    pub reference: Option<String>,
}

/// Reconciliation of a payment against the amount due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSummary {
    pub total: Money,
    pub paid_base: Money,
    /// Local-currency payment converted to base currency.
    pub paid_local_in_base: Money,
    pub credit_used: Money,
    /// `paid_base + paid_local_in_base + credit_used`
    pub tendered: Money,
    /// Still owed; zero when fully paid.
    pub remaining: Money,
    /// Overpayment to hand back; zero when underpaid.
    pub change: Money,
    pub is_partial: bool,
}

/// Reconciles `payment` against `total` for `client`.
///
/// ## Rules
/// - No component may be negative
/// - A local-currency amount needs a positive exchange rate
/// - Store credit cannot exceed the client's balance nor the total
///
/// Covering less than the total is allowed and tagged `is_partial`.
pub fn reconcile_payment(
    total: Money,
    client: &Client,
    payment: &PaymentInstructions,
) -> CartResult<PaymentSummary> {
    validate_payment_amount("amount paid (base currency)", payment.amount_paid_base)?;
    validate_payment_amount("amount paid (local currency)", payment.amount_paid_local)?;
    validate_payment_amount("credit used", payment.credit_used)?;

    let paid_local_in_base = if payment.amount_paid_local.is_zero() {
        Money::zero()
    } else {
        let rate = validate_exchange_rate(payment.exchange_rate)?;
        rate.to_base(payment.amount_paid_local)
            .ok_or_else(|| ValidationError::must_be_positive("exchange rate"))?
    };

    if payment.credit_used > client.credit_balance {
        return Err(CartError::InsufficientCredit {
            client: client.name.clone(),
            available: client.credit_balance.to_string(),
            requested: payment.credit_used.to_string(),
        });
    }

    if payment.credit_used > total {
        return Err(ValidationError::TooLarge {
            field: "credit used".to_string(),
            max: total.to_string(),
        }
        .into());
    }

    let tendered = payment.amount_paid_base + paid_local_in_base + payment.credit_used;

    Ok(PaymentSummary {
        total,
        paid_base: payment.amount_paid_base,
        paid_local_in_base,
        credit_used: payment.credit_used,
        tendered,
        remaining: (total - tendered).clamp_non_negative(),
        change: (tendered - total).clamp_non_negative(),
        is_partial: tendered < total,
    })
}

// =============================================================================
// Sale Submission
// =============================================================================

/// One cart line as the backend needs it. Prices are left out; the
/// backend recomputes them authoritatively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionLine {
    pub product_id: String,
    pub quantity: Quantity,
    pub is_full_unit: bool,
    pub discount: Money,
}

impl From<&CartLine> for SubmissionLine {
    fn from(line: &CartLine) -> Self {
        SubmissionLine {
            product_id: line.product_id().to_string(),
            quantity: line.quantity(),
            is_full_unit: line.is_full_unit(),
            discount: line.discount(),
        }
    }
}

/// The checkout payload. Built once per attempt and sent once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleSubmission {
    pub client_id: String,
    pub lines: Vec<SubmissionLine>,
    /// Order-level discount.
    pub discount_total: Money,
    #[serde(rename = "amountPaidUSD")]
    pub amount_paid_usd: Money,
    pub amount_paid_bs: Money,
    pub exchange_rate: Option<ExchangeRate>,
    pub credit_used: Money,
    pub payment_method_id: Option<String>,
    pub reference: Option<String>,
    /// Client-side total, for the backend to cross-check.
    pub total: Money,
}

/// A submission ready to send, with its payment reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PreparedCheckout {
    pub submission: SaleSubmission,
    pub payment: PaymentSummary,
}

/// Builds the checkout payload.
///
/// Preconditions are checked in order and the first failure wins:
/// `MissingClient`, then `EmptyCart`, then `ZeroTotal`. Payment
/// validation runs last.
///
/// ## Example
/// ```rust
/// use vetpos_core::checkout::{build_submission, PaymentInstructions};
/// use vetpos_core::{Cart, CartError};
///
/// let cart = Cart::new();
/// let err = build_submission(&cart, None, &PaymentInstructions::default()).unwrap_err();
/// assert_eq!(err, CartError::MissingClient);
/// ```
pub fn build_submission(
    cart: &Cart,
    client: Option<&Client>,
    payment: &PaymentInstructions,
) -> CartResult<PreparedCheckout> {
    let client = client.ok_or(CartError::MissingClient)?;

    if cart.is_empty() {
        return Err(CartError::EmptyCart);
    }

    let totals = cart.totals();
    if !totals.total.is_positive() {
        return Err(CartError::ZeroTotal);
    }

    let summary = reconcile_payment(totals.total, client, payment)?;

    let submission = SaleSubmission {
        client_id: client.id.clone(),
        lines: cart.lines().map(SubmissionLine::from).collect(),
        discount_total: totals.order_discount,
        amount_paid_usd: payment.amount_paid_base,
        amount_paid_bs: payment.amount_paid_local,
        exchange_rate: payment.exchange_rate,
        credit_used: payment.credit_used,
        payment_method_id: payment.payment_method_id.clone(),
        reference: payment.reference.clone(),
        total: totals.total,
    };

    Ok(PreparedCheckout {
        submission,
        payment: summary,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
