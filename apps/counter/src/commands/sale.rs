//! # Sale Commands
//!
//! Payment preview and checkout.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    checkout(payment)                                    │
//! │                                                                         │
//! │  1. begin_checkout()        second attempt ──► CHECKOUT_PENDING        │
//! │  2. prepare_checkout()      MISSING_CLIENT / EMPTY_CART / ZERO_TOTAL   │
//! │                             or a payment validation error              │
//! │  3. submit_sale()  ─────────────── one request, no retry               │
//! │         │                                                               │
//! │         ├── Ok  ──► cart + client cleared, catalog refreshed           │
//! │         │           Success notification (+ partial payment warning)   │
//! │         │                                                               │
//! │         └── Err ──► cart + client kept as they were                    │
//! │                     STOCK_EXCEEDED or NETWORK_OR_SERVER_ERROR          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use tracing::{debug, info, warn};

use vetpos_backend::SaleReceipt;
use vetpos_core::{PaymentInstructions, PaymentSummary, PreparedCheckout};

use crate::commands::catalog::refresh_catalog;
use crate::error::ApiError;
use crate::notification::Notification;
use crate::state::{BackendState, CatalogState, ConfigState, SessionState};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub receipt: SaleReceipt,
    pub client_name: String,
    pub line_count: usize,
    pub payment: PaymentSummary,
    pub notifications: Vec<Notification>,
}

/// Fills in the configured exchange rate when the operator paid in local
/// currency without giving one.
fn with_default_rate(
    mut payment: PaymentInstructions,
    config: &ConfigState,
) -> Result<PaymentInstructions, ApiError> {
    if payment.exchange_rate.is_none() && payment.amount_paid_local.is_positive() {
        payment.exchange_rate = config
            .exchange_rate()
            .map_err(|e| ApiError::validation(e.to_string()))?;
    }
    Ok(payment)
}

/// Builds the submission without sending it, for the payment dialog.
pub fn preview_checkout(
    config: &ConfigState,
    session: &SessionState,
    payment: PaymentInstructions,
) -> Result<PreparedCheckout, ApiError> {
    debug!("preview_checkout command");

    let payment = with_default_rate(payment, config)?;
    Ok(session.with_session(|s| s.prepare_checkout(&payment))?)
}

/// Submits the current sale to the backend.
///
/// ## Behavior
/// - Exactly one submission per call; a call made while another is in
///   flight gets `CHECKOUT_PENDING`
/// - Success clears cart and client, then refreshes the catalog so the
///   next sale sees the new stock
/// - Failure leaves the session untouched for the operator to fix and
///   resubmit
pub async fn checkout(
    backend: &BackendState,
    catalog: &CatalogState,
    session: &SessionState,
    config: &ConfigState,
    payment: PaymentInstructions,
) -> Result<CheckoutResponse, ApiError> {
    debug!("checkout command");

    let payment = with_default_rate(payment, config)?;
    let guard = session.begin_checkout()?;

    let (prepared, client_name) = session.with_session(|s| {
        s.prepare_checkout(&payment).map(|prepared| {
            let name = s.client().map(|c| c.name.clone()).unwrap_or_default();
            (prepared, name)
        })
    })?;

    let mut notifications: Vec<Notification> =
        Notification::partial_payment(&prepared.payment, config)
            .into_iter()
            .collect();

    let receipt = match backend.submit_sale(&prepared.submission).await {
        Ok(receipt) => receipt,
        Err(err) => {
            session.with_session(|s| s.abandon_checkout());
            let err = ApiError::from(err);
            warn!(error = %err, "Checkout failed, cart kept");
            return Err(err);
        }
    };

    session.with_session_checkout(&guard, |s| s.complete_checkout());
    drop(guard);

    info!(
        sale_id = %receipt.sale_id,
        client = %client_name,
        total = %prepared.submission.total,
        partial = prepared.payment.is_partial,
        "Checkout complete"
    );

    notifications.insert(
        0,
        Notification::success(format!(
            "Sale {} recorded for {}: {}",
            receipt.sale_id,
            client_name,
            config.format_base(prepared.submission.total)
        )),
    );

    match refresh_catalog(backend, catalog, session).await {
        Ok(refresh) => notifications.extend(refresh.notifications),
        Err(err) => {
            warn!(error = %err, "Catalog refresh after checkout failed");
            notifications.push(Notification::warning(format!(
                "Stock figures may be stale: {}",
                err.message
            )));
        }
    }

    Ok(CheckoutResponse {
        receipt,
        client_name,
        line_count: prepared.submission.lines.len(),
        payment: prepared.payment,
        notifications,
    })
}
