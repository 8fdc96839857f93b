//! # Sale Session
//!
//! The cart plus the selected client: everything that lives between
//! "new sale" and a committed checkout.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Sale Session Lifecycle                           │
//! │                                                                         │
//! │   ┌──────────┐  add / qty / toggle / rm / discounts                    │
//! │   │ Building │◄──────────────────────────────────┐                     │
//! │   └────┬─────┘                                   │                     │
//! │        │ prepare_checkout(payment)               │                     │
//! │        ▼                                         │                     │
//! │   ┌──────────┐   backend error / cancelled ──────┘ abandon_checkout()  │
//! │   │ Pending  │   (cart and client untouched)                           │
//! │   └────┬─────┘                                                          │
//! │        │ backend accepted                                               │
//! │        ▼                                                                │
//! │   complete_checkout()  ──► cart and client discarded, fresh session    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Preparing a checkout borrows the session immutably, so nothing is lost
//! if the submission never comes back.

use crate::cart::Cart;
use crate::checkout::{build_submission, PaymentInstructions, PreparedCheckout};
use crate::error::CartResult;
use crate::types::Client;

/// One sale in progress at the counter.
#[derive(Debug, Clone, Default)]
pub struct SaleSession {
    cart: Cart,
    client: Option<Client>,
}

impl SaleSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn cart_mut(&mut self) -> &mut Cart {
        &mut self.cart
    }

    pub fn client(&self) -> Option<&Client> {
        self.client.as_ref()
    }

    /// Selects the client the sale is for, replacing any previous one.
    pub fn select_client(&mut self, client: Client) -> Option<Client> {
        self.client.replace(client)
    }

    pub fn clear_client(&mut self) -> Option<Client> {
        self.client.take()
    }

    /// Builds the payload for the current cart and client.
    pub fn prepare_checkout(&self, payment: &PaymentInstructions) -> CartResult<PreparedCheckout> {
        build_submission(&self.cart, self.client.as_ref(), payment)
    }

    /// The backend committed the sale: discard cart and client.
    pub fn complete_checkout(&mut self) {
        self.cart.clear();
        self.client = None;
    }

    /// Submission failed or was cancelled. The session keeps everything so
    /// the operator can correct and resubmit.
    pub fn abandon_checkout(&self) {}

    /// Starts over without checking out.
    pub fn reset(&mut self) {
        self.complete_checkout();
    }
}
