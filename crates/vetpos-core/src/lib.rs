//! # vetpos-core: Pure Pricing & Cart Engine for VetPOS
//!
//! This crate is the counter's engine: stock ceilings, price resolution,
//! the cart and checkout composition for a veterinary clinic that sells
//! products either as whole units or as loose doses.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        VetPOS Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    apps/counter                                 │   │
//! │  │    shell ──► commands ──► notifications                         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ vetpos-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ │   │
//! │  │   │  stock  │ │ pricing │ │  cart   │ │checkout │ │ session │ │   │
//! │  │   │ ceiling │ │ unit /  │ │ lines + │ │ payload │ │ cart +  │ │   │
//! │  │   │ per mode│ │ dose    │ │ totals  │ │ payment │ │ client  │ │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └─────────┘ └─────────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • NO LOGGING • PURE FUNCTIONS            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 vetpos-backend (Backend API)                    │   │
//! │  │       products-with-inventory, clients, sale submission         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Product, Inventory, Client, SaleMode, LineKey
//! - [`money`] / [`quantity`] - Fixed-point Money, ExchangeRate and Quantity
//! - [`stock`] - How much can be sold in each mode
//! - [`pricing`] - Which price applies to each mode
//! - [`cart`] - Cart lines and the aggregate
//! - [`checkout`] - Sale submission and payment reconciliation
//! - [`session`] - Cart + selected client lifecycle
//! - [`catalog`] - Last-fetched product snapshot
//! - [`validation`] / [`error`] - Input rules and typed failures
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same input, same output
//! 2. **No I/O**: the backend crate talks to the network, not this one
//! 3. **Fixed-Point**: money in cents, quantities in hundredths, no floats
//! 4. **Advisory Stock**: ceilings come from a snapshot; the backend has
//!    the final word at commit
//!
//! ## Example Usage
//!
//! ```rust
//! use vetpos_core::{Cart, Inventory, LineKey, Money, Product, Quantity, SaleMode};
//!
//! let product = Product {
//!     id: "melox".into(),
//!     name: "Meloxicam 1.5mg".into(),
//!     category: None,
//!     unit: "tablet".into(),
//!     dose_unit: "dose".into(),
//!     doses_per_unit: Quantity::from_whole(9),
//!     divisible: true,
//!     sale_price: Money::from_cents(1000),
//!     sale_price_per_dose: Some(Money::from_cents(200)),
//! };
//! let stock = Inventory::new(1, Quantity::from_whole(3));
//!
//! let mut cart = Cart::new();
//! cart.add_line(&product, Some(&stock), SaleMode::Dose).unwrap();
//! cart.update_quantity(&LineKey::new("melox", SaleMode::Dose), Quantity::from_whole(5))
//!     .unwrap();
//!
//! // 5 doses × 2.00
//! assert_eq!(cart.totals().total, Money::from_cents(1000));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod error;
pub mod money;
pub mod numeric;
pub mod pricing;
pub mod quantity;
pub mod session;
pub mod stock;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartLine, CartTotals, CeilingAdjustment, ToggleOutcome, UnchangedReason};
pub use catalog::Catalog;
pub use checkout::{
    build_submission, PaymentInstructions, PaymentSummary, PreparedCheckout, SaleSubmission,
    SubmissionLine,
};
pub use error::{CartError, CartResult, ValidationError};
pub use money::{ExchangeRate, Money};
pub use pricing::{unit_price, PriceResolution};
pub use quantity::Quantity;
pub use session::SaleSession;
pub use stock::{available_stock, entry_available_stock};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines in a single cart
///
/// ## Business Reason
/// Prevents runaway carts and keeps submissions a reasonable size.
pub const MAX_CART_LINES: usize = 100;
