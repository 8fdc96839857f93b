//! # Error Types
//!
//! Domain-specific error types for vetpos-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  vetpos-core errors (this file)                                        │
//! │  ├── CartError        - Cart and checkout rule violations              │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  vetpos-backend errors (separate crate)                                │
//! │  └── BackendError     - Catalog fetch / sale submission failures       │
//! │                                                                         │
//! │  counter app errors                                                    │
//! │  └── ApiError         - What the operator sees (code + message)        │
//! │                                                                         │
//! │  Flow: ValidationError → CartError ─┐                                  │
//! │                       BackendError ─┴──► ApiError → Notification       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (product name, field)
//! 3. Every failure leaves the cart exactly as it was before the call

use thiserror::Error;

use crate::quantity::Quantity;
use crate::types::SaleMode;

// =============================================================================
// Cart Error
// =============================================================================

/// Cart and checkout rule violations.
///
/// All of these are local and recoverable: the rejected operation has no
/// effect and nothing is retried automatically.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// Nothing sellable in the requested mode at add-time.
    #[error("{product} is out of stock ({mode})")]
    OutOfStock { product: String, mode: SaleMode },

    /// A quantity change would go past the last-known stock ceiling.
    ///
    /// ## User Workflow
    /// ```text
    /// Dose line: Meloxicam, 5 doses, ceiling 12
    ///      │
    ///      ▼
    /// update_quantity(13)
    ///      │
    ///      ▼
    /// StockExceeded { available: 12, requested: 13 }
    ///      │
    ///      ▼
    /// Line stays at 5; UI shows "Only 12 doses of Meloxicam available"
    /// ```
    #[error("Only {available} {mode} of {product} available, requested {requested}")]
    StockExceeded {
        product: String,
        mode: SaleMode,
        available: Quantity,
        requested: Quantity,
    },

    /// Dose-mode sale asked for on a product that cannot be split.
    #[error("{product} cannot be sold by dose")]
    NotDivisible { product: String },

    #[error("{product_id} ({mode}) is not in the cart")]
    LineNotFound { product_id: String, mode: SaleMode },

    #[error("Cart cannot have more than {max} lines")]
    CartTooLarge { max: usize },

    #[error("Select a client before checking out")]
    MissingClient,

    #[error("Cart is empty")]
    EmptyCart,

    /// Discounts cancel the whole subtotal.
    #[error("Total to pay is zero after discounts")]
    ZeroTotal,

    #[error("{client} has {available} store credit, tried to use {requested}")]
    InsufficientCredit {
        client: String,
        available: String,
        requested: String,
    },

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any cart rule runs, so a malformed quantity never reaches
/// the stock ceiling check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} must not be negative")]
    Negative { field: String },

    #[error("{field} must be positive")]
    MustBePositive { field: String },

    #[error("{field} must be at least {min}")]
    TooSmall { field: String, min: String },

    #[error("{field} must not exceed {max}")]
    TooLarge { field: String, max: String },

    /// Fractional quantity on a whole-unit line.
    #[error("{field} must be a whole number of units, got {value}")]
    NotWhole { field: String, value: String },

    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    pub fn negative(field: &str) -> Self {
        ValidationError::Negative {
            field: field.to_string(),
        }
    }

    pub fn must_be_positive(field: &str) -> Self {
        ValidationError::MustBePositive {
            field: field.to_string(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

pub type CartResult<T> = Result<T, CartError>;
