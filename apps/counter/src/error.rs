//! # API Error Type
//!
//! Unified error type for counter commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow                                           │
//! │                                                                         │
//! │  vetpos-core                 vetpos-backend                             │
//! │  ───────────                 ──────────────                             │
//! │  CartError::OutOfStock       BackendError::StockRejected                │
//! │  CartError::EmptyCart        BackendError::Network / Server / Decode    │
//! │        │                              │                                 │
//! │        └──────────────┬───────────────┘                                 │
//! │                       ▼                                                 │
//! │              ApiError { code, message }                                 │
//! │                       │                                                 │
//! │                       ▼                                                 │
//! │              Notification (error level) shown to the operator           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every error is recoverable: the command that failed changed nothing,
//! and the operator decides whether to retry.

use serde::Serialize;
use thiserror::Error;
use vetpos_backend::BackendError;
use vetpos_core::{CartError, ValidationError};

/// API error returned from counter commands.
///
/// ## Serialization
/// ```json
/// {
///   "code": "STOCK_EXCEEDED",
///   "message": "Only 12 doses of Meloxicam 15mg available, requested 13"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for command responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Nothing left to sell in the requested mode
    OutOfStock,

    /// Quantity above the known stock, or the backend rejected a sale for stock
    StockExceeded,

    /// Checkout without a selected client
    MissingClient,

    /// Checkout with no lines
    EmptyCart,

    /// Discounts cancel the whole amount due
    ZeroTotal,

    /// Backend unreachable or answered with an error
    NetworkOrServerError,

    /// Input validation failed
    ValidationError,

    /// Product, client or cart line not found
    NotFound,

    /// A sale submission is already in flight
    CheckoutPending,

    Internal,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    pub fn checkout_pending() -> Self {
        ApiError::new(
            ErrorCode::CheckoutPending,
            "A sale is being submitted, wait for it to finish",
        )
    }
}

/// Converts cart errors to API errors.
impl From<CartError> for ApiError {
    fn from(err: CartError) -> Self {
        let message = err.to_string();
        let code = match err {
            CartError::OutOfStock { .. } => ErrorCode::OutOfStock,
            CartError::StockExceeded { .. } => ErrorCode::StockExceeded,
            CartError::MissingClient => ErrorCode::MissingClient,
            CartError::EmptyCart => ErrorCode::EmptyCart,
            CartError::ZeroTotal => ErrorCode::ZeroTotal,
            CartError::LineNotFound { .. } => ErrorCode::NotFound,
            CartError::NotDivisible { .. }
            | CartError::CartTooLarge { .. }
            | CartError::InsufficientCredit { .. }
            | CartError::Validation(_) => ErrorCode::ValidationError,
        };
        ApiError::new(code, message)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

/// Converts backend errors to API errors.
///
/// A stock rejection keeps the backend's wording so the operator sees
/// which product ran out.
impl From<BackendError> for ApiError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::StockRejected { message } => {
                ApiError::new(ErrorCode::StockExceeded, message)
            }
            BackendError::InvalidConfig(e) => {
                tracing::error!("Backend misconfigured: {}", e);
                ApiError::internal(format!("Backend is not configured: {}", e))
            }
            other => {
                tracing::error!("Backend call failed: {}", other);
                ApiError::new(ErrorCode::NetworkOrServerError, other.to_string())
            }
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

// =============================================================================
// Configuration Error
// =============================================================================

/// Errors loading the counter configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
