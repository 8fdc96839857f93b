//! # Backend Error Types
//!
//! Error types for calls to the clinic backend.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  reqwest::Error / HTTP status / bad JSON                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BackendError (this module) ← Categorized                              │
//! │       │                                                                 │
//! │       ├── StockRejected ─────► STOCK_EXCEEDED                          │
//! │       └── everything else ───► NETWORK_OR_SERVER_ERROR                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ApiError (in the counter app) ← What the operator sees                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! None of these are retried automatically. Resubmitting a sale could
//! charge the client twice, so the operator decides.

use thiserror::Error;

/// Backend call failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// The request never got a response.
    ///
    /// ## When This Occurs
    /// - Backend down or unreachable
    /// - Request timed out
    /// - TLS failure
    #[error("Backend unreachable: {0}")]
    Network(String),

    /// The backend answered with a non-success status.
    #[error("Backend returned {status}: {message}")]
    Server { status: u16, message: String },

    /// The backend refused the sale because stock ran out since the
    /// catalog was fetched.
    #[error("Backend rejected the sale: {message}")]
    StockRejected { message: String },

    /// The response body did not match the expected shape.
    #[error("Could not read backend response: {0}")]
    Decode(String),

    #[error("Invalid backend configuration: {0}")]
    InvalidConfig(String),
}

impl BackendError {
    /// True when the backend refused a sale for lack of stock.
    pub fn is_stock_rejection(&self) -> bool {
        matches!(self, BackendError::StockRejected { .. })
    }

    /// Classifies a rejected request from its status and response body.
    ///
    /// ## Mapping
    /// ```text
    /// 409 Conflict                          → StockRejected
    /// body code/message mentions "stock"    → StockRejected
    /// anything else                         → Server
    /// ```
    pub fn from_rejection(status: u16, code: Option<&str>, message: String) -> Self {
        let mentions_stock = |text: &str| text.to_lowercase().contains("stock");

        if status == 409 || code.is_some_and(mentions_stock) || mentions_stock(&message) {
            BackendError::StockRejected { message }
        } else {
            BackendError::Server { status, message }
        }
    }
}

/// Convert reqwest errors to BackendError.
impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            BackendError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            BackendError::Server {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            BackendError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        BackendError::Decode(err.to_string())
    }
}

/// Result type for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;
