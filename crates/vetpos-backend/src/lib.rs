//! # vetpos-backend: Backend API Client for VetPOS
//!
//! Catalog fetch, client list and sale submission against the clinic
//! backend, behind one async trait.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        VetPOS Data Flow                                 │
//! │                                                                         │
//! │  Counter command (checkout)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  vetpos-backend (THIS CRATE)                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │  BackendApi   │    │  HttpBackend  │    │     wire     │  │   │
//! │  │   │   (api.rs)    │◄───│  (reqwest)    │───►│  JSON DTOs   │  │   │
//! │  │   │               │    └───────────────┘    └──────────────┘  │   │
//! │  │   │               │    ┌───────────────┐                      │   │
//! │  │   │               │◄───│InMemoryBackend│  offline / tests     │   │
//! │  │   └───────────────┘    └───────────────┘                      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  GET products-with-inventory · GET clients · POST sales                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`api`] - The `BackendApi` trait and `SaleReceipt`
//! - [`http`] - REST implementation
//! - [`memory`] - In-process implementation with authoritative stock
//! - [`wire`] - JSON shapes and conversions
//! - [`error`] - Backend error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use vetpos_backend::{BackendApi, HttpBackend, HttpBackendConfig};
//!
//! let backend = HttpBackend::new(HttpBackendConfig::new(
//!     "http://localhost:3000/api",
//!     Duration::from_secs(15),
//! ))?;
//! let catalog = backend.fetch_catalog().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod api;
pub mod error;
pub mod http;
pub mod memory;
pub mod wire;

// =============================================================================
// Re-exports
// =============================================================================

pub use api::{BackendApi, SaleReceipt};
pub use error::{BackendError, BackendResult};
pub use http::{HttpBackend, HttpBackendConfig};
pub use memory::{InMemoryBackend, RecordedSale};
