//! # State Module
//!
//! Application state for the counter.
//!
//! Each concern gets its own state type, and each command takes only the
//! states it needs.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐  ┌────────────┐  │
//! │  │ BackendState │  │ SessionState │  │ CatalogState │  │ConfigState │  │
//! │  │              │  │              │  │              │  │            │  │
//! │  │ Arc<dyn      │  │ Arc<Mutex<   │  │ Arc<RwLock<  │  │ backend_url│  │
//! │  │  BackendApi> │  │ SaleSession>>│  │  snapshot>>  │  │ currencies │  │
//! │  │              │  │ + in-flight  │  │              │  │            │  │
//! │  └──────────────┘  └──────────────┘  └──────────────┘  └────────────┘  │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • BackendState: implementations are Send + Sync                       │
//! │  • SessionState: Mutex for exclusive access, flag for checkout         │
//! │  • CatalogState: replaced wholesale, readers keep their Arc            │
//! │  • ConfigState: read-only after initialization                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod backend;
mod catalog;
mod config;
mod session;

pub use backend::BackendState;
pub use catalog::CatalogState;
pub use config::ConfigState;
pub use session::{CheckoutGuard, SessionState};
