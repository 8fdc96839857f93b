//! # Backend API Seam
//!
//! The trait the counter talks to. Two implementations live in this crate:
//!
//! ```text
//! ┌──────────────────────┐         ┌──────────────────────────────────┐
//! │  dyn BackendApi      │────────►│ HttpBackend     (reqwest, JSON)  │
//! │                      │────────►│ InMemoryBackend (offline / tests)│
//! └──────────────────────┘         └──────────────────────────────────┘
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use vetpos_core::{Catalog, Client, Money, SaleSubmission};

use crate::error::BackendResult;

/// What the backend hands back for a committed sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleReceipt {
    pub sale_id: String,
    /// Backend's total, when it reports one.
    pub total: Option<Money>,
    pub recorded_at: DateTime<Utc>,
}

/// Calls the counter makes against the clinic backend.
///
/// Every call is a single request: no retry, no queuing.
#[async_trait]
pub trait BackendApi: Send + Sync {
    /// `GET products-with-inventory`
    async fn fetch_catalog(&self) -> BackendResult<Catalog>;

    /// `GET clients`
    async fn fetch_clients(&self) -> BackendResult<Vec<Client>>;

    /// `POST sales`. Sent exactly once per checkout attempt.
    async fn submit_sale(&self, submission: &SaleSubmission) -> BackendResult<SaleReceipt>;
}
