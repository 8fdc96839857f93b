//! # Catalog Commands
//!
//! Fetching the product and client snapshots, searching them, and picking
//! the client a sale is billed to.
//!
//! ## Refresh and the Cart
//! ```text
//! refresh_catalog
//!      │
//!      ├── GET products-with-inventory ──► new Catalog snapshot
//!      │
//!      └── cart.refresh_ceilings(&catalog)
//!               │
//!               ├── ceilings updated, prices left as they were
//!               ├── lines above the new ceiling clamped down
//!               └── lines with nothing left removed
//!                        │
//!                        ▼
//!               one warning per changed line
//! ```

use serde::Serialize;
use tracing::{debug, info};

use vetpos_core::{
    entry_available_stock, unit_price, CatalogEntry, CeilingAdjustment, Client, Money, Quantity,
    SaleMode,
};

use crate::error::ApiError;
use crate::notification::Notification;
use crate::state::{BackendState, CatalogState, SessionState};

/// A catalog row as shown in search results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    pub id: String,
    pub name: String,
    pub category: Option<String>,
    pub unit: String,
    pub dose_unit: String,
    pub divisible: bool,
    pub unit_price: Money,
    /// `None` for products that cannot be sold by dose.
    pub dose_price: Option<Money>,
    /// True when the dose price shown is really the unit price.
    pub dose_price_fallback: bool,
    pub units_available: Quantity,
    pub doses_available: Option<Quantity>,
}

impl From<&CatalogEntry> for ProductView {
    fn from(entry: &CatalogEntry) -> Self {
        let product = &entry.product;
        let dose = product
            .divisible
            .then(|| unit_price(product, SaleMode::Dose));

        ProductView {
            id: product.id.clone(),
            name: product.name.clone(),
            category: product.category.clone(),
            unit: product.unit.clone(),
            dose_unit: product.dose_unit.clone(),
            divisible: product.divisible,
            unit_price: unit_price(product, SaleMode::FullUnit).price(),
            dose_price: dose.map(|d| d.price()),
            dose_price_fallback: dose.is_some_and(|d| d.is_fallback()),
            units_available: entry_available_stock(entry, SaleMode::FullUnit),
            doses_available: product
                .divisible
                .then(|| entry_available_stock(entry, SaleMode::Dose)),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub product_count: usize,
    pub adjustments: Vec<CeilingAdjustment>,
    pub notifications: Vec<Notification>,
}

/// Fetches a fresh catalog and re-applies stock ceilings to the cart.
///
/// Nothing changes if the fetch fails.
pub async fn refresh_catalog(
    backend: &BackendState,
    catalog: &CatalogState,
    session: &SessionState,
) -> Result<RefreshResponse, ApiError> {
    debug!("refresh_catalog command");

    if session.is_submitting() {
        return Err(ApiError::checkout_pending());
    }

    let fetched = backend.fetch_catalog().await?;
    let snapshot = catalog.replace_catalog(fetched);

    let adjustments = session.with_session_mut(|s| s.cart_mut().refresh_ceilings(&snapshot))?;
    let notifications = adjustments
        .iter()
        .map(Notification::ceiling_adjusted)
        .collect();

    info!(
        products = snapshot.len(),
        adjusted = adjustments.len(),
        "Catalog refreshed"
    );

    Ok(RefreshResponse {
        product_count: snapshot.len(),
        adjustments,
        notifications,
    })
}

/// Searches the current catalog by name or category.
///
/// An empty query lists everything.
pub fn search_products(catalog: &CatalogState, query: &str) -> Result<Vec<ProductView>, ApiError> {
    debug!(query = %query, "search_products command");

    let snapshot = catalog.catalog();
    let results = snapshot.search(query)?;
    Ok(results.into_iter().map(ProductView::from).collect())
}

/// Lists clients, fetching them when none are cached or `refresh` is set.
pub async fn list_clients(
    backend: &BackendState,
    catalog: &CatalogState,
    refresh: bool,
) -> Result<Vec<Client>, ApiError> {
    debug!(refresh, "list_clients command");

    let cached = catalog.clients();
    if !refresh && !cached.is_empty() {
        return Ok(cached.as_ref().clone());
    }

    let clients = backend.fetch_clients().await?;
    info!(count = clients.len(), "Clients fetched");
    Ok(catalog.replace_clients(clients).as_ref().clone())
}

/// Picks the client the current sale is billed to.
pub fn select_client(
    catalog: &CatalogState,
    session: &SessionState,
    client_id: &str,
) -> Result<Client, ApiError> {
    debug!(client_id = %client_id, "select_client command");

    let client = catalog
        .find_client(client_id)
        .ok_or_else(|| ApiError::not_found("Client", client_id))?;

    session.with_session_mut(|s| s.select_client(client.clone()))?;
    Ok(client)
}

pub fn clear_client(session: &SessionState) -> Result<(), ApiError> {
    debug!("clear_client command");
    session.with_session_mut(|s| s.clear_client())?;
    Ok(())
}
