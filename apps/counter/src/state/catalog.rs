//! # Catalog State
//!
//! The last catalog and client list fetched from the backend.
//!
//! Snapshots are replaced wholesale on refresh and handed out as
//! `Arc<Catalog>`, so a command reads one consistent snapshot even if a
//! refresh lands mid-command.

use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};

use vetpos_core::{Catalog, Client};

#[derive(Debug, Default)]
struct Snapshot {
    catalog: Arc<Catalog>,
    clients: Arc<Vec<Client>>,
    catalog_fetched_at: Option<DateTime<Utc>>,
}

/// Shared catalog and client snapshots.
#[derive(Debug, Clone, Default)]
pub struct CatalogState {
    inner: Arc<RwLock<Snapshot>>,
}

impl CatalogState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn catalog(&self) -> Arc<Catalog> {
        let snapshot = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&snapshot.catalog)
    }

    pub fn clients(&self) -> Arc<Vec<Client>> {
        let snapshot = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&snapshot.clients)
    }

    /// When the catalog was last replaced. `None` before the first fetch.
    pub fn catalog_fetched_at(&self) -> Option<DateTime<Utc>> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .catalog_fetched_at
    }

    pub fn replace_catalog(&self, catalog: Catalog) -> Arc<Catalog> {
        let catalog = Arc::new(catalog);
        let mut snapshot = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        snapshot.catalog = Arc::clone(&catalog);
        snapshot.catalog_fetched_at = Some(Utc::now());
        catalog
    }

    pub fn replace_clients(&self, clients: Vec<Client>) -> Arc<Vec<Client>> {
        let clients = Arc::new(clients);
        let mut snapshot = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        snapshot.clients = Arc::clone(&clients);
        clients
    }

    pub fn find_client(&self, client_id: &str) -> Option<Client> {
        self.clients().iter().find(|c| c.id == client_id).cloned()
    }
}
