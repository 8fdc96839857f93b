//! # In-Memory Backend
//!
//! A [`BackendApi`] that keeps products, stock and clients in process.
//! Used when the counter runs offline and by tests. Unlike the cart it is
//! authoritative: a sale that no longer fits the stock is refused.
//!
//! ## Stock Decrement
//! ```text
//! Meloxicam: 2 tablets sealed + 3 loose doses, 9 doses per tablet
//!
//!   sell 1 tablet        → 1 sealed + 3 loose
//!   sell 5 doses         → loose first: 3 used, 2 still needed
//!                          open 1 tablet (9), use 2, 7 left loose
//!                        → 0 sealed + 7 loose
//! ```
//!
//! Whole-unit lines are applied before dose lines, then the whole sale is
//! committed at once or not at all.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use vetpos_core::{
    Catalog, CatalogEntry, Client, Inventory, Money, Product, Quantity, SaleSubmission,
};

use crate::api::{BackendApi, SaleReceipt};
use crate::error::{BackendError, BackendResult};

#[derive(Debug, Default)]
struct Store {
    products: Vec<Product>,
    inventory: HashMap<String, Inventory>,
    clients: Vec<Client>,
    sales: Vec<RecordedSale>,
    /// Fails the next call with this error, once.
    fail_next: Option<BackendError>,
}

/// A sale the in-memory backend accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedSale {
    pub receipt: SaleReceipt,
    pub submission: SaleSubmission,
}

/// Process-local backend.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    store: Mutex<Store>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the backend with products, stock and clients.
    pub fn from_parts(
        catalog: Vec<(Product, Option<Inventory>)>,
        clients: Vec<Client>,
    ) -> Self {
        let mut store = Store {
            clients,
            ..Store::default()
        };
        for (product, inventory) in catalog {
            if let Some(inventory) = inventory {
                store.inventory.insert(product.id.clone(), inventory);
            }
            store.products.push(product);
        }
        InMemoryBackend {
            store: Mutex::new(store),
        }
    }

    /// A small clinic catalog for offline demos.
    pub fn with_demo_data() -> Self {
        Self::from_parts(demo_catalog(), demo_clients())
    }

    /// Adds or replaces a product with its stock.
    pub async fn upsert_product(&self, product: Product, inventory: Option<Inventory>) {
        let mut store = self.store.lock().await;
        match inventory {
            Some(inv) => {
                store.inventory.insert(product.id.clone(), inv);
            }
            None => {
                store.inventory.remove(&product.id);
            }
        }
        if let Some(existing) = store.products.iter_mut().find(|p| p.id == product.id) {
            *existing = product;
        } else {
            store.products.push(product);
        }
    }

    /// Overwrites a product's stock, as another counter's sale would.
    pub async fn set_inventory(&self, product_id: &str, inventory: Inventory) {
        let mut store = self.store.lock().await;
        store.inventory.insert(product_id.to_string(), inventory);
    }

    pub async fn upsert_client(&self, client: Client) {
        let mut store = self.store.lock().await;
        if let Some(existing) = store.clients.iter_mut().find(|c| c.id == client.id) {
            *existing = client;
        } else {
            store.clients.push(client);
        }
    }

    pub async fn inventory(&self, product_id: &str) -> Option<Inventory> {
        self.store.lock().await.inventory.get(product_id).copied()
    }

    pub async fn client(&self, client_id: &str) -> Option<Client> {
        let store = self.store.lock().await;
        store.clients.iter().find(|c| c.id == client_id).cloned()
    }

    /// Sales accepted so far, oldest first.
    pub async fn sales(&self) -> Vec<RecordedSale> {
        self.store.lock().await.sales.clone()
    }

    /// Makes the next call fail with `error`.
    pub async fn fail_next(&self, error: BackendError) {
        self.store.lock().await.fail_next = Some(error);
    }
}

// =============================================================================
// Stock application
// =============================================================================

/// Removes `doses` from a divisible product's stock, opening sealed units
/// when the loose doses run out.
fn take_doses(inventory: &mut Inventory, doses_per_unit: Quantity, doses: Quantity) -> bool {
    if inventory.stock_doses >= doses {
        inventory.stock_doses = inventory.stock_doses - doses;
        return true;
    }

    let still_needed = doses - inventory.stock_doses;
    let per_unit = doses_per_unit.hundredths();
    if per_unit <= 0 {
        return false;
    }
    let to_open = (still_needed.hundredths() + per_unit - 1) / per_unit;
    if to_open > inventory.stock_units {
        return false;
    }

    inventory.stock_units -= to_open;
    inventory.stock_doses = Quantity::from_hundredths(to_open * per_unit) - still_needed;
    true
}

/// Applies every line of `submission` to a copy of the stock. Returns the
/// new stock, or the first line that does not fit.
fn apply_sale(
    products: &[Product],
    inventory: &HashMap<String, Inventory>,
    submission: &SaleSubmission,
) -> BackendResult<HashMap<String, Inventory>> {
    let mut next = inventory.clone();

    let whole_first = submission
        .lines
        .iter()
        .filter(|l| l.is_full_unit)
        .chain(submission.lines.iter().filter(|l| !l.is_full_unit));

    for line in whole_first {
        let product = products
            .iter()
            .find(|p| p.id == line.product_id)
            .ok_or_else(|| BackendError::Server {
                status: 422,
                message: format!("Unknown product {}", line.product_id),
            })?;

        let insufficient = || BackendError::StockRejected {
            message: format!("Insufficient stock for {}", product.name),
        };

        let stock = next.get_mut(&line.product_id).ok_or_else(insufficient)?;

        if line.is_full_unit {
            if !line.quantity.is_whole() || line.quantity.whole_units() > stock.stock_units {
                return Err(insufficient());
            }
            stock.stock_units -= line.quantity.whole_units();
        } else {
            if !product.divisible {
                return Err(BackendError::Server {
                    status: 422,
                    message: format!("{} cannot be sold by dose", product.name),
                });
            }
            if !take_doses(stock, product.doses_per_unit, line.quantity) {
                return Err(insufficient());
            }
        }
    }

    Ok(next)
}

#[async_trait]
impl BackendApi for InMemoryBackend {
    async fn fetch_catalog(&self) -> BackendResult<Catalog> {
        let mut store = self.store.lock().await;
        if let Some(err) = store.fail_next.take() {
            return Err(err);
        }

        let entries = store
            .products
            .iter()
            .map(|p| CatalogEntry::new(p.clone(), store.inventory.get(&p.id).copied()));
        let catalog = Catalog::from_entries(entries);
        debug!(products = catalog.len(), "In-memory catalog served");
        Ok(catalog)
    }

    async fn fetch_clients(&self) -> BackendResult<Vec<Client>> {
        let mut store = self.store.lock().await;
        if let Some(err) = store.fail_next.take() {
            return Err(err);
        }
        Ok(store.clients.clone())
    }

    async fn submit_sale(&self, submission: &SaleSubmission) -> BackendResult<SaleReceipt> {
        let mut store = self.store.lock().await;
        if let Some(err) = store.fail_next.take() {
            return Err(err);
        }

        let client_index = store
            .clients
            .iter()
            .position(|c| c.id == submission.client_id)
            .ok_or_else(|| BackendError::Server {
                status: 404,
                message: format!("Client {} not found", submission.client_id),
            })?;

        let client = &store.clients[client_index];
        if submission.credit_used > client.credit_balance {
            return Err(BackendError::Server {
                status: 422,
                message: format!("{} does not have enough store credit", client.name),
            });
        }

        let next = match apply_sale(&store.products, &store.inventory, submission) {
            Ok(next) => next,
            Err(err) => {
                warn!(client_id = %submission.client_id, error = %err, "In-memory sale refused");
                return Err(err);
            }
        };

        store.inventory = next;
        store.clients[client_index].credit_balance -= submission.credit_used;

        let receipt = SaleReceipt {
            sale_id: Uuid::new_v4().to_string(),
            total: Some(submission.total),
            recorded_at: Utc::now(),
        };
        store.sales.push(RecordedSale {
            receipt: receipt.clone(),
            submission: submission.clone(),
        });

        info!(sale_id = %receipt.sale_id, total = %submission.total, "In-memory sale recorded");
        Ok(receipt)
    }
}

// =============================================================================
// Demo data
// =============================================================================

fn demo_catalog() -> Vec<(Product, Option<Inventory>)> {
    let product = |id: &str,
                   name: &str,
                   category: &str,
                   unit: &str,
                   dose_unit: &str,
                   doses_per_unit: Quantity,
                   sale_price: i64,
                   per_dose: Option<i64>| Product {
        id: id.to_string(),
        name: name.to_string(),
        category: Some(category.to_string()),
        unit: unit.to_string(),
        dose_unit: dose_unit.to_string(),
        doses_per_unit,
        divisible: per_dose.is_some() || doses_per_unit > Quantity::ONE,
        sale_price: Money::from_cents(sale_price),
        sale_price_per_dose: per_dose.map(Money::from_cents),
    };

    vec![
        (
            product("melox", "Meloxicam 1.5mg", "NSAID", "tablet", "dose", Quantity::from_whole(9), 1000, Some(200)),
            Some(Inventory::new(4, Quantity::from_whole(3))),
        ),
        (
            product("ivermectin", "Ivermectin 1% 50ml", "Antiparasitic", "bottle", "ml", Quantity::from_whole(50), 1800, None),
            Some(Inventory::new(2, Quantity::from_hundredths(1250))),
        ),
        (
            product("amoxi", "Amoxicillin 250mg", "Antibiotic", "blister", "tablet", Quantity::from_whole(10), 1500, Some(180)),
            Some(Inventory::new(6, Quantity::ZERO)),
        ),
        (
            product("rabies", "Rabies Vaccine", "Vaccines", "vial", "dose", Quantity::ONE, 2500, None),
            Some(Inventory::new(10, Quantity::ZERO)),
        ),
        (
            product("shampoo", "Chlorhexidine Shampoo 250ml", "Dermatology", "bottle", "dose", Quantity::ONE, 1250, None),
            None,
        ),
    ]
}

fn demo_clients() -> Vec<Client> {
    vec![
        Client {
            id: "1".to_string(),
            name: "Maria Perez".to_string(),
            document: Some("V-12345678".to_string()),
            credit_balance: Money::from_cents(2000),
        },
        Client {
            id: "2".to_string(),
            name: "Granja El Roble".to_string(),
            document: Some("J-40123456-7".to_string()),
            credit_balance: Money::zero(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use vetpos_core::SubmissionLine;

    fn sale(lines: Vec<SubmissionLine>, credit: i64) -> SaleSubmission {
        SaleSubmission {
            client_id: "1".to_string(),
            lines,
            discount_total: Money::zero(),
            amount_paid_usd: Money::from_cents(1000),
            amount_paid_bs: Money::zero(),
            exchange_rate: None,
            credit_used: Money::from_cents(credit),
            payment_method_id: None,
            reference: None,
            total: Money::from_cents(1000),
        }
    }

    fn line(product: &str, hundredths: i64, full: bool) -> SubmissionLine {
        SubmissionLine {
            product_id: product.to_string(),
            quantity: Quantity::from_hundredths(hundredths),
            is_full_unit: full,
            discount: Money::zero(),
        }
    }

    #[test]
    fn test_take_doses_opens_units() {
        let mut inv = Inventory::new(2, Quantity::from_whole(3));
        assert!(take_doses(&mut inv, Quantity::from_whole(9), Quantity::from_whole(5)));
        assert_eq!(inv, Inventory::new(1, Quantity::from_whole(7)));

        assert!(take_doses(&mut inv, Quantity::from_whole(9), Quantity::from_whole(16)));
        assert_eq!(inv, Inventory::new(0, Quantity::ZERO));

        assert!(!take_doses(&mut inv, Quantity::from_whole(9), Quantity::ONE));
    }

    #[tokio::test]
    async fn test_demo_catalog() {
        let backend = InMemoryBackend::with_demo_data();
        let catalog = backend.fetch_catalog().await.unwrap();
        assert_eq!(catalog.len(), 5);
        assert!(catalog.get("shampoo").unwrap().inventory.is_none());
        assert!(catalog.get("ivermectin").unwrap().product.sale_price_per_dose.is_none());
        assert_eq!(backend.fetch_clients().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_submit_sale_decrements_stock_and_credit() {
        let backend = InMemoryBackend::with_demo_data();
        let receipt = backend
            .submit_sale(&sale(vec![line("melox", 100, true), line("melox", 500, false)], 500))
            .await
            .unwrap();

        assert_eq!(receipt.total, Some(Money::from_cents(1000)));
        // 4 sealed + 3 loose: one tablet sold, then 5 doses (3 loose + open one)
        assert_eq!(
            backend.inventory("melox").await,
            Some(Inventory::new(2, Quantity::from_whole(7)))
        );
        assert_eq!(
            backend.client("1").await.unwrap().credit_balance,
            Money::from_cents(1500)
        );
        assert_eq!(backend.sales().await.len(), 1);
    }

    #[tokio::test]
    async fn test_sale_is_all_or_nothing() {
        let backend = InMemoryBackend::with_demo_data();
        let err = backend
            .submit_sale(&sale(vec![line("melox", 100, true), line("rabies", 1100, true)], 0))
            .await
            .unwrap_err();

        assert!(err.is_stock_rejection());
        assert_eq!(
            backend.inventory("melox").await,
            Some(Inventory::new(4, Quantity::from_whole(3)))
        );
        assert!(backend.sales().await.is_empty());
    }

    #[tokio::test]
    async fn test_stale_snapshot_rejected() {
        let backend = InMemoryBackend::with_demo_data();
        backend
            .set_inventory("amoxi", Inventory::new(0, Quantity::ZERO))
            .await;
        let err = backend
            .submit_sale(&sale(vec![line("amoxi", 100, true)], 0))
            .await
            .unwrap_err();
        assert!(err.is_stock_rejection());
    }

    #[tokio::test]
    async fn test_unknown_client_and_credit() {
        let backend = InMemoryBackend::with_demo_data();

        let mut unknown = sale(vec![line("rabies", 100, true)], 0);
        unknown.client_id = "99".to_string();
        assert!(matches!(
            backend.submit_sale(&unknown).await,
            Err(BackendError::Server { status: 404, .. })
        ));

        let greedy = sale(vec![line("rabies", 100, true)], 5000);
        assert!(matches!(
            backend.submit_sale(&greedy).await,
            Err(BackendError::Server { status: 422, .. })
        ));
    }

    #[tokio::test]
    async fn test_fail_next_fires_once() {
        let backend = InMemoryBackend::with_demo_data();
        backend
            .fail_next(BackendError::Network("connection reset".to_string()))
            .await;

        assert!(matches!(
            backend.fetch_catalog().await,
            Err(BackendError::Network(_))
        ));
        assert!(backend.fetch_catalog().await.is_ok());
    }
}
