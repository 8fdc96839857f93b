//! # Wire Format
//!
//! JSON shapes exchanged with the backend, and their conversion to and
//! from engine types.
//!
//! ## Catalog row
//! ```text
//! {
//!   "id": 12,                       ← number or string
//!   "name": "Meloxicam 1.5mg",
//!   "category": "NSAID",
//!   "unit": "tablet",
//!   "doseUnit": "dose",
//!   "dosesPerUnit": "9.00",         ← decimal: number or string
//!   "divisible": true,
//!   "salePrice": "10.00",
//!   "salePricePerDose": 2,
//!   "inventory": { "stockUnits": 1, "stockDoses": "3" } | null
//! }
//! ```
//!
//! Decimals are parsed from their text form straight into fixed-point;
//! they never pass through float arithmetic on the way in. Outgoing
//! payloads use JSON numbers.

use serde::{Deserialize, Serialize};
use tracing::warn;

use vetpos_core::validation::{validate_inventory, validate_product};
use vetpos_core::{
    Catalog, CatalogEntry, Client, ExchangeRate, Inventory, Money, Product, Quantity,
    SaleSubmission,
};

use crate::error::{BackendError, BackendResult};

// =============================================================================
// Scalars
// =============================================================================

/// A decimal that may arrive as a JSON number or a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireDecimal {
    Number(serde_json::Number),
    Text(String),
}

impl WireDecimal {
    fn text(&self) -> String {
        match self {
            WireDecimal::Number(n) => n.to_string(),
            WireDecimal::Text(s) => s.trim().to_string(),
        }
    }

    pub fn to_money(&self, field: &str) -> BackendResult<Money> {
        self.text()
            .parse()
            .map_err(|e| BackendError::Decode(format!("{}: {}", field, e)))
    }

    pub fn to_quantity(&self, field: &str) -> BackendResult<Quantity> {
        self.text()
            .parse()
            .map_err(|e| BackendError::Decode(format!("{}: {}", field, e)))
    }
}

/// An identifier that may arrive as a JSON number or a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireId {
    Number(i64),
    Text(String),
}

impl std::fmt::Display for WireId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WireId::Number(n) => write!(f, "{}", n),
            WireId::Text(s) => f.write_str(s),
        }
    }
}

// =============================================================================
// Catalog
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryRow {
    pub stock_units: WireDecimal,
    #[serde(default)]
    pub stock_doses: Option<WireDecimal>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRow {
    pub id: WireId,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub dose_unit: Option<String>,
    #[serde(default)]
    pub doses_per_unit: Option<WireDecimal>,
    #[serde(default)]
    pub divisible: bool,
    pub sale_price: WireDecimal,
    #[serde(default)]
    pub sale_price_per_dose: Option<WireDecimal>,
    #[serde(default)]
    pub inventory: Option<InventoryRow>,
}

impl ProductRow {
    /// Converts one row into a validated catalog entry.
    pub fn into_entry(self) -> BackendResult<CatalogEntry> {
        let doses_per_unit = match &self.doses_per_unit {
            Some(d) => d.to_quantity("dosesPerUnit")?,
            None => Quantity::ONE,
        };

        let sale_price_per_dose = self
            .sale_price_per_dose
            .as_ref()
            .map(|p| p.to_money("salePricePerDose"))
            .transpose()?;

        let product = Product {
            id: self.id.to_string(),
            name: self.name,
            category: self.category,
            unit: self.unit.unwrap_or_else(|| "unit".to_string()),
            dose_unit: self.dose_unit.unwrap_or_else(|| "dose".to_string()),
            doses_per_unit,
            divisible: self.divisible,
            sale_price: self.sale_price.to_money("salePrice")?,
            sale_price_per_dose,
        };
        validate_product(&product).map_err(|e| BackendError::Decode(e.to_string()))?;

        let inventory = match self.inventory {
            Some(row) => {
                let units = row.stock_units.to_quantity("stockUnits")?;
                if !units.is_whole() {
                    return Err(BackendError::Decode(format!(
                        "stockUnits of {} is not a whole number: {}",
                        product.name, units
                    )));
                }
                let doses = match &row.stock_doses {
                    Some(d) => d.to_quantity("stockDoses")?,
                    None => Quantity::ZERO,
                };
                let inventory = Inventory::new(units.whole_units(), doses);
                validate_inventory(&product, &inventory)
                    .map_err(|e| BackendError::Decode(e.to_string()))?;
                Some(inventory)
            }
            None => None,
        };

        Ok(CatalogEntry::new(product, inventory))
    }
}

/// Builds a catalog from fetched rows, skipping any that fail validation.
pub fn into_catalog(rows: Vec<ProductRow>) -> Catalog {
    let entries = rows.into_iter().filter_map(|row| {
        let id = row.id.to_string();
        match row.into_entry() {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(product_id = %id, error = %e, "Skipping catalog entry");
                None
            }
        }
    });
    Catalog::from_entries(entries)
}

// =============================================================================
// Clients
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientRow {
    pub id: WireId,
    pub name: String,
    #[serde(default)]
    pub document: Option<String>,
    #[serde(default)]
    pub credit_balance: Option<WireDecimal>,
}

impl ClientRow {
    pub fn into_client(self) -> BackendResult<Client> {
        let credit_balance = match &self.credit_balance {
            Some(c) => c.to_money("creditBalance")?,
            None => Money::zero(),
        };
        Ok(Client {
            id: self.id.to_string(),
            name: self.name,
            document: self.document,
            credit_balance,
        })
    }
}

// =============================================================================
// Sale Submission
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleLineBody {
    pub product_id: String,
    pub quantity: f64,
    pub is_full_unit: bool,
    pub discount: f64,
}

/// `POST sales` request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleBody {
    pub client_id: String,
    pub items: Vec<SaleLineBody>,
    pub discount_total: f64,
    #[serde(rename = "amountPaidUSD")]
    pub amount_paid_usd: f64,
    pub amount_paid_bs: f64,
    pub exchange_rate: Option<f64>,
    pub credit_used: f64,
    pub payment_method_id: Option<String>,
    pub reference: Option<String>,
    pub total: f64,
}

impl From<&SaleSubmission> for SaleBody {
    fn from(s: &SaleSubmission) -> Self {
        SaleBody {
            client_id: s.client_id.clone(),
            items: s
                .lines
                .iter()
                .map(|line| SaleLineBody {
                    product_id: line.product_id.clone(),
                    quantity: line.quantity.to_f64(),
                    is_full_unit: line.is_full_unit,
                    discount: line.discount.to_major_f64(),
                })
                .collect(),
            discount_total: s.discount_total.to_major_f64(),
            amount_paid_usd: s.amount_paid_usd.to_major_f64(),
            amount_paid_bs: s.amount_paid_bs.to_major_f64(),
            exchange_rate: s.exchange_rate.as_ref().map(ExchangeRate::to_f64),
            credit_used: s.credit_used.to_major_f64(),
            payment_method_id: s.payment_method_id.clone(),
            reference: s.reference.clone(),
            total: s.total.to_major_f64(),
        }
    }
}

/// Success body of `POST sales`. Only the id is required.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleResponse {
    pub id: WireId,
    #[serde(default)]
    pub total: Option<WireDecimal>,
}

/// Error body, in whichever of the common shapes the backend uses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorBody {
    /// Best human-readable message, falling back to the raw body text.
    pub fn message_or(&self, raw: &str) -> String {
        self.message
            .clone()
            .or_else(|| self.error.clone())
            .unwrap_or_else(|| raw.chars().take(200).collect())
    }
}
