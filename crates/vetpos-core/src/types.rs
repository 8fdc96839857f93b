//! # Domain Types
//!
//! Catalog and client types shared by the engine, the backend client and
//! the counter app.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌──────────────────────┐   ┌─────────────────┐   ┌─────────────────┐  │
//! │  │      Product         │   │   Inventory     │   │     Client      │  │
//! │  │  ──────────────────  │   │  ─────────────  │   │  ─────────────  │  │
//! │  │  id, name, category  │   │  stock_units    │   │  id, name       │  │
//! │  │  unit / dose_unit    │   │  stock_doses    │   │  credit_balance │  │
//! │  │  doses_per_unit      │   └────────┬────────┘   └─────────────────┘  │
//! │  │  divisible           │            │ 1:1                              │
//! │  │  sale_price(_per_dose)│◄──────────┘                                  │
//! │  └──────────────────────┘                                               │
//! │              │                                                          │
//! │              ▼                                                          │
//! │  CatalogEntry { product, inventory: Option<Inventory> }                │
//! │                                                                         │
//! │  SaleMode { FullUnit, Dose }   LineKey { product_id, mode }            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Inventory is owned by the backend. The engine only ever holds a
//! point-in-time copy and treats it as an advisory ceiling.

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::Money;
use crate::quantity::Quantity;

// =============================================================================
// Sale Mode
// =============================================================================

/// Whether a cart line sells whole physical units or loose doses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SaleMode {
    /// One bottle, one blister, one tablet.
    FullUnit,
    /// A fraction of a unit (a ninth of a tablet, one milliliter).
    Dose,
}

impl SaleMode {
    /// Maps the backend's `isFullUnit` flag.
    #[inline]
    pub const fn from_full_unit(is_full_unit: bool) -> Self {
        if is_full_unit {
            SaleMode::FullUnit
        } else {
            SaleMode::Dose
        }
    }

    #[inline]
    pub const fn is_full_unit(&self) -> bool {
        matches!(self, SaleMode::FullUnit)
    }

    #[inline]
    pub const fn opposite(&self) -> Self {
        match self {
            SaleMode::FullUnit => SaleMode::Dose,
            SaleMode::Dose => SaleMode::FullUnit,
        }
    }
}

impl fmt::Display for SaleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaleMode::FullUnit => write!(f, "units"),
            SaleMode::Dose => write!(f, "doses"),
        }
    }
}

// =============================================================================
// Line Key
// =============================================================================

/// Identity of a cart line.
///
/// The same product can sit in the cart twice, once per sale mode.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LineKey {
    pub product_id: String,
    pub mode: SaleMode,
}

impl LineKey {
    pub fn new(product_id: impl Into<String>, mode: SaleMode) -> Self {
        LineKey {
            product_id: product_id.into(),
            mode,
        }
    }

    /// The key of the sibling line for the same product.
    pub fn flipped(&self) -> Self {
        LineKey {
            product_id: self.product_id.clone(),
            mode: self.mode.opposite(),
        }
    }
}

impl fmt::Display for LineKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.product_id, self.mode)
    }
}

// =============================================================================
// Product
// =============================================================================

/// A catalog product as supplied by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,

    /// Display name, also used in every error message about this product.
    pub name: String,

    pub category: Option<String>,

    /// Label for whole-unit sales ("tablet", "bottle").
    pub unit: String,

    /// Label for fractional sales ("dose", "ml").
    pub dose_unit: String,

    /// How many doses one whole unit holds. Always ≥ 1.
    pub doses_per_unit: Quantity,

    /// Whether dose-mode sale is permitted.
    pub divisible: bool,

    /// Price per whole unit.
    pub sale_price: Money,

    /// Price per dose. Meaningful only when `divisible`.
    pub sale_price_per_dose: Option<Money>,
}

impl Product {
    /// True if the product can be sold in `mode`.
    #[inline]
    pub fn supports(&self, mode: SaleMode) -> bool {
        mode.is_full_unit() || self.divisible
    }

    /// The label for quantities in `mode`.
    pub fn unit_label(&self, mode: SaleMode) -> &str {
        match mode {
            SaleMode::FullUnit => &self.unit,
            SaleMode::Dose => &self.dose_unit,
        }
    }
}

// =============================================================================
// Inventory
// =============================================================================

/// Stock held for one product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Inventory {
    /// Sealed whole units.
    pub stock_units: i64,

    /// Loose doses left over from opened units.
    pub stock_doses: Quantity,
}

impl Inventory {
    pub fn new(stock_units: i64, stock_doses: Quantity) -> Self {
        Inventory {
            stock_units,
            stock_doses,
        }
    }

    /// `stock_units × doses_per_unit + stock_doses`.
    pub fn total_doses(&self, doses_per_unit: Quantity) -> Quantity {
        Quantity::from_whole(self.stock_units).times(doses_per_unit) + self.stock_doses
    }
}

// =============================================================================
// Catalog Entry
// =============================================================================

/// A product joined with its inventory, as fetched from the backend.
///
/// `inventory` is `None` when the product has never been stocked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub product: Product,
    pub inventory: Option<Inventory>,
}

impl CatalogEntry {
    pub fn new(product: Product, inventory: Option<Inventory>) -> Self {
        CatalogEntry { product, inventory }
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.product.id
    }
}

// =============================================================================
// Client
// =============================================================================

/// The clinic client a sale is billed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: String,
    pub name: String,

    /// National id / tax document, shown on the invoice.
    pub document: Option<String>,

    /// Pre-paid balance usable toward a sale.
    pub credit_balance: Money,
}

// =============================================================================
// Unit Tests
// =============================================================================
