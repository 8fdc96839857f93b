//! # Validation Module
//!
//! Input validation for cart mutations, catalog ingestion and payments.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Counter app                                                  │
//! │  ├── Parsing operator input ("2.5", "10.00")                           │
//! │  └── Immediate notification                                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Quantity precision per sale mode                                  │
//! │  ├── Non-negative, bounded discounts, payments and prices              │
//! │  └── Catalog snapshot sanity                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Backend                                                      │
//! │  └── Authoritative stock and payment policy at commit                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use vetpos_core::validation::{coerce_quantity, validate_discount};
//! use vetpos_core::{Money, Quantity, SaleMode};
//!
//! // Whole-unit lines only take whole numbers
//! assert!(coerce_quantity(Quantity::from_hundredths(150), SaleMode::FullUnit).is_err());
//! assert!(coerce_quantity(Quantity::from_hundredths(150), SaleMode::Dose).is_ok());
//!
//! assert!(validate_discount("discount", Money::from_cents(-1)).is_err());
//! ```

use crate::error::ValidationError;
use crate::money::{ExchangeRate, Money, MAX_MONEY_CENTS};
use crate::quantity::Quantity;
use crate::types::{Inventory, Product, SaleMode};
use crate::MAX_CART_LINES;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Quantity
// =============================================================================

/// Applies the precision rule for `mode` to a positive quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Whole-unit lines: must be a whole number
/// - Dose lines: any two-place value (already guaranteed by [`Quantity`])
pub fn coerce_quantity(qty: Quantity, mode: SaleMode) -> ValidationResult<Quantity> {
    if !qty.is_positive() {
        return Err(ValidationError::must_be_positive("quantity"));
    }

    if mode.is_full_unit() && !qty.is_whole() {
        return Err(ValidationError::NotWhole {
            field: "quantity".to_string(),
            value: qty.to_string(),
        });
    }

    Ok(qty)
}

/// Parses operator text into a quantity for `mode`.
///
/// Extra decimals are rounded to two places first, then
/// [`coerce_quantity`] runs. Zero and negative values are returned as-is
/// so the cart can treat them as a removal.
pub fn parse_quantity(text: &str, mode: SaleMode) -> ValidationResult<Quantity> {
    let qty: Quantity = text.parse().map_err(|e| ValidationError::InvalidFormat {
        field: "quantity".to_string(),
        reason: format!("{}", e),
    })?;

    if !qty.is_positive() {
        return Ok(qty);
    }

    coerce_quantity(qty, mode)
}

// =============================================================================
// Money
// =============================================================================

/// Checks that an amount is between zero and [`MAX_MONEY_CENTS`].
fn validate_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::negative(field));
    }
    if !amount.is_within_limit() {
        return Err(ValidationError::TooLarge {
            field: field.to_string(),
            max: Money::from_cents(MAX_MONEY_CENTS).to_string(),
        });
    }
    Ok(())
}

/// Validates a discount amount. Zero is allowed.
pub fn validate_discount(field: &str, amount: Money) -> ValidationResult<()> {
    validate_amount(field, amount)
}

/// Validates one component of a payment. Zero is allowed.
pub fn validate_payment_amount(field: &str, amount: Money) -> ValidationResult<()> {
    validate_amount(field, amount)
}

/// Validates an exchange rate supplied alongside a local-currency payment.
pub fn validate_exchange_rate(rate: Option<ExchangeRate>) -> ValidationResult<ExchangeRate> {
    match rate {
        None => Err(ValidationError::Required {
            field: "exchange rate".to_string(),
        }),
        Some(rate) if !rate.is_positive() => Err(ValidationError::must_be_positive("exchange rate")),
        Some(rate) => Ok(rate),
    }
}

/// Parses a money amount typed by the operator.
pub fn parse_money(field: &str, text: &str) -> ValidationResult<Money> {
    text.parse().map_err(|e| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: format!("{}", e),
    })
}

// =============================================================================
// Catalog
// =============================================================================

/// Checks a product snapshot before it enters the catalog.
///
/// ## Rules
/// - `id` and `name` must not be blank
/// - `doses_per_unit` ≥ 1
/// - prices must be non-negative and within [`MAX_MONEY_CENTS`]
///
/// A divisible product without a per-dose price passes: the price
/// resolver tags that case instead of rejecting it.
pub fn validate_product(product: &Product) -> ValidationResult<()> {
    if product.id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "product id".to_string(),
        });
    }

    if product.name.trim().is_empty() {
        return Err(ValidationError::Required {
            field: format!("name of product {}", product.id),
        });
    }

    if product.doses_per_unit < Quantity::ONE {
        return Err(ValidationError::TooSmall {
            field: format!("doses per unit of {}", product.name),
            min: "1".to_string(),
        });
    }

    validate_amount(&format!("sale price of {}", product.name), product.sale_price)?;

    if let Some(per_dose) = product.sale_price_per_dose {
        validate_amount(&format!("per-dose price of {}", product.name), per_dose)?;
    }

    Ok(())
}

/// Checks that both stock counters are non-negative.
pub fn validate_inventory(product: &Product, inventory: &Inventory) -> ValidationResult<()> {
    if inventory.stock_units < 0 {
        return Err(ValidationError::negative(&format!("stock units of {}", product.name)));
    }
    if inventory.stock_doses.is_negative() {
        return Err(ValidationError::negative(&format!("stock doses of {}", product.name)));
    }
    Ok(())
}

/// Validates a catalog search query.
///
/// ## Rules
/// - Can be empty (returns everything)
/// - Maximum 100 characters
///
/// ## Returns
/// The trimmed query string.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.chars().count() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Collections
// =============================================================================

/// Validates that another line fits in the cart.
pub fn validate_cart_size(current_lines: usize) -> ValidationResult<()> {
    if current_lines >= MAX_CART_LINES {
        return Err(ValidationError::TooLong {
            field: "cart".to_string(),
            max: MAX_CART_LINES,
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
