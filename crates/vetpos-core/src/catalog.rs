//! # Catalog Snapshot
//!
//! Read-only index of the products-with-inventory list last fetched from
//! the backend. Replaced wholesale on refresh, never patched in place.

use std::collections::HashMap;

use crate::types::CatalogEntry;
use crate::validation::{validate_search_query, ValidationResult};

/// Products joined with inventory, keyed by product id.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: HashMap<String, CatalogEntry>,
    /// Backend order, for stable listings.
    order: Vec<String>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a catalog from fetched entries. A later duplicate id replaces
    /// the earlier one.
    pub fn from_entries(entries: impl IntoIterator<Item = CatalogEntry>) -> Self {
        let mut catalog = Catalog::new();
        for entry in entries {
            let id = entry.id().to_string();
            if catalog.entries.insert(id.clone(), entry).is_none() {
                catalog.order.push(id);
            }
        }
        catalog
    }

    pub fn get(&self, product_id: &str) -> Option<&CatalogEntry> {
        self.entries.get(product_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in backend order.
    pub fn entries(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.order.iter().filter_map(|id| self.entries.get(id))
    }

    /// Case-insensitive match on name or category. An empty query lists
    /// everything.
    ///
    /// ## Example
    /// ```rust
    /// use vetpos_core::catalog::Catalog;
    ///
    /// let catalog = Catalog::new();
    /// assert!(catalog.search("melox").unwrap().is_empty());
    /// assert!(catalog.search(&"x".repeat(200)).is_err());
    /// ```
    pub fn search(&self, query: &str) -> ValidationResult<Vec<&CatalogEntry>> {
        let needle = validate_search_query(query)?.to_lowercase();

        Ok(self
            .entries()
            .filter(|entry| {
                needle.is_empty()
                    || entry.product.name.to_lowercase().contains(&needle)
                    || entry
                        .product
                        .category
                        .as_deref()
                        .is_some_and(|c| c.to_lowercase().contains(&needle))
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stock::tests::divisible_product;
    use crate::types::Inventory;
    use crate::Quantity;

    fn sample_catalog() -> Catalog {
        let melox = divisible_product();

        let mut vaccine = divisible_product();
        vaccine.id = "rabies".to_string();
        vaccine.name = "Rabies Vaccine".to_string();
        vaccine.category = Some("Vaccines".to_string());
        vaccine.divisible = false;
        vaccine.sale_price_per_dose = None;

        Catalog::from_entries(vec![
            CatalogEntry::new(melox, Some(Inventory::new(1, Quantity::from_whole(3)))),
            CatalogEntry::new(vaccine, None),
        ])
    }

    #[test]
    fn test_lookup_and_order() {
        let catalog = sample_catalog();
        assert_eq!(catalog.len(), 2);
        assert!(catalog.get("melox").is_some());
        assert!(catalog.get("missing").is_none());

        let ids: Vec<&str> = catalog.entries().map(|e| e.id()).collect();
        assert_eq!(ids, vec!["melox", "rabies"]);
    }

    #[test]
    fn test_search_by_name_and_category() {
        let catalog = sample_catalog();
        assert_eq!(catalog.search("MELOX").unwrap().len(), 1);
        assert_eq!(catalog.search("vacc").unwrap()[0].id(), "rabies");
        assert_eq!(catalog.search("nsaid").unwrap()[0].id(), "melox");
        assert_eq!(catalog.search("").unwrap().len(), 2);
        assert!(catalog.search("insulin").unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_ids_keep_latest() {
        let first = divisible_product();
        let mut second = divisible_product();
        second.name = "Meloxicam (new label)".to_string();

        let catalog = Catalog::from_entries(vec![
            CatalogEntry::new(first, None),
            CatalogEntry::new(second, None),
        ]);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("melox").unwrap().product.name, "Meloxicam (new label)");
    }
}
