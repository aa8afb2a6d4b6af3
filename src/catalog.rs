use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ============================================================================
// Product Catalog - immutable list of purchasable care supplies
// ============================================================================
//
// Supplied once at startup by the backend and never mutated afterwards.
// Everything price related (budget, increment admission) reads through here.
//
// ============================================================================

/// Catalog id of the one item that requires a size selection.
pub const GLOVES_ID: &str = "gloves";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub meta: String,
    pub price: Decimal,

    // Optional billing metadata, passed through untouched
    #[serde(default, rename = "pos", skip_serializing_if = "Option::is_none")]
    pub position_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factor: Option<u32>,
    #[serde(default)]
    pub has_size: bool,
}

impl CatalogItem {
    pub fn new(id: impl Into<String>, name: impl Into<String>, meta: impl Into<String>, price: Decimal) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            meta: meta.into(),
            price,
            position_number: None,
            unit: None,
            factor: None,
            has_size: false,
        }
    }

    pub fn is_gloves(&self) -> bool {
        self.id == GLOVES_ID
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Catalog contains no products")]
    Empty,

    #[error("Duplicate catalog id: {0}")]
    DuplicateId(String),

    #[error("Negative price {price} for catalog id {id}")]
    NegativePrice { id: String, price: Decimal },
}

/// Validated, id-indexed catalog. Keeps the backend's listing order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    items: Vec<CatalogItem>,
    index: HashMap<String, usize>,
}

impl Catalog {
    /// Build a catalog, refusing anything that is not usable as a whole.
    pub fn new(items: Vec<CatalogItem>) -> Result<Self, CatalogError> {
        if items.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut index = HashMap::with_capacity(items.len());
        for (position, item) in items.iter().enumerate() {
            if item.price < Decimal::ZERO {
                return Err(CatalogError::NegativePrice {
                    id: item.id.clone(),
                    price: item.price,
                });
            }
            if index.insert(item.id.clone(), position).is_some() {
                return Err(CatalogError::DuplicateId(item.id.clone()));
            }
        }

        Ok(Self { items, index })
    }

    pub fn get(&self, id: &str) -> Option<&CatalogItem> {
        self.index.get(id).map(|&position| &self.items[position])
    }

    pub fn price_of(&self, id: &str) -> Option<Decimal> {
        self.get(id).map(|item| item.price)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Response body of the product listing endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogListing {
    pub products: Vec<CatalogItem>,
}

// ============================================================================
// Unit Tests
// ============================================================================
