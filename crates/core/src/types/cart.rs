//! Cart record and line item types.
//!
//! The server owns a list of [`CartRecord`]s. A [`LineItem`] is what the
//! display layer renders: a record joined with the catalog entry it refers to.

use serde::{Deserialize, Serialize};

use super::{CatalogEntry, Price, ProductId};

/// Server-authoritative fact that the user holds `quantity` of a product.
///
/// Wire format: `{ "productId": "KCRwjF7lN97HnEaY", "qty": 3 }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartRecord {
    /// Product this record refers to.
    #[serde(rename = "productId")]
    pub product_id: ProductId,
    /// Quantity held. Zero is a removal request when sent to the server.
    #[serde(rename = "qty")]
    pub quantity: u32,
}

impl CartRecord {
    /// Create a cart record.
    #[must_use]
    pub fn new(product_id: impl Into<ProductId>, quantity: u32) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// A cart record joined with its catalog entry.
///
/// `product` is `None` when the catalog has no entry for `product_id`. Such an
/// item is "unresolved": it still carries its quantity but contributes nothing
/// to the monetary total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineItem {
    pub product_id: ProductId,
    pub quantity: u32,
    pub product: Option<CatalogEntry>,
}

impl LineItem {
    /// Join a record with its catalog entry. The record's quantity wins.
    #[must_use]
    pub fn resolved(record: &CartRecord, product: &CatalogEntry) -> Self {
        Self {
            product_id: record.product_id.clone(),
            quantity: record.quantity,
            product: Some(product.clone()),
        }
    }

    /// A line item for a record with no catalog entry.
    #[must_use]
    pub fn unresolved(record: &CartRecord) -> Self {
        Self {
            product_id: record.product_id.clone(),
            quantity: record.quantity,
            product: None,
        }
    }

    /// Whether the catalog entry was found.
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        self.product.is_some()
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.product.as_ref().map(|p| p.name.as_str())
    }

    #[must_use]
    pub fn unit_cost(&self) -> Option<Price> {
        self.product.as_ref().map(|p| p.unit_cost)
    }

    /// `quantity × unit_cost`, or zero when unresolved.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_cost()
            .map_or(Price::ZERO, |cost| cost.times(self.quantity))
    }
}
