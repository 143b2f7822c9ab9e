//! Catalog entry types.
//!
//! A catalog is the full product list returned by `GET /products`, or the
//! filtered list returned by a search. It is always replaced wholesale, never
//! patched, so [`CatalogIndex`] is rebuilt alongside every replacement.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{Price, ProductId, Rating};

/// A product as listed by the backend.
///
/// Field names follow the backend's wire format:
///
/// ```json
/// {
///     "name": "iPhone XR",
///     "category": "Phones",
///     "cost": 100,
///     "rating": 4,
///     "image": "https://i.imgur.com/lulqWzW.jpg",
///     "_id": "v4sLtEcMpzabRyfx"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Unique product ID.
    #[serde(rename = "_id")]
    pub id: ProductId,
    /// Product name or title.
    pub name: String,
    /// Category the product belongs to.
    pub category: String,
    /// Price of a single unit.
    #[serde(rename = "cost")]
    pub unit_cost: Price,
    /// Aggregate rating out of five.
    pub rating: Rating,
    /// Product image URL.
    #[serde(rename = "image")]
    pub image_url: String,
}

/// Keyed lookup from product ID to catalog entry.
///
/// Built once per catalog replacement so that joining `n` cart records against
/// `m` catalog entries costs `O(n + m)` instead of `O(n * m)`.
#[derive(Debug, Clone, Default)]
pub struct CatalogIndex {
    positions: HashMap<ProductId, usize>,
}

impl CatalogIndex {
    /// Build an index over `catalog`.
    ///
    /// If the catalog lists the same ID twice, the first entry wins, matching
    /// what a linear scan would find.
    #[must_use]
    pub fn build(catalog: &[CatalogEntry]) -> Self {
        let mut positions = HashMap::with_capacity(catalog.len());
        for (position, entry) in catalog.iter().enumerate() {
            positions.entry(entry.id.clone()).or_insert(position);
        }
        Self { positions }
    }

    /// Look up `id` in the catalog this index was built from.
    ///
    /// `catalog` must be the same slice passed to [`CatalogIndex::build`].
    #[must_use]
    pub fn get<'a>(&self, catalog: &'a [CatalogEntry], id: &ProductId) -> Option<&'a CatalogEntry> {
        self.positions
            .get(id)
            .and_then(|&position| catalog.get(position))
    }

    /// Whether `id` is present.
    #[must_use]
    pub fn contains(&self, id: &ProductId) -> bool {
        self.positions.contains_key(id)
    }

    /// Number of distinct product IDs indexed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether the index is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
