//! Joining cart records against the catalog.

use std::collections::HashSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::{CartRecord, CatalogEntry, CatalogIndex, LineItem};

/// What to do with a cart record whose product is not in the catalog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrphanPolicy {
    /// Emit an unresolved [`LineItem`] carrying only the ID and quantity.
    #[default]
    Keep,
    /// Leave the record out of the reconciled cart.
    Drop,
}

impl FromStr for OrphanPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keep" => Ok(Self::Keep),
            "drop" => Ok(Self::Drop),
            other => Err(format!("expected `keep` or `drop`, got `{other}`")),
        }
    }
}

/// Merge cart records with the catalog into display-ready line items.
///
/// Output follows `records` order. A repeated product ID keeps its first
/// record only. Records with no catalog entry are handled per `policy`.
///
/// Builds a fresh [`CatalogIndex`]; use [`merge_indexed`] when an index for
/// `catalog` is already at hand.
#[must_use]
pub fn merge(
    records: &[CartRecord],
    catalog: &[CatalogEntry],
    policy: OrphanPolicy,
) -> Vec<LineItem> {
    merge_indexed(records, catalog, &CatalogIndex::build(catalog), policy)
}

/// [`merge`] with a prebuilt index.
///
/// `index` must have been built from `catalog`.
#[must_use]
pub fn merge_indexed(
    records: &[CartRecord],
    catalog: &[CatalogEntry],
    index: &CatalogIndex,
    policy: OrphanPolicy,
) -> Vec<LineItem> {
    let mut seen = HashSet::with_capacity(records.len());
    let mut items = Vec::with_capacity(records.len());

    for record in records {
        if !seen.insert(&record.product_id) {
            tracing::debug!(
                product_id = %record.product_id,
                "skipping duplicate cart record"
            );
            continue;
        }

        match index.get(catalog, &record.product_id) {
            Some(entry) => items.push(LineItem::resolved(record, entry)),
            None => match policy {
                OrphanPolicy::Keep => items.push(LineItem::unresolved(record)),
                OrphanPolicy::Drop => {
                    tracing::debug!(
                        product_id = %record.product_id,
                        "dropping cart record with no catalog entry"
                    );
                }
            },
        }
    }

    items
}
