//! Aggregate totals over a reconciled cart.

use serde::Serialize;

use crate::types::{LineItem, Price};

/// Sum of quantities across all line items, resolved or not.
#[must_use]
pub fn total_quantity(items: &[LineItem]) -> u64 {
    items.iter().map(|item| u64::from(item.quantity)).sum()
}

/// Sum of `quantity × unit_cost` across all line items.
///
/// Unresolved items contribute zero.
#[must_use]
pub fn total_value(items: &[LineItem]) -> Price {
    items.iter().map(LineItem::line_total).sum()
}

/// Figures shown by the checkout order details panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrderSummary {
    /// Total number of units in the cart.
    pub products: u64,
    pub subtotal: Price,
    /// Always zero; the store does not charge for shipping.
    pub shipping: Price,
    pub total: Price,
}

impl OrderSummary {
    #[must_use]
    pub fn from_items(items: &[LineItem]) -> Self {
        let subtotal = total_value(items);
        let shipping = Price::ZERO;
        Self {
            products: total_quantity(items),
            subtotal,
            shipping,
            total: subtotal + shipping,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::merge::{OrphanPolicy, merge};
    use crate::types::{CartRecord, CatalogEntry, ProductId, Rating};
    use proptest::prelude::*;
    use rust_decimal::Decimal;

    fn entry(id: &str, cost: Price) -> CatalogEntry {
        CatalogEntry {
            id: ProductId::new(id),
            name: id.to_owned(),
            category: "Misc".to_owned(),
            unit_cost: cost,
            rating: Rating::new(5).unwrap(),
            image_url: String::new(),
        }
    }

    #[test]
    fn test_totals_of_empty_cart() {
        assert_eq!(total_quantity(&[]), 0);
        assert_eq!(total_value(&[]), Price::ZERO);
    }

    #[test]
    fn test_totals_sum_over_items() {
        let catalog = vec![
            entry("A", Price::from_units(100)),
            entry("B", Price::from_units(50)),
        ];
        let records = vec![CartRecord::new("A", 1), CartRecord::new("B", 2)];
        let items = merge(&records, &catalog, OrphanPolicy::Keep);

        assert_eq!(total_quantity(&items), 3);
        assert_eq!(total_value(&items), Price::from_units(200));
    }

    #[test]
    fn test_unresolved_items_count_quantity_but_not_value() {
        let catalog = vec![entry("A", Price::from_units(100))];
        let records = vec![CartRecord::new("A", 1), CartRecord::new("Z", 9)];
        let items = merge(&records, &catalog, OrphanPolicy::Keep);

        assert_eq!(total_quantity(&items), 10);
        assert_eq!(total_value(&items), Price::from_units(100));
    }

    #[test]
    fn test_fractional_costs_do_not_drift() {
        let catalog = vec![entry("A", Price::new(Decimal::new(10, 2)))];
        let records = vec![CartRecord::new("A", 3)];
        let items = merge(&records, &catalog, OrphanPolicy::Keep);

        assert_eq!(total_value(&items), Price::new(Decimal::new(30, 2)));
    }

    #[test]
    fn test_order_summary() {
        let catalog = vec![entry("A", Price::from_units(100))];
        let items = merge(&[CartRecord::new("A", 2)], &catalog, OrphanPolicy::Keep);
        let summary = OrderSummary::from_items(&items);

        assert_eq!(summary.products, 2);
        assert_eq!(summary.subtotal, Price::from_units(200));
        assert_eq!(summary.shipping, Price::ZERO);
        assert_eq!(summary.total, Price::from_units(200));
    }

    fn cost_strategy() -> impl Strategy<Value = Price> {
        (0i64..100_000).prop_map(|cents| Price::new(Decimal::new(cents, 2)))
    }

    proptest! {
        #[test]
        fn prop_total_value_sums_matched_records(
            costs in prop::collection::vec(cost_strategy(), 0..8),
            records in prop::collection::vec((0usize..12, 0u32..50), 0..16),
            keep in any::<bool>(),
        ) {
            let catalog: Vec<_> = costs
                .iter()
                .enumerate()
                .map(|(n, cost)| entry(&format!("P{n}"), *cost))
                .collect();
            let records: Vec<_> = records
                .iter()
                .map(|(n, quantity)| CartRecord::new(format!("P{n}"), *quantity))
                .collect();
            let policy = if keep { OrphanPolicy::Keep } else { OrphanPolicy::Drop };
            let items = merge(&records, &catalog, policy);

            let expected: Decimal = items
                .iter()
                .filter_map(|item| {
                    let n: usize = item.product_id.as_str().trim_start_matches('P').parse().ok()?;
                    costs.get(n).map(|cost| cost.amount() * Decimal::from(item.quantity))
                })
                .sum();
            prop_assert_eq!(total_value(&items).amount(), expected);

            let unresolved: Vec<_> = items.iter().filter(|i| !i.is_resolved()).cloned().collect();
            prop_assert_eq!(total_value(&unresolved), Price::ZERO);

            let quantity: u64 = items.iter().map(|i| u64::from(i.quantity)).sum();
            prop_assert_eq!(total_quantity(&items), quantity);
        }
    }
}
