//! Catalog/cart reconciliation scenarios.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use qkart_core::{CartRecord, CatalogEntry, OrphanPolicy, Price, merge};
use qkart_integration_tests::{FOUR_STARS, Fixture, catalog_ab, product};
use qkart_storefront::backend::{InMemoryBackend, Operation};

#[tokio::test]
async fn test_single_record_scenario_totals() {
    let fx = Fixture::new(
        InMemoryBackend::new()
            .with_catalog(catalog_ab())
            .with_cart(vec![CartRecord::new("A", 2)]),
    );

    fx.sync.load_catalog().await.unwrap();
    fx.sync.load_cart(fx.token()).await.unwrap();

    let items = fx.sync.reconciled_cart();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].product_id.as_str(), "A");
    assert_eq!(items[0].quantity, 2);
    assert_eq!(items[0].name(), Some("iPhone XR"));
    assert_eq!(fx.sync.total_value(), Price::from_units(200));
    assert_eq!(fx.sync.total_quantity(), 2);
}

#[tokio::test]
async fn test_orphan_is_kept_but_costs_nothing() {
    let fx = Fixture::new(
        InMemoryBackend::new()
            .with_catalog(catalog_ab())
            .with_cart(vec![CartRecord::new("A", 1), CartRecord::new("Z", 3)]),
    );

    fx.sync.load_catalog().await.unwrap();
    fx.sync.load_cart(fx.token()).await.unwrap();

    let items = fx.sync.reconciled_cart();
    assert_eq!(items.len(), 2);
    assert!(items[0].is_resolved());
    assert!(!items[1].is_resolved());
    assert_eq!(items[1].line_total(), Price::ZERO);
    assert_eq!(fx.sync.total_value(), Price::from_units(100));
    assert_eq!(fx.sync.total_quantity(), 4);
}

#[tokio::test]
async fn test_drop_policy_omits_orphans() {
    let fx = Fixture::with_policy(
        InMemoryBackend::new()
            .with_catalog(catalog_ab())
            .with_cart(vec![CartRecord::new("Z", 3), CartRecord::new("B", 2)]),
        OrphanPolicy::Drop,
    );

    fx.sync.load_catalog().await.unwrap();
    fx.sync.load_cart(fx.token()).await.unwrap();

    let items = fx.sync.reconciled_cart();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].product_id.as_str(), "B");
    assert_eq!(fx.sync.total_quantity(), 2);
    assert_eq!(fx.sync.total_value(), Price::from_units(100));
}

#[tokio::test]
async fn test_empty_cart_totals_are_zero() {
    let fx = Fixture::new(InMemoryBackend::new().with_catalog(catalog_ab()));

    fx.sync.load_catalog().await.unwrap();
    fx.sync.load_cart(fx.token()).await.unwrap();

    let summary = fx.sync.order_summary();
    assert_eq!(summary.products, 0);
    assert_eq!(summary.subtotal, Price::ZERO);
    assert_eq!(summary.total, Price::ZERO);
    assert!(fx.sync.reconciled_cart().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_cart_arriving_first_waits_for_catalog() {
    let fx = Fixture::new(
        InMemoryBackend::new()
            .with_catalog(catalog_ab())
            .with_cart(vec![CartRecord::new("B", 1)]),
    );
    fx.backend
        .delay_next(Operation::FetchCatalog, Duration::from_millis(300));

    let (catalog, cart) = tokio::join!(fx.sync.load_catalog(), fx.sync.load_cart(fx.token()));
    catalog.unwrap();
    cart.unwrap();

    // Merged once, when the catalog landed
    assert_eq!(fx.sync.revision(), 1);
    let items = fx.sync.reconciled_cart();
    assert_eq!(items.len(), 1);
    assert!(items[0].is_resolved());
}

#[tokio::test]
async fn test_catalog_reload_resolves_orphans() {
    let fx = Fixture::new(
        InMemoryBackend::new()
            .with_catalog(catalog_ab())
            .with_cart(vec![CartRecord::new("C", 1)]),
    );
    fx.sync.load_catalog().await.unwrap();
    fx.sync.load_cart(fx.token()).await.unwrap();
    assert!(!fx.sync.reconciled_cart()[0].is_resolved());

    let mut catalog = catalog_ab();
    catalog.push(product("C", "Office Chair", "Furniture", 75, FOUR_STARS));
    fx.backend.set_catalog(catalog);
    fx.sync.load_catalog().await.unwrap();

    let items = fx.sync.reconciled_cart();
    assert!(items[0].is_resolved());
    assert_eq!(fx.sync.total_value(), Price::from_units(75));
}

#[test]
fn test_merge_backend_payloads() {
    let products = r#"[
        {"_id": "KCRwjF7lN97HnEaY", "name": "Basketball", "category": "Sports",
         "cost": 48, "rating": 5, "image": "https://crio.do/basketball.png"},
        {"_id": "BW0jAAeDJmlZCF8i", "name": "Tan Leatherette Weekender Duffle",
         "category": "Fashion", "cost": 150.5, "rating": 4, "image": "https://crio.do/duffle.png"}
    ]"#;
    let cart = r#"[
        {"productId": "BW0jAAeDJmlZCF8i", "qty": 2},
        {"productId": "KCRwjF7lN97HnEaY", "qty": 1},
        {"productId": "BW0jAAeDJmlZCF8i", "qty": 7}
    ]"#;

    let catalog: Vec<CatalogEntry> = serde_json::from_str(products).unwrap();
    let records: Vec<CartRecord> = serde_json::from_str(cart).unwrap();
    let items = merge(&records, &catalog, OrphanPolicy::Keep);

    // Duplicate record collapses to the first occurrence
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].name(), Some("Tan Leatherette Weekender Duffle"));
    assert_eq!(items[0].quantity, 2);
    assert_eq!(
        qkart_core::total_value(&items).display(),
        "$349.00".to_string()
    );
}
