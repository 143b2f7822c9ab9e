//! Scenario tests for the QKart storefront engine.
//!
//! Every test drives a [`CartSynchronizer`] over an [`InMemoryBackend`], so
//! nothing here needs a running server.
//!
//! # Test Categories
//!
//! - `reconciliation` - Catalog/cart merge, totals and orphan handling
//! - `cart_mutations` - Adds, quantity changes and failure handling
//! - `search` - Debounced search against virtual time
//!
//! This crate holds the shared fixtures.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use qkart_core::{CatalogEntry, CollectingSink, OrphanPolicy, Price, ProductId, Rating};
use qkart_storefront::backend::InMemoryBackend;
use qkart_storefront::search::ManualClock;
use qkart_storefront::CartSynchronizer;
use secrecy::SecretString;

/// Token accepted by [`Fixture`] backends.
pub const TOKEN: &str = "test-token";

// Only used in consts, so a bad value fails the build
const fn stars(n: u8) -> Rating {
    match Rating::new(n) {
        Ok(rating) => rating,
        Err(_) => panic!("fixture rating out of range"),
    }
}

pub const FOUR_STARS: Rating = stars(4);
pub const FIVE_STARS: Rating = stars(5);

/// A catalog entry with a whole-unit price.
#[must_use]
pub fn product(id: &str, name: &str, category: &str, cost: i64, rating: Rating) -> CatalogEntry {
    CatalogEntry {
        id: ProductId::new(id),
        name: name.to_owned(),
        category: category.to_owned(),
        unit_cost: Price::from_units(cost),
        rating,
        image_url: format!("https://cdn.example.com/{id}.png"),
    }
}

/// Catalog with A (cost 100) and B (cost 50).
#[must_use]
pub fn catalog_ab() -> Vec<CatalogEntry> {
    vec![
        product("A", "iPhone XR", "Phones", 100, FOUR_STARS),
        product("B", "Basketball", "Sports", 50, FIVE_STARS),
    ]
}

/// A synchronizer wired to an in-memory backend, a collecting sink and a
/// manual clock.
pub struct Fixture {
    pub sync: CartSynchronizer<InMemoryBackend>,
    pub backend: InMemoryBackend,
    pub notices: CollectingSink,
    pub clock: ManualClock,
    pub token: SecretString,
}

impl Fixture {
    /// Fixture over `backend` with the default orphan policy.
    #[must_use]
    pub fn new(backend: InMemoryBackend) -> Self {
        Self::with_policy(backend, OrphanPolicy::default())
    }

    /// Fixture over `backend` with `policy` for unmatched cart records.
    #[must_use]
    pub fn with_policy(backend: InMemoryBackend, policy: OrphanPolicy) -> Self {
        let backend = backend.with_token(TOKEN);
        let notices = CollectingSink::new();
        let clock = ManualClock::new();
        let sync = CartSynchronizer::builder(backend.clone())
            .notices(Arc::new(notices.clone()))
            .clock(Arc::new(clock.clone()))
            .orphan_policy(policy)
            .build();

        Self {
            sync,
            backend,
            notices,
            clock,
            token: SecretString::from(TOKEN),
        }
    }

    /// The fixture's token, as the synchronizer takes it.
    #[must_use]
    pub const fn token(&self) -> Option<&SecretString> {
        Some(&self.token)
    }
}
