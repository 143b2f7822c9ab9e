//! Catalog listing and search.

use qkart_storefront::error::NO_PRODUCTS_FOUND;
use qkart_storefront::{SearchOutcome, SyncError};
use tracing::info;

use super::{CommandError, Storefront};

/// Load the full catalog and list it.
pub async fn products(sync: &Storefront) -> Result<(), CommandError> {
    sync.load_catalog().await?;
    print_catalog(sync);
    Ok(())
}

/// Type `words` into the search box one at a time, then wait for the
/// debounced search to land.
///
/// `qkart search smart phone` submits "smart" then "smart phone"; only the
/// last input reaches the backend.
pub async fn search(sync: &Storefront, words: &[String]) -> Result<(), CommandError> {
    let mut query = String::new();
    for word in words {
        if !query.is_empty() {
            query.push(' ');
        }
        query.push_str(word);
        sync.submit_search(query.as_str());
    }

    match sync.settle_search().await {
        Ok(SearchOutcome::Applied { .. }) => print_catalog(sync),
        Ok(SearchOutcome::Idle | SearchOutcome::Superseded) => {}
        // Already reported as a notice
        Err(SyncError::NotFound(message)) if message == NO_PRODUCTS_FOUND => {}
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

fn print_catalog(sync: &Storefront) {
    for entry in sync.catalog() {
        info!(
            id = %entry.id,
            category = %entry.category,
            rating = entry.rating.stars(),
            "{} {}",
            entry.name,
            entry.unit_cost.display()
        );
    }
}
