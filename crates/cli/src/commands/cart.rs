//! Cart display and mutation.

use qkart_core::ProductId;
use secrecy::SecretString;
use tracing::{info, warn};

use super::{CommandError, Storefront};

fn require_token(token: Option<&SecretString>) -> Result<&SecretString, CommandError> {
    token.ok_or(CommandError::MissingToken)
}

/// Load catalog and cart together. The merge waits for both.
async fn load(sync: &Storefront, token: &SecretString) -> Result<(), CommandError> {
    let (catalog, cart) = tokio::join!(sync.load_catalog(), sync.load_cart(Some(token)));
    catalog?;
    cart?;
    Ok(())
}

/// Show the reconciled cart and its order summary.
pub async fn show(sync: &Storefront, token: Option<&SecretString>) -> Result<(), CommandError> {
    let token = require_token(token)?;
    load(sync, token).await?;
    print_cart(sync);
    Ok(())
}

/// Add one unit of `product_id`. Refused if it is already in the cart.
pub async fn add(
    sync: &Storefront,
    token: Option<&SecretString>,
    product_id: &ProductId,
) -> Result<(), CommandError> {
    let token = require_token(token)?;
    // The duplicate check needs the current cart
    load(sync, token).await?;
    sync.add_product(Some(token), product_id).await?;
    print_cart(sync);
    Ok(())
}

/// Set the quantity of `product_id`; 0 removes it.
pub async fn set_quantity(
    sync: &Storefront,
    token: Option<&SecretString>,
    product_id: &ProductId,
    quantity: u32,
) -> Result<(), CommandError> {
    let token = require_token(token)?;
    sync.load_catalog().await?;
    sync.set_quantity(Some(token), product_id, quantity).await?;
    print_cart(sync);
    Ok(())
}

fn print_cart(sync: &Storefront) {
    let items = sync.reconciled_cart();
    if items.is_empty() {
        info!("Cart is empty");
        return;
    }

    for item in &items {
        match item.name() {
            Some(name) => info!(
                product_id = %item.product_id,
                "{name} x{} = {}",
                item.quantity,
                item.line_total().display()
            ),
            None => warn!(
                product_id = %item.product_id,
                quantity = item.quantity,
                "product no longer in catalog"
            ),
        }
    }

    let summary = sync.order_summary();
    info!(
        products = summary.products,
        subtotal = %summary.subtotal.display(),
        shipping = %summary.shipping.display(),
        "Total {}",
        summary.total.display()
    );
}
