//! QKart CLI - Drive the storefront engine against a live backend.
//!
//! # Usage
//!
//! ```bash
//! # List the catalog
//! qkart products
//!
//! # Search; each argument is fed to the debouncer as a keystroke
//! qkart search smart phone
//!
//! # Show the cart and order summary
//! qkart cart
//!
//! # Add a product, or set its quantity (0 removes it)
//! qkart add KCRwjF7lN97HnEaY
//! qkart set-qty KCRwjF7lN97HnEaY 3
//! ```
//!
//! # Environment Variables
//!
//! - `QKART_API_URL` - Backend base URL (required)
//! - `QKART_AUTH_TOKEN` - Bearer token for cart commands
//! - `RUST_LOG` - Log filter (default `qkart_storefront=info,qkart_cli=info`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use clap::{Parser, Subcommand};
use qkart_core::ProductId;
use qkart_storefront::{CartSynchronizer, HttpBackend, StorefrontConfig, TracingSink};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "qkart")]
#[command(author, version, about = "QKart storefront client")]
struct Cli {
    /// Emit logs as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every product in the catalog
    Products,
    /// Search the catalog
    Search {
        /// Search input, one keystroke burst per argument
        #[arg(required = true)]
        query: Vec<String>,
    },
    /// Show the cart with its order summary
    Cart,
    /// Add one unit of a product to the cart
    Add {
        /// Product ID
        product_id: String,
    },
    /// Set the quantity of a product in the cart
    SetQty {
        /// Product ID
        product_id: String,

        /// New quantity; 0 removes the product
        quantity: u32,
    },
}

fn init_tracing(json: bool) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "qkart_storefront=info,qkart_cli=info".into());

    let json_layer = json.then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (!json).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.json);

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = StorefrontConfig::from_env()?;
    tracing::debug!(?config, "configuration loaded");

    let backend = HttpBackend::new(&config)?;
    let sync = CartSynchronizer::from_config(backend, &config, Arc::new(TracingSink));
    let token = config.auth_token.as_ref();

    match cli.command {
        Commands::Products => commands::catalog::products(&sync).await?,
        Commands::Search { query } => commands::catalog::search(&sync, &query).await?,
        Commands::Cart => commands::cart::show(&sync, token).await?,
        Commands::Add { product_id } => {
            commands::cart::add(&sync, token, &ProductId::new(product_id)).await?;
        }
        Commands::SetQty {
            product_id,
            quantity,
        } => {
            commands::cart::set_quantity(&sync, token, &ProductId::new(product_id), quantity)
                .await?;
        }
    }
    Ok(())
}
