//! Subcommand implementations.

pub mod cart;
pub mod catalog;

use qkart_storefront::{CartSynchronizer, HttpBackend, SyncError};
use thiserror::Error;

/// The synchronizer every command runs against.
pub type Storefront = CartSynchronizer<HttpBackend>;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Cart commands need a bearer token.
    #[error("QKART_AUTH_TOKEN must be set for cart commands")]
    MissingToken,

    /// The engine reported a failure (already shown as a notice).
    #[error(transparent)]
    Sync(#[from] SyncError),
}
