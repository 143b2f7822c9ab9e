//! Engine error taxonomy.
//!
//! Every failed synchronizer operation ends in a [`SyncError`], and every
//! `SyncError` maps to exactly one user-facing [`Notice`]. None are fatal:
//! state is left as it was and the user can simply retry.

use qkart_core::Notice;
use thiserror::Error;

use crate::backend::BackendError;

/// Shown when adding or updating requires a logged-in user.
pub const LOGIN_REQUIRED: &str = "Login to add an item to the Cart";
/// Shown when the cart cannot be fetched because the login was rejected.
pub const LOGIN_TO_VIEW_CART: &str = "Login again to view your cart";
/// Shown when a product already in the cart is added again.
pub const ALREADY_IN_CART: &str =
    "Item already in cart. Use the cart sidebar to update quantity or remove item";
/// Shown when a search matches nothing.
pub const NO_PRODUCTS_FOUND: &str = "No products found";
/// Shown when the catalog or a search cannot be fetched.
pub const SOMETHING_WENT_WRONG: &str =
    "Something went wrong. Check the backend console for more details";
/// Shown when the cart cannot be loaded.
pub const CART_UNAVAILABLE: &str = "Could not fetch cart details. Check that the backend is running, reachable and returns valid JSON.";
/// Shown when a cart update fails.
pub const UPDATE_FAILED: &str = "Something went wrong";

/// Errors surfaced by the cart synchronizer.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The request was refused locally (e.g. duplicate add).
    #[error("Validation failed: {0}")]
    Validation(String),

    /// No auth token was supplied, or the backend rejected it. Carries the
    /// login prompt for the operation that failed.
    #[error("Authentication required")]
    AuthRequired(&'static str),

    /// Nothing matched: an empty search, or a mutation on an unknown product.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The backend was unreachable, returned garbage, or failed.
    #[error("Backend unavailable: {0}")]
    TransientFault(String),
}

impl SyncError {
    /// Classify a backend failure.
    ///
    /// `fallback` is the message shown when the backend gave nothing the user
    /// can act on.
    #[must_use]
    pub fn from_backend(err: BackendError, fallback: &str) -> Self {
        match err {
            BackendError::NotFound(message) => Self::NotFound(message),
            BackendError::Unauthorized(_) => Self::AuthRequired(LOGIN_REQUIRED),
            // A 400 carries a message written for the user
            BackendError::Rejected(message) => Self::TransientFault(message),
            BackendError::Http(_)
            | BackendError::Parse(_)
            | BackendError::Status { .. }
            | BackendError::InvalidUrl(_) => Self::TransientFault(fallback.to_string()),
        }
    }

    /// The notice to show the user for this error.
    #[must_use]
    pub fn notice(&self) -> Notice {
        match self {
            Self::Validation(message) => Notice::warning(message.clone()),
            Self::AuthRequired(prompt) => Notice::warning(*prompt),
            Self::NotFound(message) | Self::TransientFault(message) => {
                Notice::error(message.clone())
            }
        }
    }
}
