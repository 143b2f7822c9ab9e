//! Backend operations consumed by the cart synchronizer.
//!
//! # Architecture
//!
//! - The backend is the source of truth for cart quantities; the engine never
//!   patches cart records locally, it replaces them with whatever the backend
//!   returns
//! - [`StorefrontBackend`] is the seam between the engine and the transport
//! - [`HttpBackend`] talks to the QKart REST API with `reqwest`
//! - `InMemoryBackend` is a scriptable double for tests, built with the
//!   `test-support` feature
//!
//! # Endpoints
//!
//! | operation | request |
//! |---|---|
//! | [`fetch_catalog`](StorefrontBackend::fetch_catalog) | `GET /products` |
//! | [`search_catalog`](StorefrontBackend::search_catalog) | `GET /products/search?value=<query>` |
//! | [`fetch_cart`](StorefrontBackend::fetch_cart) | `GET /cart` with bearer token |
//! | [`upsert_cart_item`](StorefrontBackend::upsert_cart_item) | `POST /cart` `{"productId","qty"}` with bearer token |

mod http;
#[cfg(any(test, feature = "test-support"))]
mod memory;

pub use http::HttpBackend;
#[cfg(any(test, feature = "test-support"))]
pub use memory::{BackendCall, InMemoryBackend, Operation};

use std::future::Future;

use qkart_core::{CartRecord, CatalogEntry, ProductId};
use secrecy::SecretString;
use thiserror::Error;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed (connection refused, timeout, TLS, ...).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not the expected JSON.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Nothing matched (HTTP 404, or an empty search result).
    #[error("Not found: {0}")]
    NotFound(String),

    /// The bearer token was missing or rejected (HTTP 401).
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The backend refused the request with a message for the user (HTTP 400).
    #[error("Rejected: {0}")]
    Rejected(String),

    /// Any other non-success status.
    #[error("HTTP {status}: {message}")]
    Status {
        /// Response status code.
        status: u16,
        /// Message from the error body, or a truncated raw body.
        message: String,
    },

    /// The configured base URL cannot have endpoint paths appended.
    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),
}

/// Operations the engine needs from a QKart backend.
///
/// Implementations must be cheap to share: the synchronizer calls them from
/// concurrent tasks through `&self`.
pub trait StorefrontBackend: Send + Sync + 'static {
    /// Fetch the full product catalog.
    fn fetch_catalog(
        &self,
    ) -> impl Future<Output = Result<Vec<CatalogEntry>, BackendError>> + Send;

    /// Search the catalog by name or category.
    ///
    /// An empty result is reported as [`BackendError::NotFound`].
    fn search_catalog(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<Vec<CatalogEntry>, BackendError>> + Send;

    /// Fetch the cart of the user owning `token`.
    fn fetch_cart(
        &self,
        token: &SecretString,
    ) -> impl Future<Output = Result<Vec<CartRecord>, BackendError>> + Send;

    /// Set the quantity of `product_id` in the cart; zero removes it.
    ///
    /// Returns the full cart after the change.
    fn upsert_cart_item(
        &self,
        token: &SecretString,
        product_id: &ProductId,
        quantity: u32,
    ) -> impl Future<Output = Result<Vec<CartRecord>, BackendError>> + Send;
}
