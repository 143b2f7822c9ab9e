//! QKart Storefront library.
//!
//! The client-side engine of the storefront: it keeps a user's cart in step
//! with the QKart REST backend, joins cart records against the catalog, and
//! coalesces search input before it reaches the network.
//!
//! # Modules
//!
//! - [`backend`] - The [`StorefrontBackend`] seam, an HTTP client and an in-memory double
//! - [`config`] - Environment configuration
//! - [`error`] - Engine errors and user-facing messages
//! - [`notify`] - Notice delivery through `tracing`
//! - [`search`] - Search debouncing and clocks
//! - [`sync`] - The cart synchronizer

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod config;
pub mod error;
pub mod notify;
pub mod search;
pub mod sync;

pub use backend::{BackendError, HttpBackend, StorefrontBackend};
#[cfg(any(test, feature = "test-support"))]
pub use backend::InMemoryBackend;
pub use config::{ConfigError, StorefrontConfig};
pub use error::SyncError;
pub use notify::TracingSink;
pub use sync::{CartSynchronizer, SearchOutcome, SynchronizerBuilder};
