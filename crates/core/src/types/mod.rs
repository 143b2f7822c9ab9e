//! Domain types for QKart.
//!
//! This module provides type-safe wrappers for catalog and cart concepts.

pub mod cart;
pub mod catalog;
pub mod id;
pub mod price;
pub mod rating;

pub use cart::{CartRecord, LineItem};
pub use catalog::{CatalogEntry, CatalogIndex};
pub use id::*;
pub use price::Price;
pub use rating::{Rating, RatingError};
