//! QKart Core - Cart and catalog domain library.
//!
//! This crate provides the types and pure logic shared by the QKart components:
//! - `storefront` - Cart synchronizer, search debouncer and backend client
//! - `cli` - Command-line driver for a live backend
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no async runtime. Everything here is deterministic and can be
//! tested without a backend.
//!
//! # Modules
//!
//! - [`types`] - IDs, prices, ratings, catalog entries, cart records, line items
//! - [`merge`] - Joining cart records against the catalog
//! - [`totals`] - Quantity and monetary totals, order summary
//! - [`notice`] - User-facing notices and sinks

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod merge;
pub mod notice;
pub mod totals;
pub mod types;

pub use merge::{OrphanPolicy, merge, merge_indexed};
pub use notice::{CollectingSink, Notice, NoticeSink, Severity};
pub use totals::{OrderSummary, total_quantity, total_value};
pub use types::*;
