//! In-memory backend.
//!
//! Behaves like the QKart REST API for a single user's cart: searches match
//! name or category case-insensitively, upserts reject unknown products, and
//! a quantity of zero removes the record. Every call is recorded, and
//! failures or response delays can be scripted per operation.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use qkart_core::{CartRecord, CatalogEntry, ProductId};
use secrecy::{ExposeSecret, SecretString};

use super::{BackendError, StorefrontBackend};

/// Backend operation, used to script failures and delays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    FetchCatalog,
    SearchCatalog,
    FetchCart,
    UpsertCartItem,
}

/// A recorded call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    FetchCatalog,
    SearchCatalog(String),
    FetchCart,
    UpsertCartItem {
        product_id: ProductId,
        quantity: u32,
    },
}

impl BackendCall {
    #[must_use]
    pub const fn operation(&self) -> Operation {
        match self {
            Self::FetchCatalog => Operation::FetchCatalog,
            Self::SearchCatalog(_) => Operation::SearchCatalog,
            Self::FetchCart => Operation::FetchCart,
            Self::UpsertCartItem { .. } => Operation::UpsertCartItem,
        }
    }
}

/// Scriptable in-memory [`StorefrontBackend`].
///
/// Cloning shares state, so a test can keep a handle while the synchronizer
/// owns another.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBackend {
    state: Arc<Mutex<MemoryState>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    catalog: Vec<CatalogEntry>,
    cart: Vec<CartRecord>,
    token: Option<String>,
    calls: Vec<BackendCall>,
    failures: HashMap<Operation, VecDeque<BackendError>>,
    delays: HashMap<Operation, VecDeque<Duration>>,
}

impl InMemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with `catalog` as the product list.
    #[must_use]
    pub fn with_catalog(self, catalog: Vec<CatalogEntry>) -> Self {
        self.lock().catalog = catalog;
        self
    }

    /// Start with `cart` as the server-side cart.
    #[must_use]
    pub fn with_cart(self, cart: Vec<CartRecord>) -> Self {
        self.lock().cart = cart;
        self
    }

    /// Only accept `token` on cart operations. Without this any token is accepted.
    #[must_use]
    pub fn with_token(self, token: &str) -> Self {
        self.lock().token = Some(token.to_string());
        self
    }

    /// Replace the product list.
    pub fn set_catalog(&self, catalog: Vec<CatalogEntry>) {
        self.lock().catalog = catalog;
    }

    /// Current server-side cart.
    #[must_use]
    pub fn cart(&self) -> Vec<CartRecord> {
        self.lock().cart.clone()
    }

    /// Make the next call to `operation` fail with `error`.
    ///
    /// Queued failures are consumed in order, one per call.
    pub fn fail_next(&self, operation: Operation, error: BackendError) {
        self.lock()
            .failures
            .entry(operation)
            .or_default()
            .push_back(error);
    }

    /// Hold back the response of the next call to `operation` by `delay`.
    ///
    /// The call's effect is applied immediately; only the response waits.
    pub fn delay_next(&self, operation: Operation, delay: Duration) {
        self.lock()
            .delays
            .entry(operation)
            .or_default()
            .push_back(delay);
    }

    /// Every call received so far, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<BackendCall> {
        self.lock().calls.clone()
    }

    /// Number of calls received for `operation`.
    #[must_use]
    pub fn call_count(&self, operation: Operation) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| call.operation() == operation)
            .count()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record `call`, apply `handler` unless a failure is scripted, and wait
    /// out any scripted delay before returning.
    async fn respond<T, F>(&self, call: BackendCall, handler: F) -> Result<T, BackendError>
    where
        F: FnOnce(&mut MemoryState) -> Result<T, BackendError>,
    {
        let operation = call.operation();
        let (result, delay) = {
            let mut state = self.lock();
            state.calls.push(call);
            let delay = state
                .delays
                .get_mut(&operation)
                .and_then(VecDeque::pop_front);
            let scripted = state
                .failures
                .get_mut(&operation)
                .and_then(VecDeque::pop_front);
            let result = match scripted {
                Some(err) => Err(err),
                None => handler(&mut *state),
            };
            (result, delay)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        result
    }
}

impl MemoryState {
    fn authorize(&self, token: &SecretString) -> Result<(), BackendError> {
        match &self.token {
            Some(expected) if expected != token.expose_secret() => Err(
                BackendError::Unauthorized("Protected route, Oauth2 Bearer token not found".to_string()),
            ),
            _ => Ok(()),
        }
    }

    fn search(&self, query: &str) -> Result<Vec<CatalogEntry>, BackendError> {
        let needle = query.trim().to_lowercase();
        let matches: Vec<CatalogEntry> = self
            .catalog
            .iter()
            .filter(|entry| {
                entry.name.to_lowercase().contains(&needle)
                    || entry.category.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect();

        if matches.is_empty() {
            return Err(BackendError::NotFound("No products found".to_string()));
        }
        Ok(matches)
    }

    fn upsert(&mut self, product_id: &ProductId, quantity: u32) -> Result<Vec<CartRecord>, BackendError> {
        if !self.catalog.iter().any(|entry| &entry.id == product_id) {
            return Err(BackendError::NotFound("Product doesn't exist".to_string()));
        }

        let existing = self.cart.iter().position(|r| &r.product_id == product_id);
        match (existing, quantity) {
            (Some(index), 0) => {
                self.cart.remove(index);
            }
            (Some(index), _) => {
                if let Some(record) = self.cart.get_mut(index) {
                    record.quantity = quantity;
                }
            }
            (None, 0) => {}
            (None, _) => self.cart.push(CartRecord::new(product_id.clone(), quantity)),
        }
        Ok(self.cart.clone())
    }
}

impl StorefrontBackend for InMemoryBackend {
    async fn fetch_catalog(&self) -> Result<Vec<CatalogEntry>, BackendError> {
        self.respond(BackendCall::FetchCatalog, |state| Ok(state.catalog.clone()))
            .await
    }

    async fn search_catalog(&self, query: &str) -> Result<Vec<CatalogEntry>, BackendError> {
        self.respond(BackendCall::SearchCatalog(query.to_string()), |state| {
            state.search(query)
        })
        .await
    }

    async fn fetch_cart(&self, token: &SecretString) -> Result<Vec<CartRecord>, BackendError> {
        self.respond(BackendCall::FetchCart, |state| {
            state.authorize(token)?;
            Ok(state.cart.clone())
        })
        .await
    }

    async fn upsert_cart_item(
        &self,
        token: &SecretString,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<Vec<CartRecord>, BackendError> {
        let call = BackendCall::UpsertCartItem {
            product_id: product_id.clone(),
            quantity,
        };
        self.respond(call, |state| {
            state.authorize(token)?;
            state.upsert(product_id, quantity)
        })
        .await
    }
}
