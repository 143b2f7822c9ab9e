//! Cart synchronizer.
//!
//! [`CartSynchronizer`] owns the catalog, the server's cart records and the
//! reconciled cart built from them. The reconciled cart is always recomputed
//! from scratch, and only once both inputs have landed at least once, so a
//! cart that arrives before the catalog never shows up as a list of
//! unresolved items.
//!
//! State sits behind a mutex that is released before every backend call.
//! Two mutations can therefore be in flight together; each applies the cart
//! returned to it when its response arrives, so the last response wins.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use qkart_core::{
    CartRecord, CatalogEntry, CatalogIndex, LineItem, Notice, NoticeSink, OrderSummary,
    OrphanPolicy, Price, ProductId, merge_indexed, total_quantity, total_value,
};
use secrecy::SecretString;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::backend::{BackendError, StorefrontBackend};
use crate::config::{SearchConfig, StorefrontConfig};
use crate::error::{
    ALREADY_IN_CART, CART_UNAVAILABLE, LOGIN_REQUIRED, LOGIN_TO_VIEW_CART, NO_PRODUCTS_FOUND,
    SOMETHING_WENT_WRONG, SyncError, UPDATE_FAILED,
};
use crate::notify::TracingSink;
use crate::search::{Clock, Debouncer, SearchTicket, TokioClock};

/// Result of flushing the search debouncer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// No search was due.
    Idle,
    /// A search ran and its results replaced the catalog.
    Applied {
        /// Number of products found.
        results: usize,
    },
    /// A newer search was issued while this one was in flight; its response
    /// was dropped.
    Superseded,
}

// =============================================================================
// CartSynchronizer
// =============================================================================

/// Keeps the reconciled cart in step with the backend.
///
/// Cheap to clone; clones share state.
pub struct CartSynchronizer<B> {
    inner: Arc<SynchronizerInner<B>>,
}

impl<B> Clone for CartSynchronizer<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct SynchronizerInner<B> {
    backend: B,
    clock: Arc<dyn Clock>,
    notices: Arc<dyn NoticeSink>,
    orphan_policy: OrphanPolicy,
    state: Mutex<SyncState>,
}

struct SyncState {
    /// `None` until the first catalog (or search) response lands.
    catalog: Option<Vec<CatalogEntry>>,
    index: CatalogIndex,
    /// `None` until the first cart response lands.
    cart: Option<Vec<CartRecord>>,
    reconciled: Vec<LineItem>,
    revision: u64,
    catalog_loads: usize,
    debouncer: Debouncer,
}

impl SyncState {
    fn new(search: &SearchConfig) -> Self {
        Self {
            catalog: None,
            index: CatalogIndex::default(),
            cart: None,
            reconciled: Vec::new(),
            revision: 0,
            catalog_loads: 0,
            debouncer: Debouncer::from_config(search),
        }
    }

    fn replace_catalog(&mut self, catalog: Vec<CatalogEntry>, policy: OrphanPolicy) {
        self.index = CatalogIndex::build(&catalog);
        self.catalog = Some(catalog);
        self.recompute(policy);
    }

    fn replace_cart(&mut self, records: Vec<CartRecord>, policy: OrphanPolicy) {
        self.cart = Some(records);
        self.recompute(policy);
    }

    fn recompute(&mut self, policy: OrphanPolicy) {
        let Some(catalog) = &self.catalog else {
            debug!("catalog not loaded yet; deferring cart merge");
            return;
        };
        let records = self.cart.as_deref().unwrap_or_default();
        self.reconciled = merge_indexed(records, catalog, &self.index, policy);
        self.revision += 1;
    }

    fn has_record(&self, product_id: &ProductId) -> bool {
        self.cart
            .as_ref()
            .is_some_and(|records| records.iter().any(|r| &r.product_id == product_id))
    }
}

/// Builder for [`CartSynchronizer`].
pub struct SynchronizerBuilder<B> {
    backend: B,
    clock: Arc<dyn Clock>,
    notices: Arc<dyn NoticeSink>,
    orphan_policy: OrphanPolicy,
    search: SearchConfig,
}

impl<B: StorefrontBackend> SynchronizerBuilder<B> {
    /// Where notices go. Defaults to [`TracingSink`].
    #[must_use]
    pub fn notices(mut self, sink: Arc<dyn NoticeSink>) -> Self {
        self.notices = sink;
        self
    }

    /// Time source for the search debouncer. Defaults to [`TokioClock`].
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn orphan_policy(mut self, policy: OrphanPolicy) -> Self {
        self.orphan_policy = policy;
        self
    }

    #[must_use]
    pub fn search(mut self, search: SearchConfig) -> Self {
        self.search = search;
        self
    }

    #[must_use]
    pub fn build(self) -> CartSynchronizer<B> {
        CartSynchronizer {
            inner: Arc::new(SynchronizerInner {
                backend: self.backend,
                clock: self.clock,
                notices: self.notices,
                orphan_policy: self.orphan_policy,
                state: Mutex::new(SyncState::new(&self.search)),
            }),
        }
    }
}

impl<B: StorefrontBackend> CartSynchronizer<B> {
    /// Start building a synchronizer over `backend`.
    #[must_use]
    pub fn builder(backend: B) -> SynchronizerBuilder<B> {
        SynchronizerBuilder {
            backend,
            clock: Arc::new(TokioClock),
            notices: Arc::new(TracingSink),
            orphan_policy: OrphanPolicy::default(),
            search: SearchConfig::default(),
        }
    }

    /// Synchronizer configured from `config`, delivering notices to `notices`.
    #[must_use]
    pub fn from_config(
        backend: B,
        config: &StorefrontConfig,
        notices: Arc<dyn NoticeSink>,
    ) -> Self {
        Self::builder(backend)
            .notices(notices)
            .orphan_policy(config.orphan_policy)
            .search(config.search)
            .build()
    }

    /// The backend this synchronizer talks to.
    #[must_use]
    pub fn backend(&self) -> &B {
        &self.inner.backend
    }

    fn lock(&self) -> MutexGuard<'_, SyncState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` against the state with the lock held. Never call across an await.
    fn update<R>(&self, f: impl FnOnce(&mut SyncState) -> R) -> R {
        f(&mut *self.lock())
    }

    fn notify(&self, notice: Notice) {
        self.inner.notices.notify(notice);
    }

    fn fail<T>(&self, err: SyncError) -> Result<T, SyncError> {
        warn!(error = %err, "storefront operation failed");
        self.notify(err.notice());
        Err(err)
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// Fetch the full catalog and replace the current one.
    ///
    /// Returns the number of products loaded.
    ///
    /// # Errors
    ///
    /// Returns a `TransientFault` if the catalog cannot be fetched; the
    /// current catalog is kept.
    #[instrument(skip(self))]
    pub async fn load_catalog(&self) -> Result<usize, SyncError> {
        self.update(|state| state.catalog_loads += 1);
        let result = self.inner.backend.fetch_catalog().await;
        self.update(|state| state.catalog_loads = state.catalog_loads.saturating_sub(1));

        match result {
            Ok(catalog) => {
                let count = catalog.len();
                self.update(|state| state.replace_catalog(catalog, self.inner.orphan_policy));
                info!(count, "catalog loaded");
                self.notify(Notice::success(format!("Loaded {count} products")));
                Ok(count)
            }
            Err(err) => {
                // A 404 on the product list is not a search miss
                let err = match err {
                    BackendError::NotFound(_) => {
                        SyncError::TransientFault(SOMETHING_WENT_WRONG.to_string())
                    }
                    other => SyncError::from_backend(other, SOMETHING_WENT_WRONG),
                };
                self.fail(err)
            }
        }
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Fetch the user's cart and replace the current records.
    ///
    /// Does nothing without a token: anonymous users have no server-side cart.
    ///
    /// # Errors
    ///
    /// Returns the backend's message on HTTP 400, `AuthRequired` if the token
    /// is rejected, and a `TransientFault` otherwise. Current records are kept.
    #[instrument(skip(self, token), fields(authenticated = token.is_some()))]
    pub async fn load_cart(&self, token: Option<&SecretString>) -> Result<(), SyncError> {
        let Some(token) = token else {
            debug!("no auth token; skipping cart load");
            return Ok(());
        };

        match self.inner.backend.fetch_cart(token).await {
            Ok(records) => {
                let count = records.len();
                self.update(|state| state.replace_cart(records, self.inner.orphan_policy));
                info!(count, "cart loaded");
                self.notify(Notice::success("Cart loaded"));
                Ok(())
            }
            Err(BackendError::Unauthorized(_)) => {
                self.fail(SyncError::AuthRequired(LOGIN_TO_VIEW_CART))
            }
            Err(err) => self.fail(SyncError::from_backend(err, CART_UNAVAILABLE)),
        }
    }

    /// Set the quantity of `product_id` in the cart. Zero removes it.
    ///
    /// Sends the full desired quantity, not a delta.
    ///
    /// # Errors
    ///
    /// Returns `AuthRequired` without calling the backend if `token` is
    /// `None`. Backend failures leave the current records untouched.
    #[instrument(skip(self, token), fields(product_id = %product_id))]
    pub async fn set_quantity(
        &self,
        token: Option<&SecretString>,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<(), SyncError> {
        let Some(token) = token else {
            return self.fail(SyncError::AuthRequired(LOGIN_REQUIRED));
        };

        match self
            .inner
            .backend
            .upsert_cart_item(token, product_id, quantity)
            .await
        {
            Ok(records) => {
                self.update(|state| state.replace_cart(records, self.inner.orphan_policy));
                info!("cart updated");
                self.notify(Notice::success("Cart updated"));
                Ok(())
            }
            Err(err) => self.fail(SyncError::from_backend(err, UPDATE_FAILED)),
        }
    }

    /// Add one unit of a product that is not yet in the cart.
    ///
    /// Products already in the cart must be changed with
    /// [`set_quantity`](Self::set_quantity).
    ///
    /// # Errors
    ///
    /// Returns `AuthRequired` without a token and `Validation` if the product
    /// is already in the cart; neither calls the backend.
    #[instrument(skip(self, token), fields(product_id = %product_id))]
    pub async fn add_product(
        &self,
        token: Option<&SecretString>,
        product_id: &ProductId,
    ) -> Result<(), SyncError> {
        if token.is_none() {
            return self.fail(SyncError::AuthRequired(LOGIN_REQUIRED));
        }
        if self.update(|state| state.has_record(product_id)) {
            return self.fail(SyncError::Validation(ALREADY_IN_CART.to_string()));
        }
        self.set_quantity(token, product_id, 1).await
    }

    // =========================================================================
    // Search
    // =========================================================================

    /// Record search input. The search is sent once the input goes quiet.
    pub fn submit_search(&self, text: impl Into<String>) {
        let now = self.inner.clock.now();
        self.update(|state| state.debouncer.submit_at(text, now));
    }

    /// Send the pending search if its debounce has elapsed.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` (and empties the catalog) when nothing matches, or a
    /// `TransientFault` (keeping the catalog) on any other failure.
    pub async fn flush_search(&self) -> Result<SearchOutcome, SyncError> {
        self.flush_search_at(self.inner.clock.now()).await
    }

    /// Wait for the pending search to fall due, then send it.
    ///
    /// Returns [`SearchOutcome::Idle`] at once if no input is pending.
    ///
    /// # Errors
    ///
    /// Same as [`flush_search`](Self::flush_search).
    pub async fn settle_search(&self) -> Result<SearchOutcome, SyncError> {
        loop {
            let Some(deadline) = self.update(|state| state.debouncer.next_deadline()) else {
                return Ok(SearchOutcome::Idle);
            };

            let now = self.inner.clock.now();
            if deadline > now {
                tokio::time::sleep(deadline - now).await;
            }

            let outcome = self
                .flush_search_at(self.inner.clock.now().max(deadline))
                .await?;
            if outcome != SearchOutcome::Idle {
                return Ok(outcome);
            }
        }
    }

    /// Whether search input is waiting for its debounce.
    #[must_use]
    pub fn is_search_pending(&self) -> bool {
        self.update(|state| state.debouncer.is_pending())
    }

    /// Send every search due at `now`, oldest first, and report the last.
    ///
    /// Each quiet gap gets its own request; responses to all but the newest
    /// are dropped by the sequence check in [`run_search`](Self::run_search).
    async fn flush_search_at(&self, now: Instant) -> Result<SearchOutcome, SyncError> {
        let tickets = self.update(|state| {
            let mut due = Vec::new();
            while let Some(ticket) = state.debouncer.poll_at(now) {
                due.push(ticket);
            }
            due
        });

        let mut outcome = Ok(SearchOutcome::Idle);
        for ticket in tickets {
            outcome = self.run_search(ticket).await;
        }
        outcome
    }

    #[instrument(skip(self, ticket), fields(seq = ticket.seq, query = %ticket.query))]
    async fn run_search(&self, ticket: SearchTicket) -> Result<SearchOutcome, SyncError> {
        let result = self.inner.backend.search_catalog(&ticket.query).await;
        let policy = self.inner.orphan_policy;

        let applied = self.update(|state| {
            if !state.debouncer.is_current(&ticket) {
                return None;
            }
            Some(match result {
                Ok(entries) => {
                    let count = entries.len();
                    state.replace_catalog(entries, policy);
                    Ok(count)
                }
                Err(BackendError::NotFound(_)) => {
                    state.replace_catalog(Vec::new(), policy);
                    Err(SyncError::NotFound(NO_PRODUCTS_FOUND.to_string()))
                }
                Err(err) => Err(SyncError::from_backend(err, SOMETHING_WENT_WRONG)),
            })
        });

        match applied {
            None => {
                debug!("discarding response to superseded search");
                Ok(SearchOutcome::Superseded)
            }
            Some(Ok(results)) => {
                info!(results, "search applied");
                self.notify(Notice::success(format!("Found {results} products")));
                Ok(SearchOutcome::Applied { results })
            }
            Some(Err(err)) => self.fail(err),
        }
    }

    // =========================================================================
    // Read side
    // =========================================================================

    /// Line items for display, in cart record order.
    #[must_use]
    pub fn reconciled_cart(&self) -> Vec<LineItem> {
        self.update(|state| state.reconciled.clone())
    }

    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.update(|state| total_quantity(&state.reconciled))
    }

    #[must_use]
    pub fn total_value(&self) -> Price {
        self.update(|state| total_value(&state.reconciled))
    }

    #[must_use]
    pub fn order_summary(&self) -> OrderSummary {
        self.update(|state| OrderSummary::from_items(&state.reconciled))
    }

    /// Current catalog; empty until the first load.
    #[must_use]
    pub fn catalog(&self) -> Vec<CatalogEntry> {
        self.update(|state| state.catalog.clone().unwrap_or_default())
    }

    /// Cart records as last returned by the backend.
    #[must_use]
    pub fn cart_records(&self) -> Vec<CartRecord> {
        self.update(|state| state.cart.clone().unwrap_or_default())
    }

    /// Number of times the reconciled cart has been recomputed.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.update(|state| state.revision)
    }

    /// Whether a catalog load is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.update(|state| state.catalog_loads > 0)
    }
}
