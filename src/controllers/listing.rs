//! Products listing controller
//!
//! Owns the filter/sort/pagination state of one listing view, fetches the
//! matching page from the products backend and publishes
//! `(filter, result, loading)` to the presentation layer.
//!
//! Fetches may overlap. Each one is tagged with an increasing sequence
//! number and its response is applied only if no newer fetch has been issued
//! since, so the most recently requested page always wins.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::error::ApiError;
use crate::models::filter::{FilterPatch, FilterState, SortOrder};
use crate::models::product::ProductsList;
use crate::services::debounce::Debouncer;
use crate::services::notifier::{Notification, Notifier};
use crate::services::products_api::ProductsApi;

pub const FETCH_ERROR_TITLE: &str = "Error fetching products";

/// Inputs that share one debounce timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DebounceGroup {
    /// `price_min` / `price_max` text inputs
    PriceRange,
    /// Free-text search box
    Search,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    Immediate,
    Debounced(DebounceGroup),
}

/// Snapshot handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ListingView {
    pub filter: FilterState,
    /// `None` until the first successful fetch
    pub result: Option<ProductsList>,
    pub loading: bool,
}

impl ListingView {
    pub fn count(&self) -> usize {
        self.result.as_ref().map_or(0, |r| r.count)
    }

    pub fn page_index(&self) -> usize {
        self.filter.page_index()
    }

    pub fn page_count(&self) -> usize {
        self.count().div_ceil(self.filter.limit.max(1))
    }

    /// A completed fetch that matched nothing. Rendered as an empty state.
    pub fn is_empty(&self) -> bool {
        self.result.as_ref().is_some_and(ProductsList::is_empty)
    }
}

type SuccessCallback = Box<dyn FnOnce(&ProductsList) + Send>;
type FailureCallback = Box<dyn FnOnce(&ApiError) + Send>;

/// Optional hooks run when a fetch settles.
#[derive(Default)]
pub struct FetchCallbacks {
    on_success: Option<SuccessCallback>,
    on_failure: Option<FailureCallback>,
}

impl FetchCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_success(mut self, f: impl FnOnce(&ProductsList) + Send + 'static) -> Self {
        self.on_success = Some(Box::new(f));
        self
    }

    pub fn on_failure(mut self, f: impl FnOnce(&ApiError) + Send + 'static) -> Self {
        self.on_failure = Some(Box::new(f));
        self
    }
}

struct State {
    filter: FilterState,
    result: Option<ProductsList>,
    in_flight: usize,
}

impl State {
    fn view(&self) -> ListingView {
        ListingView {
            filter: self.filter.clone(),
            result: self.result.clone(),
            loading: self.in_flight > 0,
        }
    }
}

struct Inner {
    api: Arc<dyn ProductsApi>,
    notifier: Arc<dyn Notifier>,
    state: Mutex<State>,
    view_tx: watch::Sender<ListingView>,
    debouncer: Debouncer<DebounceGroup>,
    issued: AtomicU64,
}

impl Inner {
    /// Mutate state and publish the new view while still holding the lock,
    /// so subscribers never see views out of order.
    fn update<R>(&self, f: impl FnOnce(&mut State) -> R) -> R {
        let mut state = self.state.lock();
        let out = f(&mut state);
        self.view_tx.send_replace(state.view());
        out
    }
}

/// Decrements the in-flight count when the fetch settles, however it settles.
struct LoadingGuard<'a> {
    inner: &'a Inner,
}

impl<'a> LoadingGuard<'a> {
    fn start(inner: &'a Inner) -> Self {
        inner.update(|s| s.in_flight += 1);
        Self { inner }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.inner.update(|s| s.in_flight = s.in_flight.saturating_sub(1));
    }
}

#[derive(Clone)]
pub struct ListingController {
    inner: Arc<Inner>,
}

impl ListingController {
    pub fn new(api: Arc<dyn ProductsApi>, notifier: Arc<dyn Notifier>, debounce_window: Duration) -> Self {
        let state = State {
            filter: FilterState::default(),
            result: None,
            in_flight: 0,
        };
        let (view_tx, _) = watch::channel(state.view());

        Self {
            inner: Arc::new(Inner {
                api,
                notifier,
                state: Mutex::new(state),
                view_tx,
                debouncer: Debouncer::new(debounce_window),
                issued: AtomicU64::new(0),
            }),
        }
    }

    pub fn view(&self) -> ListingView {
        self.inner.state.lock().view()
    }

    pub fn filter(&self) -> FilterState {
        self.inner.state.lock().filter.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.state.lock().in_flight > 0
    }

    /// Watch every state change (filter edits, results, loading flips).
    pub fn subscribe(&self) -> watch::Receiver<ListingView> {
        self.inner.view_tx.subscribe()
    }

    pub fn has_pending(&self, group: DebounceGroup) -> bool {
        self.inner.debouncer.is_pending(&group)
    }

    /// Fetch the page for the current filter.
    pub async fn refresh(&self) -> Result<ProductsList, ApiError> {
        let filter = self.filter();
        self.fetch(&filter).await
    }

    /// Apply `patch` to the current filter and fetch.
    ///
    /// Immediate mode waits for the fetch and returns its page. Debounced mode
    /// returns `Ok(None)` at once; the fetch fires after the group has been
    /// quiet for the debounce window and uses the filter as it is then.
    pub async fn set_filter(&self, patch: FilterPatch, mode: FetchMode) -> Result<Option<ProductsList>, ApiError> {
        let filter = self.inner.update(|s| {
            s.filter.apply(patch);
            s.filter.clone()
        });

        match mode {
            FetchMode::Immediate => self.fetch(&filter).await.map(Some),
            FetchMode::Debounced(group) => {
                self.schedule_fetch(group);
                Ok(None)
            }
        }
    }

    fn schedule_fetch(&self, group: DebounceGroup) {
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        debug!(?group, window_ms = self.inner.debouncer.window().as_millis() as u64, "Scheduling debounced fetch");

        self.inner.debouncer.schedule(group, async move {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let controller = ListingController { inner };
            // Failures are already logged and notified
            let _ = controller.refresh().await;
        });
    }

    /// Jump to a zero-based page. No-op when the page starts past the last row.
    pub async fn set_page(&self, page_index: usize) -> Result<Option<ProductsList>, ApiError> {
        let offset = {
            let state = self.inner.state.lock();
            let count = state.result.as_ref().map_or(0, |r| r.count);
            let offset = page_index.checked_mul(state.filter.limit);

            match offset {
                Some(offset) if offset < count => offset,
                _ => {
                    debug!(page_index, count, limit = state.filter.limit, "Ignoring out-of-range page");
                    return Ok(None);
                }
            }
        };

        let filter = self.inner.update(|s| {
            s.filter.offset = offset;
            s.filter.clone()
        });
        self.fetch(&filter).await.map(Some)
    }

    pub async fn set_page_size(&self, size: usize) -> Result<Option<ProductsList>, ApiError> {
        if size == 0 {
            warn!("Ignoring page size of 0");
            return Ok(None);
        }
        self.set_filter(FilterPatch::new().limit(size).offset(0), FetchMode::Immediate)
            .await
    }

    /// Sort by `field`, or restore the server's default order with `None`.
    pub async fn set_sort(&self, field: Option<String>, order: SortOrder) -> Result<Option<ProductsList>, ApiError> {
        let order = if field.is_some() { order } else { SortOrder::Asc };
        self.set_filter(FilterPatch::new().sort(field, order), FetchMode::Immediate)
            .await
    }

    /// Column header click: unsorted → ascending → descending → unsorted.
    pub async fn toggle_sort(&self, field: &str) -> Result<Option<ProductsList>, ApiError> {
        let current = self.filter();
        let (next_field, next_order) = match current.sort_by.as_deref() {
            Some(sorted) if sorted == field => match current.sort_order {
                SortOrder::Asc => (Some(field.to_string()), SortOrder::Desc),
                SortOrder::Desc => (None, SortOrder::Asc),
            },
            _ => (Some(field.to_string()), SortOrder::Asc),
        };
        self.set_sort(next_field, next_order).await
    }

    /// Back to `{offset: 0, limit: 10}` with everything else cleared.
    pub async fn reset(&self) -> Result<ProductsList, ApiError> {
        self.inner.debouncer.cancel_all();
        let filter = self.inner.update(|s| {
            s.filter = FilterState::default();
            s.filter.clone()
        });
        info!("Listing filters reset");
        self.fetch(&filter).await
    }

    pub async fn fetch(&self, filter: &FilterState) -> Result<ProductsList, ApiError> {
        self.fetch_with(filter, FetchCallbacks::default()).await
    }

    /// Fetch the page for `filter`.
    ///
    /// On success the result replaces the current one, unless a newer fetch
    /// was issued meanwhile. On failure the current result is left as is and
    /// the user is notified.
    pub async fn fetch_with(&self, filter: &FilterState, callbacks: FetchCallbacks) -> Result<ProductsList, ApiError> {
        let seq = self.inner.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let _loading = LoadingGuard::start(&self.inner);

        info!(
            seq,
            offset = filter.offset,
            limit = filter.limit,
            search = filter.search.as_deref(),
            category = filter.category.as_deref(),
            sold = filter.is_sold,
            ordering = ?filter.ordering(),
            "Fetching products"
        );

        match self.inner.api.list_products(filter).await {
            Ok(list) => {
                let applied = self.inner.update(|s| {
                    if self.inner.issued.load(Ordering::SeqCst) == seq {
                        s.result = Some(list.clone());
                        true
                    } else {
                        false
                    }
                });
                if !applied {
                    debug!(seq, "Discarding response superseded by a newer fetch");
                }

                if let Some(cb) = callbacks.on_success {
                    cb(&list);
                }
                Ok(list)
            }
            Err(err) => {
                error!(seq, error = %err, "Error fetching products");
                self.inner.notifier.notify(Notification::error(
                    FETCH_ERROR_TITLE,
                    format!("{}: {}", FETCH_ERROR_TITLE, err.detail()),
                ));

                if let Some(cb) = callbacks.on_failure {
                    cb(&err);
                }
                Err(err)
            }
        }
    }
}
