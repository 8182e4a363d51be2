//! Fetched library items plus a client-side filtered and sorted view.
//!
//! Only a page limit change (or `start`) fetches. Search text and sort key
//! changes recompute the view from the items already held. Overlapping
//! fetches are resolved by a generation counter: a response is committed
//! only if no newer fetch was issued after it.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use shared::{
    domain::{PageLimit, SortKey},
    error::{ClientError, DEFAULT_LIBRARY_ERROR},
    protocol::{LibraryItem, RECENT_PATH},
};
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, info, warn};

use crate::{
    transport::{Transport, TransportRequest},
    view::derive_view,
};

#[derive(Debug, Clone, PartialEq)]
pub struct LibraryViewState {
    /// Items of the last successful fetch, in server order.
    pub raw_items: Arc<[LibraryItem]>,
    /// `raw_items` filtered by `search_text` and ordered by `sort_key`.
    pub view: Arc<[LibraryItem]>,
    pub search_text: String,
    pub sort_key: SortKey,
    pub page_limit: PageLimit,
    pub loading: bool,
    pub error: Option<String>,
}

impl Default for LibraryViewState {
    fn default() -> Self {
        Self {
            raw_items: Arc::from(Vec::new()),
            view: Arc::from(Vec::new()),
            search_text: String::new(),
            sort_key: SortKey::default(),
            page_limit: PageLimit::default(),
            loading: false,
            error: None,
        }
    }
}

impl LibraryViewState {
    /// Nothing to show once loading has finished.
    pub fn is_empty_result(&self) -> bool {
        !self.loading && self.view.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Committed,
    Failed,
    /// A newer refresh was issued, or the controller stopped, before this
    /// response arrived.
    Discarded,
    /// No fetch was made.
    Skipped,
}

struct LibraryInner {
    state: LibraryViewState,
    generation: u64,
    running: bool,
}

pub struct LibraryController {
    transport: Arc<dyn Transport>,
    inner: Mutex<LibraryInner>,
    snapshots: watch::Sender<LibraryViewState>,
}

impl LibraryController {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_page_limit(transport, PageLimit::default())
    }

    pub fn with_page_limit(transport: Arc<dyn Transport>, page_limit: PageLimit) -> Self {
        let state = LibraryViewState {
            page_limit,
            ..LibraryViewState::default()
        };
        let (snapshots, _) = watch::channel(state.clone());
        Self {
            transport,
            inner: Mutex::new(LibraryInner {
                state,
                generation: 0,
                running: false,
            }),
            snapshots,
        }
    }

    pub fn snapshot(&self) -> LibraryViewState {
        self.lock().state.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<LibraryViewState> {
        self.snapshots.subscribe()
    }

    pub fn changes(&self) -> WatchStream<LibraryViewState> {
        WatchStream::new(self.subscribe())
    }

    /// Enables fetching and loads the first page.
    pub async fn start(&self) -> RefreshOutcome {
        self.lock().running = true;
        self.refresh().await
    }

    /// Discards every in-flight fetch. No state changes until restarted.
    pub fn stop(&self) {
        let mut inner = self.lock();
        inner.running = false;
        inner.generation += 1;
        if inner.state.loading {
            inner.state.loading = false;
            self.publish(&inner);
        }
    }

    /// Changes the page size and fetches again. Search text and sort key are
    /// kept. Setting the current limit again does not fetch.
    pub async fn set_page_limit(&self, page_limit: PageLimit) -> RefreshOutcome {
        {
            let mut inner = self.lock();
            if inner.state.page_limit == page_limit {
                return RefreshOutcome::Skipped;
            }
            inner.state.page_limit = page_limit;
            self.publish(&inner);
        }
        self.refresh().await
    }

    pub fn set_search_text(&self, search_text: impl Into<String>) {
        let search_text = search_text.into();
        let mut inner = self.lock();
        if inner.state.search_text == search_text {
            return;
        }
        inner.state.search_text = search_text;
        Self::recompute_view(&mut inner.state);
        self.publish(&inner);
    }

    pub fn set_sort_key(&self, sort_key: SortKey) {
        let mut inner = self.lock();
        if inner.state.sort_key == sort_key {
            return;
        }
        inner.state.sort_key = sort_key;
        Self::recompute_view(&mut inner.state);
        self.publish(&inner);
    }

    /// Fetches the current page. On failure the previous items stay visible
    /// next to the error.
    pub async fn refresh(&self) -> RefreshOutcome {
        let (generation, page_limit) = {
            let mut inner = self.lock();
            if !inner.running {
                debug!("library: refresh skipped, controller stopped");
                return RefreshOutcome::Skipped;
            }
            inner.generation += 1;
            inner.state.loading = true;
            inner.state.error = None;
            self.publish(&inner);
            (inner.generation, inner.state.page_limit)
        };

        let result = self.fetch(page_limit).await;

        let mut inner = self.lock();
        if !inner.running || inner.generation != generation {
            debug!(generation, "library: discarding stale response");
            return RefreshOutcome::Discarded;
        }
        inner.state.loading = false;
        let outcome = match result {
            Ok(items) => {
                info!("library: loaded {} items (limit={page_limit})", items.len());
                inner.state.raw_items = items.into();
                Self::recompute_view(&mut inner.state);
                RefreshOutcome::Committed
            }
            Err(err) => {
                warn!("library: fetch failed: {err}");
                inner.state.error = Some(match err {
                    ClientError::Status(_) => DEFAULT_LIBRARY_ERROR.to_string(),
                    other => other.user_message(DEFAULT_LIBRARY_ERROR),
                });
                RefreshOutcome::Failed
            }
        };
        self.publish(&inner);
        outcome
    }

    async fn fetch(&self, page_limit: PageLimit) -> Result<Vec<LibraryItem>, ClientError> {
        let response = self
            .transport
            .send(TransportRequest::get(RECENT_PATH).with_query("limit", page_limit))
            .await?;
        if !response.is_success() {
            return Err(ClientError::Status(response.status));
        }
        Ok(LibraryItem::list_from_value(
            response.body.as_ref().unwrap_or(&Value::Null),
        ))
    }

    fn recompute_view(state: &mut LibraryViewState) {
        state.view = derive_view(&state.raw_items, &state.search_text, state.sort_key).into();
    }

    fn publish(&self, inner: &LibraryInner) {
        self.snapshots.send_replace(inner.state.clone());
    }

    fn lock(&self) -> MutexGuard<'_, LibraryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[path = "tests/library_tests.rs"]
mod tests;
