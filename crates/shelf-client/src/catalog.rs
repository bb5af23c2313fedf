//! # Catalog Controller
//!
//! Drives the book list: decides whether to query, dispatches the fetched
//! catalog once per distinct payload, and falls back to the offline cache
//! when the server is unreachable.
//!
//! ## Load Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  load(filtered)                                                         │
//! │     │                                                                   │
//! │     ├── filtered non-empty ──► render filtered (no query)               │
//! │     │                                                                   │
//! │     ├── torn down ───────────► render cached products (no query)        │
//! │     │                                                                   │
//! │     └── seq = next sequence; allBooks ◄─── raced against teardown       │
//! │              │                                                          │
//! │              ├── teardown wins ──────► no dispatch                      │
//! │              ├── seq < latest issued ► stale, no dispatch               │
//! │              ├── Ok(books) ──────────► guard? UPDATE_BOOKS + cache      │
//! │              └── Err(e) ─────────────► warn, render offline `books`     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use shelf_core::catalog::{payload_fingerprint, render_catalog, CatalogView, FetchGuard};
use shelf_core::state::books_in_category;
use shelf_core::{Action, Book, Category};
use shelf_db::StoreName;

use crate::error::ClientResult;
use crate::persist::{OfflineStore, OfflineWriterHandle};
use crate::queries::BookApi;
use crate::store::StateContainer;

/// Decrements the in-flight counter when a fetch ends, however it ends.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn start(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        InFlight(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Resolves once teardown is signalled.
async fn torn_down(mut rx: watch::Receiver<bool>) {
    let _ = rx.wait_for(|down| *down).await;
}

enum FetchOutcome {
    Fetched(ClientResult<Vec<Book>>),
    TornDown,
}

pub struct CatalogController {
    api: BookApi,
    state: StateContainer,
    writer: OfflineWriterHandle,
    offline: Arc<dyn OfflineStore>,
    guard: Mutex<FetchGuard>,
    issued: AtomicU64,
    in_flight: AtomicUsize,
    teardown: watch::Sender<bool>,
}

impl CatalogController {
    pub fn new(
        api: BookApi,
        state: StateContainer,
        writer: OfflineWriterHandle,
        offline: Arc<dyn OfflineStore>,
    ) -> Self {
        CatalogController {
            api,
            state,
            writer,
            offline,
            guard: Mutex::new(FetchGuard::new()),
            issued: AtomicU64::new(0),
            in_flight: AtomicUsize::new(0),
            teardown: watch::Sender::new(false),
        }
    }

    /// Builds the catalog view for `filtered`, fetching when it is empty.
    ///
    /// Fetch failures are logged, never returned.
    pub async fn load(&self, filtered: &[Book]) -> CatalogView {
        if !filtered.is_empty() {
            debug!(count = filtered.len(), "Rendering filtered books, skipping query");
            return render_catalog(filtered, None, self.is_loading());
        }

        if self.is_torn_down() {
            let products = self.state.select(|s| s.products.clone());
            return render_catalog(&[], Some(products.as_slice()), false);
        }

        let seq = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let outcome = {
            let _in_flight = InFlight::start(&self.in_flight);
            tokio::select! {
                result = self.api.all_books() => FetchOutcome::Fetched(result),
                _ = torn_down(self.teardown.subscribe()) => FetchOutcome::TornDown,
            }
        };

        match outcome {
            FetchOutcome::TornDown => {
                debug!(seq, "Catalog fetch cancelled by teardown");
                render_catalog(&[], None, false)
            }
            FetchOutcome::Fetched(Ok(books)) => {
                if self.is_stale(seq) {
                    debug!(seq, latest = self.latest_seq(), "Discarding stale catalog result");
                    let products = self.state.select(|s| s.products.clone());
                    return render_catalog(&[], Some(products.as_slice()), self.is_loading());
                }
                self.apply_fetched(&books).await;
                render_catalog(&[], Some(books.as_slice()), self.is_loading())
            }
            FetchOutcome::Fetched(Err(e)) => {
                warn!(seq, error = %e, "Catalog fetch failed, using offline cache");
                let cached = self.cached_books().await;
                render_catalog(&[], Some(cached.as_slice()), self.is_loading())
            }
        }
    }

    /// Dispatches and caches `books` if this payload has not been seen.
    async fn apply_fetched(&self, books: &[Book]) {
        let fingerprint = payload_fingerprint(books);
        if !self.guard.lock().await.should_dispatch(fingerprint, 0) {
            debug!("Catalog unchanged, skipping dispatch");
            return;
        }

        // Teardown may have landed after the fetch resolved.
        if self.is_torn_down() {
            return;
        }

        self.state.dispatch(Action::UpdateBooks(books.to_vec()));
        info!(count = books.len(), "Catalog updated");
        self.refresh_cache(StoreName::Books, books.iter().map(|b| (b.id.clone(), serde_json::to_value(b))));
    }

    /// Replaces an offline store with fresh records, as one queued write.
    fn refresh_cache<I>(&self, store: StoreName, records: I)
    where
        I: IntoIterator<Item = (String, serde_json::Result<serde_json::Value>)>,
    {
        let records: Vec<_> = records
            .into_iter()
            .filter_map(|(key, record)| match record {
                Ok(record) => Some((key, record)),
                Err(e) => {
                    warn!(store = %store, key = %key, error = %e, "Failed to encode record");
                    None
                }
            })
            .collect();
        let _ = self.writer.replace_all(store, records);
    }

    /// Books from the last successful fetch of any earlier session.
    pub async fn cached_books(&self) -> Vec<Book> {
        match self.offline.get_all(StoreName::Books).await {
            Ok(records) => records
                .into_iter()
                .filter_map(|record| serde_json::from_value(record).ok())
                .collect(),
            Err(e) => {
                warn!(error = %e, "Failed to read offline catalog");
                Vec::new()
            }
        }
    }

    // =========================================================================
    // Categories
    // =========================================================================

    /// Fetches categories into state, falling back to the offline cache.
    pub async fn load_categories(&self) -> ClientResult<Vec<Category>> {
        let categories = match self.api.categories().await {
            Ok(categories) => {
                self.refresh_cache(
                    StoreName::Categories,
                    categories
                        .iter()
                        .map(|c| (c.id.clone(), serde_json::to_value(c))),
                );
                categories
            }
            Err(e) => {
                let cached: Vec<Category> = self
                    .offline
                    .get_all(StoreName::Categories)
                    .await?
                    .into_iter()
                    .filter_map(|record| serde_json::from_value(record).ok())
                    .collect();
                if cached.is_empty() {
                    return Err(e);
                }
                warn!(error = %e, "Category fetch failed, using offline cache");
                cached
            }
        };

        self.state.dispatch(Action::UpdateCategories(categories.clone()));
        Ok(categories)
    }

    /// Selects a category; an empty id means all books.
    pub fn select_category(&self, id: impl Into<String>) {
        self.state.dispatch(Action::UpdateCurrentCategory(id.into()));
    }

    /// The list a parent passes to [`load`](Self::load): cached products of
    /// the current category, or nothing when no category is selected.
    pub fn filtered_books(&self) -> Vec<Book> {
        self.state.select(|s| {
            if s.current_category.is_empty() {
                Vec::new()
            } else {
                books_in_category(s)
            }
        })
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Cancels in-flight fetches and stops further queries.
    pub fn teardown(&self) {
        self.teardown.send_replace(true);
        info!("Catalog controller torn down");
    }

    pub fn is_torn_down(&self) -> bool {
        *self.teardown.borrow()
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    pub fn latest_seq(&self) -> u64 {
        self.issued.load(Ordering::SeqCst)
    }

    fn is_stale(&self, seq: u64) -> bool {
        seq != self.latest_seq()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PersistSettings;
    use crate::persist::OfflineWriter;
    use crate::testing::{FakeServer, MemoryOfflineStore};
    use shelf_core::catalog::{CatalogSource, OUT_OF_STOCK_MESSAGE};
    use shelf_core::Money;
    use std::time::Duration;

    struct Harness {
        controller: Arc<CatalogController>,
        server: Arc<FakeServer>,
        store: Arc<MemoryOfflineStore>,
        writer: OfflineWriterHandle,
        state: StateContainer,
    }

    fn harness(books: Vec<Book>) -> Harness {
        harness_with(books, PersistSettings::default())
    }

    fn harness_with(books: Vec<Book>, settings: PersistSettings) -> Harness {
        let server = FakeServer::with_books(books);
        let store = MemoryOfflineStore::new();
        let writer = OfflineWriter::spawn(store.clone(), settings);
        let state = StateContainer::new();
        let controller = Arc::new(CatalogController::new(
            BookApi::new(server.clone()),
            state.clone(),
            writer.clone(),
            store.clone(),
        ));
        Harness {
            controller,
            server,
            store,
            writer,
            state,
        }
    }

    fn books(ids: &[&str]) -> Vec<Book> {
        ids.iter()
            .map(|id| Book::new(*id, format!("Book {}", id), Money::from_cents(1000)))
            .collect()
    }

    fn products_changed(state: &StateContainer, before: &shelf_core::ClientState) -> bool {
        state.snapshot().products != before.products
    }

    #[tokio::test]
    async fn test_filtered_books_skip_query() {
        let h = harness(books(&["a", "b"]));
        let filtered = books(&["f1"]);

        let view = h.controller.load(&filtered).await;

        assert_eq!(view.source, CatalogSource::Filtered);
        assert_eq!(view.items.len(), 1);
        assert_eq!(h.server.calls("allBooks"), 0);
        assert_eq!(h.state.dispatch_count(), 0);
    }

    #[tokio::test]
    async fn test_fetch_dispatches_once_per_payload() {
        let h = harness(books(&["a", "b"]));

        let view = h.controller.load(&[]).await;
        assert_eq!(view.source, CatalogSource::Fetched);
        assert_eq!(view.items.len(), 2);
        assert_eq!(h.state.dispatch_count(), 1);

        for _ in 0..3 {
            h.controller.load(&[]).await;
        }
        assert_eq!(h.server.calls("allBooks"), 4);
        assert_eq!(h.state.dispatch_count(), 1);

        h.server.set_books(books(&["a", "b", "c"]));
        let before = h.state.snapshot();
        h.controller.load(&[]).await;
        assert_eq!(h.state.dispatch_count(), 2);
        assert!(products_changed(&h.state, &before));
    }

    #[tokio::test]
    async fn test_empty_catalog_shows_message() {
        let h = harness(vec![]);
        let view = h.controller.load(&[]).await;
        assert!(view.is_out_of_stock());
        assert_eq!(view.message.as_deref(), Some(OUT_OF_STOCK_MESSAGE));
    }

    #[tokio::test]
    async fn test_successful_fetch_refreshes_cache() {
        let h = harness(books(&["a", "b"]));
        h.controller.load(&[]).await;
        h.writer.flush().await.unwrap();

        let cached: Vec<_> = h.store.records(StoreName::Books).into_iter().map(|(k, _)| k).collect();
        assert_eq!(cached, ["a", "b"]);

        h.server.set_books(books(&["c"]));
        h.controller.load(&[]).await;
        h.writer.flush().await.unwrap();
        let cached: Vec<_> = h.store.records(StoreName::Books).into_iter().map(|(k, _)| k).collect();
        assert_eq!(cached, ["c"]);
    }

    #[tokio::test]
    async fn test_catalog_larger_than_queue_is_fully_cached() {
        let ids: Vec<String> = (0..10).map(|i| format!("b{}", i)).collect();
        let ids: Vec<&str> = ids.iter().map(String::as_str).collect();
        let settings = PersistSettings {
            queue_capacity: 4,
            ..PersistSettings::default()
        };
        let h = harness_with(books(&ids), settings);

        h.controller.load(&[]).await;
        h.writer.put(StoreName::Cart, "b3", serde_json::json!({ "_id": "b3" })).unwrap();
        h.writer.flush().await.unwrap();

        assert_eq!(h.store.records(StoreName::Books).len(), 10);
        assert!(h.store.record(StoreName::Cart, "b3").is_some());
        assert_eq!(h.writer.stats().failed, 0);
        assert_eq!(h.writer.stats().enqueued, 2);
    }

    #[tokio::test]
    async fn test_failure_falls_back_to_offline_cache() {
        let h = harness(books(&["a", "b"]));
        h.controller.load(&[]).await;
        h.writer.flush().await.unwrap();

        h.server.fail("allBooks", "network down");
        let view = h.controller.load(&[]).await;

        assert_eq!(view.source, CatalogSource::Fetched);
        assert_eq!(view.items.len(), 2);
        assert_eq!(h.state.dispatch_count(), 1);
    }

    #[tokio::test]
    async fn test_failure_without_cache_is_out_of_stock() {
        let h = harness(books(&["a"]));
        h.server.fail("allBooks", "network down");
        let view = h.controller.load(&[]).await;
        assert!(view.is_out_of_stock());
        assert_eq!(h.state.dispatch_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_latest_issued_fetch_wins() {
        let h = harness(books(&["old"]));
        h.server.delay_next("allBooks", Duration::from_millis(200));

        let slow = {
            let controller = h.controller.clone();
            tokio::spawn(async move { controller.load(&[]).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(h.controller.is_loading());

        h.server.set_books(books(&["new"]));
        let fast = h.controller.load(&[]).await;
        assert_eq!(fast.items[0].id, "new");

        slow.await.unwrap();
        let products = h.state.select(|s| s.products.clone());
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].id, "new");
        assert_eq!(h.state.dispatch_count(), 1);
        assert!(!h.controller.is_loading());
    }

    #[tokio::test(start_paused = true)]
    async fn test_teardown_cancels_in_flight_fetch() {
        let h = harness(books(&["a"]));
        h.server.delay_next("allBooks", Duration::from_secs(5));

        let pending = {
            let controller = h.controller.clone();
            tokio::spawn(async move { controller.load(&[]).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        h.controller.teardown();

        let view = pending.await.unwrap();
        assert!(view.items.is_empty());
        assert_eq!(h.state.dispatch_count(), 0);

        // No further queries once torn down.
        h.controller.load(&[]).await;
        assert_eq!(h.server.calls("allBooks"), 1);
    }

    #[tokio::test]
    async fn test_categories_and_filter() {
        let h = harness(vec![]);
        let fiction = Category::new("c1", "Fiction");
        h.server.set_categories(vec![fiction.clone()]);
        h.server
            .set_books(vec![Book::new("b1", "Dune", Money::from_cents(900)).with_category(fiction)]);

        assert_eq!(h.controller.load_categories().await.unwrap().len(), 1);
        assert_eq!(h.state.select(|s| s.categories.len()), 1);

        h.controller.load(&[]).await;
        assert!(h.controller.filtered_books().is_empty());

        h.controller.select_category("c1");
        assert_eq!(h.controller.filtered_books().len(), 1);

        let view = h.controller.load(&h.controller.filtered_books()).await;
        assert_eq!(view.source, CatalogSource::Filtered);
    }

    #[tokio::test]
    async fn test_categories_fall_back_to_cache() {
        let h = harness(vec![]);
        h.server.set_categories(vec![Category::new("c1", "Fiction")]);
        h.controller.load_categories().await.unwrap();
        h.writer.flush().await.unwrap();

        h.server.fail("categories", "offline");
        let categories = h.controller.load_categories().await.unwrap();
        assert_eq!(categories[0].name, "Fiction");

        let fresh = harness(vec![]);
        fresh.server.fail("categories", "offline");
        assert!(fresh.controller.load_categories().await.is_err());
    }
}
