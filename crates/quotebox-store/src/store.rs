//! Quote Store
//!
//! Owns the in-memory quote collection and persists a full snapshot on every
//! mutation. The in-memory state stays authoritative when a write fails.

use parking_lot::RwLock;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use quotebox_storage::KeyValueStore;

use crate::error::StoreError;
use crate::ids::IdAllocator;
use crate::merge::merge_with_report;
use crate::quote::{default_quotes, CategoryFilter, Quote, RawEntry};
use crate::remote::RemoteSource;
use crate::Result;

/// Durable key holding the quote collection
pub const QUOTES_KEY: &str = "quotes";
/// Durable key holding the last selected category
pub const SELECTED_CATEGORY_KEY: &str = "selectedCategory";
/// Session key holding the last displayed quote
pub const LAST_VIEWED_KEY: &str = "lastViewedQuote";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub kept_local: usize,
    pub replaced: usize,
    pub added: usize,
    /// Remote entries dropped for failing the quote invariants
    pub discarded: usize,
    /// Store size after the merge
    pub total: usize,
}

pub struct QuoteStore {
    /// Quotes in insertion order, ids unique
    items: Arc<RwLock<Vec<Quote>>>,
    /// Persisted category filter
    selected_category: Arc<RwLock<CategoryFilter>>,
    /// Survives across sessions
    local: Arc<dyn KeyValueStore>,
    /// Cleared when the session ends
    session: Arc<dyn KeyValueStore>,
    /// Held for the whole of a sync
    sync_gate: Arc<tokio::sync::Mutex<()>>,
    last_storage_failure: Arc<RwLock<Option<String>>>,
    /// Set when the stored snapshot could not be read; snapshot writes are held back
    /// so it is never overwritten with data that did not come from it
    snapshot_unreadable: Arc<AtomicBool>,
}

impl QuoteStore {
    /// Create an empty store. Call `load` to restore persisted state.
    pub fn new(local: Arc<dyn KeyValueStore>, session: Arc<dyn KeyValueStore>) -> Self {
        Self {
            items: Arc::new(RwLock::new(Vec::new())),
            selected_category: Arc::new(RwLock::new(CategoryFilter::All)),
            local,
            session,
            sync_gate: Arc::new(tokio::sync::Mutex::new(())),
            last_storage_failure: Arc::new(RwLock::new(None)),
            snapshot_unreadable: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Restore quotes and the selected category from durable storage.
    ///
    /// A missing, empty or structurally invalid snapshot is replaced by the default
    /// set, which is persisted right away. When storage cannot be read at all the
    /// defaults are used in memory only, so the stored snapshot survives.
    /// Returns the number of quotes loaded.
    pub fn load(&self) -> usize {
        let mut items = self.items.write();
        match self.local.get(QUOTES_KEY) {
            Ok(stored) => {
                self.snapshot_unreadable.store(false, Ordering::SeqCst);
                match stored.as_deref().and_then(parse_snapshot) {
                    Some(quotes) => {
                        *items = quotes;
                        tracing::info!(count = items.len(), "Restored quotes from storage");
                    }
                    None => {
                        *items = default_quotes();
                        self.persist(&items);
                        tracing::info!(count = items.len(), "Initialized default quotes");
                    }
                }
            }
            Err(e) => {
                *items = default_quotes();
                self.snapshot_unreadable.store(true, Ordering::SeqCst);
                self.record_failure(&e.into());
                tracing::warn!(
                    count = items.len(),
                    "Stored quotes unreadable, using defaults without saving"
                );
            }
        }
        let count = items.len();
        drop(items);

        let selected = match self.local.get(SELECTED_CATEGORY_KEY) {
            Ok(value) => CategoryFilter::parse(value.as_deref()),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read selected category");
                CategoryFilter::All
            }
        };
        *self.selected_category.write() = selected;

        count
    }

    /// Persist the current snapshot. Failures are logged and remembered, never returned.
    pub fn save(&self) {
        let items = self.items.read();
        self.persist(&items);
    }

    /// Persist the current snapshot, surfacing a storage failure to the caller.
    pub fn try_save(&self) -> Result<()> {
        let items = self.items.read();
        self.write_snapshot(&items)
    }

    /// Add a user-entered quote under a fresh id.
    pub fn add(&self, text: &str, category: &str) -> Result<Quote> {
        // Rejected input never takes the lock
        let candidate = Quote::new(0, text, category)?;

        let mut items = self.items.write();
        let id = IdAllocator::new(&items).fresh();
        let quote = Quote { id, ..candidate };
        items.push(quote.clone());
        self.persist(&items);

        tracing::info!(
            quote_id = quote.id,
            category = %quote.category,
            "Added quote"
        );

        Ok(quote)
    }

    pub fn list(&self, filter: &CategoryFilter) -> Vec<Quote> {
        self.items
            .read()
            .iter()
            .filter(|q| q.matches(filter))
            .cloned()
            .collect()
    }

    pub fn get(&self, id: u64) -> Option<Quote> {
        self.items.read().iter().find(|q| q.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    /// Full snapshot in insertion order.
    pub fn snapshot(&self) -> Vec<Quote> {
        self.items.read().clone()
    }

    /// Distinct categories in first-seen order.
    pub fn categories(&self) -> Vec<String> {
        let mut categories: Vec<String> = Vec::new();
        for quote in self.items.read().iter() {
            if !categories.contains(&quote.category) {
                categories.push(quote.category.clone());
            }
        }
        categories
    }

    pub fn pick_random(&self, filter: &CategoryFilter) -> Result<Quote> {
        self.pick_random_with(filter, &mut rand::thread_rng())
    }

    /// Uniform pick over the filtered subset using the given RNG.
    pub fn pick_random_with<R: Rng + ?Sized>(
        &self,
        filter: &CategoryFilter,
        rng: &mut R,
    ) -> Result<Quote> {
        let candidates = self.list(filter);
        candidates
            .choose(rng)
            .cloned()
            .ok_or_else(|| StoreError::EmptySelection(filter.to_string()))
    }

    /// Pick a random quote and remember it as the last viewed one for this session.
    pub fn show_random(&self, filter: &CategoryFilter) -> Result<Quote> {
        let quote = self.pick_random(filter)?;
        self.remember_viewed(&quote);
        Ok(quote)
    }

    /// The quote last shown in this session, if it is still valid.
    pub fn last_viewed(&self) -> Option<Quote> {
        let json = match self.session.get(LAST_VIEWED_KEY) {
            Ok(json) => json?,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read last viewed quote");
                return None;
            }
        };

        let value: Value = serde_json::from_str(&json).ok()?;
        match RawEntry::parse(&value) {
            RawEntry::WithId(quote) => Some(quote),
            _ => None,
        }
    }

    /// What to display on startup: the last viewed quote when it fits the filter,
    /// otherwise a fresh random pick.
    pub fn current_or_random(&self, filter: &CategoryFilter) -> Result<Quote> {
        match self.last_viewed() {
            Some(quote) if quote.matches(filter) => Ok(quote),
            _ => self.show_random(filter),
        }
    }

    pub fn selected_category(&self) -> CategoryFilter {
        self.selected_category.read().clone()
    }

    pub fn select_category(&self, filter: CategoryFilter) {
        if let Err(e) = self.local.set(SELECTED_CATEGORY_KEY, filter.as_str()) {
            self.record_failure(&e.into());
        }
        tracing::debug!(category = %filter, "Selected category");
        *self.selected_category.write() = filter;
    }

    /// Append every valid entry of a parsed JSON array. Returns how many were added.
    ///
    /// Entries without an id get a fresh one; an id already taken (by the store or
    /// an earlier entry of the same payload) is reassigned. Entries whose id is
    /// present but not a non-negative integer are rejected.
    pub fn import_entries(&self, raw: &Value) -> Result<usize> {
        let entries = raw.as_array().ok_or_else(|| {
            StoreError::MalformedImport("expected a JSON array of quotes".into())
        })?;

        let mut items = self.items.write();
        let mut ids = IdAllocator::new(&items);
        let mut accepted = Vec::new();
        let mut rejected = 0usize;

        for entry in entries {
            let (id, text, category) = match RawEntry::parse(entry) {
                RawEntry::WithId(quote) => (Some(quote.id), quote.text, quote.category),
                RawEntry::WithoutId { text, category } => (None, text, category),
                RawEntry::Invalid => {
                    rejected += 1;
                    continue;
                }
            };

            let id = match id {
                Some(id) if ids.claim(id) => id,
                _ => ids.fresh(),
            };
            accepted.push(Quote { id, text, category });
        }

        if accepted.is_empty() {
            tracing::warn!(rejected, "Import contained no valid entries");
            return Err(StoreError::NoValidEntries);
        }

        let added = accepted.len();
        items.extend(accepted);
        self.persist(&items);

        tracing::info!(added, rejected, "Imported quotes");

        Ok(added)
    }

    /// Parse `json` and import it. Unparseable text is a malformed import.
    pub fn import_json(&self, json: &str) -> Result<usize> {
        let raw: Value =
            serde_json::from_str(json).map_err(|e| StoreError::MalformedImport(e.to_string()))?;
        self.import_entries(&raw)
    }

    /// Pretty-printed JSON array of the full collection.
    pub fn export_snapshot(&self) -> Result<String> {
        let items = self.items.read();
        Ok(serde_json::to_string_pretty(&*items)?)
    }

    /// Fetch the remote snapshot and merge it in, remote winning on id conflict.
    ///
    /// Only one sync runs at a time; a second caller gets `SyncInProgress`.
    /// Quotes added while the fetch is pending are part of the merge, since the
    /// merge reads the collection as it is once the fetch completes. A failed
    /// fetch leaves the collection untouched.
    pub async fn sync(&self, remote: &dyn RemoteSource) -> Result<SyncReport> {
        let _gate = self
            .sync_gate
            .try_lock()
            .map_err(|_| StoreError::SyncInProgress)?;

        let fetched = match remote.fetch_quotes().await {
            Ok(quotes) => quotes,
            Err(e) => {
                tracing::warn!(error = %e, "Sync failed, keeping local quotes");
                return Err(StoreError::SyncFailed(e));
            }
        };

        let report = self.apply_remote(fetched);

        tracing::info!(
            kept_local = report.kept_local,
            replaced = report.replaced,
            added = report.added,
            total = report.total,
            "Quotes synced with server"
        );

        Ok(report)
    }

    /// Merge a fetched snapshot into the current collection and persist the result.
    fn apply_remote(&self, fetched: Vec<Quote>) -> SyncReport {
        let fetched_count = fetched.len();
        let remote_quotes: Vec<Quote> = fetched
            .into_iter()
            .filter_map(|q| Quote::new(q.id, &q.text, &q.category).ok())
            .collect();
        let discarded = fetched_count - remote_quotes.len();
        if discarded > 0 {
            tracing::warn!(discarded, "Dropped invalid remote quotes");
        }

        let mut items = self.items.write();
        let (merged, merge) = merge_with_report(&items, &remote_quotes);
        self.persist(&merged);
        *items = merged;

        SyncReport {
            kept_local: merge.kept_local,
            replaced: merge.replaced,
            added: merge.added,
            discarded,
            total: items.len(),
        }
    }

    /// Restore the default quotes and clear the category filter.
    ///
    /// This is the one write allowed to replace a snapshot that could not be read.
    pub fn reset(&self) {
        self.snapshot_unreadable.store(false, Ordering::SeqCst);
        let mut items = self.items.write();
        *items = default_quotes();
        self.persist(&items);
        drop(items);

        self.select_category(CategoryFilter::All);
        tracing::info!("Quote store reset to defaults");
    }

    /// Most recent persistence failure, kept for the presentation layer to surface.
    pub fn last_storage_failure(&self) -> Option<String> {
        self.last_storage_failure.read().clone()
    }

    fn write_snapshot(&self, items: &[Quote]) -> Result<()> {
        if self.snapshot_unreadable.load(Ordering::SeqCst) {
            return Err(StoreError::SnapshotUnreadable);
        }
        let json = serde_json::to_string(items)?;
        self.local.set(QUOTES_KEY, &json)?;
        Ok(())
    }

    fn persist(&self, items: &[Quote]) {
        match self.write_snapshot(items) {
            Ok(()) => *self.last_storage_failure.write() = None,
            Err(e) => self.record_failure(&e),
        }
    }

    fn remember_viewed(&self, quote: &Quote) {
        let result = serde_json::to_string(quote)
            .map_err(StoreError::from)
            .and_then(|json| Ok(self.session.set(LAST_VIEWED_KEY, &json)?));
        if let Err(e) = result {
            self.record_failure(&e);
        }
    }

    fn record_failure(&self, error: &StoreError) {
        tracing::warn!(error = %error, "Storage failed, continuing with in-memory state");
        *self.last_storage_failure.write() = Some(error.to_string());
    }
}

impl Clone for QuoteStore {
    fn clone(&self) -> Self {
        Self {
            items: Arc::clone(&self.items),
            selected_category: Arc::clone(&self.selected_category),
            local: Arc::clone(&self.local),
            session: Arc::clone(&self.session),
            sync_gate: Arc::clone(&self.sync_gate),
            last_storage_failure: Arc::clone(&self.last_storage_failure),
            snapshot_unreadable: Arc::clone(&self.snapshot_unreadable),
        }
    }
}

/// A stored snapshot is usable only if it is a non-empty array of valid quotes with
/// unique ids.
fn parse_snapshot(json: &str) -> Option<Vec<Quote>> {
    let value: Value = match serde_json::from_str(json) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(error = %e, "Stored quotes are not valid JSON");
            return None;
        }
    };

    let entries = value.as_array().filter(|entries| !entries.is_empty())?;
    let mut ids = IdAllocator::new(&[]);
    let mut quotes = Vec::with_capacity(entries.len());

    for entry in entries {
        match RawEntry::parse(entry) {
            RawEntry::WithId(quote) if ids.claim(quote.id) => quotes.push(quote),
            _ => {
                tracing::warn!("Stored quotes failed validation");
                return None;
            }
        }
    }

    Some(quotes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::RemoteError;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use quotebox_storage::{MemoryStorage, StorageError};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;
    use tokio::sync::Notify;

    fn memory_store() -> (QuoteStore, MemoryStorage, MemoryStorage) {
        let local = MemoryStorage::new();
        let session = MemoryStorage::new();
        let store = QuoteStore::new(Arc::new(local.clone()), Arc::new(session.clone()));
        (store, local, session)
    }

    fn q(id: u64, text: &str) -> Quote {
        Quote {
            id,
            text: text.into(),
            category: "General".into(),
        }
    }

    fn pairs(quotes: &[Quote]) -> Vec<(String, String)> {
        let mut pairs: Vec<_> = quotes
            .iter()
            .map(|q| (q.text.clone(), q.category.clone()))
            .collect();
        pairs.sort();
        pairs
    }

    /// Memory storage whose reads can be made to fail.
    #[derive(Clone, Default)]
    struct UnreadableStorage {
        inner: MemoryStorage,
        fail_reads: Arc<AtomicBool>,
    }

    impl KeyValueStore for UnreadableStorage {
        fn get(&self, key: &str) -> quotebox_storage::Result<Option<String>> {
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(StorageError::Disabled);
            }
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> quotebox_storage::Result<()> {
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> quotebox_storage::Result<()> {
            self.inner.remove(key)
        }
    }

    struct FixedRemote(std::result::Result<Vec<Quote>, RemoteError>);

    #[async_trait]
    impl RemoteSource for FixedRemote {
        async fn fetch_quotes(&self) -> std::result::Result<Vec<Quote>, RemoteError> {
            self.0.clone()
        }

        async fn post_quote(&self, _quote: &Quote) -> std::result::Result<(), RemoteError> {
            Ok(())
        }
    }

    /// Blocks inside `fetch_quotes` until released.
    struct GatedRemote {
        started: Notify,
        release: Notify,
        quotes: Vec<Quote>,
    }

    #[async_trait]
    impl RemoteSource for GatedRemote {
        async fn fetch_quotes(&self) -> std::result::Result<Vec<Quote>, RemoteError> {
            self.started.notify_one();
            self.release.notified().await;
            Ok(self.quotes.clone())
        }

        async fn post_quote(&self, _quote: &Quote) -> std::result::Result<(), RemoteError> {
            Ok(())
        }
    }

    #[test]
    fn test_load_without_storage_uses_defaults() {
        let (store, local, _) = memory_store();
        assert_eq!(store.load(), 3);
        assert_eq!(store.snapshot(), default_quotes());

        let stored = local.get(QUOTES_KEY).unwrap().unwrap();
        let stored: Vec<Quote> = serde_json::from_str(&stored).unwrap();
        assert_eq!(stored, default_quotes());
    }

    #[test]
    fn test_load_rejects_invalid_snapshots() {
        let invalid = [
            "not json",
            r#"{"id": 1, "text": "a", "category": "b"}"#,
            r#"[{"id": 1, "text": "", "category": "b"}]"#,
            r#"[{"text": "a", "category": "b"}]"#,
            r#"[{"id": 1, "text": "a", "category": "b"}, {"id": 1, "text": "c", "category": "d"}]"#,
        ];

        for json in invalid {
            let (store, local, _) = memory_store();
            local.set(QUOTES_KEY, json).unwrap();
            store.load();
            assert_eq!(store.snapshot(), default_quotes(), "snapshot: {json}");

            let repaired = local.get(QUOTES_KEY).unwrap().unwrap();
            assert!(parse_snapshot(&repaired).is_some());
        }
    }

    #[test]
    fn test_load_empty_snapshot_uses_defaults() {
        let (store, local, _) = memory_store();
        local.set(QUOTES_KEY, "[]").unwrap();

        assert_eq!(store.load(), 3);
        assert_eq!(store.snapshot(), default_quotes());
        let stored: Vec<Quote> =
            serde_json::from_str(&local.get(QUOTES_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(stored, default_quotes());
    }

    #[test]
    fn test_load_read_failure_keeps_stored_snapshot() {
        let storage = UnreadableStorage::default();
        let saved = r#"[{"id":10,"text":"User data","category":"Mine"}]"#;
        storage.inner.set(QUOTES_KEY, saved).unwrap();
        storage.fail_reads.store(true, Ordering::SeqCst);

        let store = QuoteStore::new(
            Arc::new(storage.clone()),
            Arc::new(MemoryStorage::new()),
        );
        assert_eq!(store.load(), 3);
        assert_eq!(store.snapshot(), default_quotes());
        assert!(store.last_storage_failure().is_some());
        assert_eq!(storage.inner.get(QUOTES_KEY).unwrap().as_deref(), Some(saved));

        // Later mutations stay in memory rather than clobbering the snapshot
        let added = store.add("Session only", "Mine").unwrap();
        assert!(store.get(added.id).is_some());
        assert_eq!(storage.inner.get(QUOTES_KEY).unwrap().as_deref(), Some(saved));
        assert!(matches!(
            store.try_save(),
            Err(StoreError::SnapshotUnreadable)
        ));

        // Once readable again, a reload restores the real data
        storage.fail_reads.store(false, Ordering::SeqCst);
        assert_eq!(store.load(), 1);
        assert_eq!(store.get(10).unwrap().text, "User data");
        store.add("Saved now", "Mine").unwrap();
        let stored: Vec<Quote> =
            serde_json::from_str(&storage.inner.get(QUOTES_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(stored.len(), 2);
    }

    #[test]
    fn test_reset_overwrites_unreadable_snapshot() {
        let storage = UnreadableStorage::default();
        storage.inner.set(QUOTES_KEY, "[]").unwrap();
        storage.fail_reads.store(true, Ordering::SeqCst);

        let store = QuoteStore::new(
            Arc::new(storage.clone()),
            Arc::new(MemoryStorage::new()),
        );
        store.load();
        store.reset();

        let stored: Vec<Quote> =
            serde_json::from_str(&storage.inner.get(QUOTES_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(stored, default_quotes());
        assert!(store.last_storage_failure().is_none());
    }

    #[test]
    fn test_load_restores_saved_state() {
        let (store, local, _) = memory_store();
        local
            .set(
                QUOTES_KEY,
                r#"[{"id": 10, "text": "Saved", "category": "Kept"}]"#,
            )
            .unwrap();
        local.set(SELECTED_CATEGORY_KEY, "Kept").unwrap();

        assert_eq!(store.load(), 1);
        assert_eq!(
            store.snapshot(),
            vec![Quote {
                id: 10,
                text: "Saved".into(),
                category: "Kept".into()
            }]
        );
        assert_eq!(
            store.selected_category(),
            CategoryFilter::Only("Kept".into())
        );
    }

    #[test]
    fn test_add_assigns_unique_id() {
        let (store, local, _) = memory_store();
        store.load();
        let before: Vec<u64> = store.snapshot().iter().map(|q| q.id).collect();

        let quote = store.add("  Keep going.  ", "Motivation").unwrap();
        assert_eq!(store.len(), before.len() + 1);
        assert!(!before.contains(&quote.id));
        assert_eq!(quote.text, "Keep going.");
        assert_eq!(store.get(quote.id), Some(quote.clone()));

        let second = store.add("Another", "Motivation").unwrap();
        assert_ne!(second.id, quote.id);

        let stored = local.get(QUOTES_KEY).unwrap().unwrap();
        let stored: Vec<Quote> = serde_json::from_str(&stored).unwrap();
        assert_eq!(stored, store.snapshot());
    }

    #[test]
    fn test_add_rejects_empty_fields() {
        let (store, _, _) = memory_store();
        store.load();

        assert!(matches!(
            store.add("", "x"),
            Err(StoreError::InvalidInput(_))
        ));
        assert!(matches!(
            store.add("x", ""),
            Err(StoreError::InvalidInput(_))
        ));
        assert!(matches!(
            store.add("   ", "x"),
            Err(StoreError::InvalidInput(_))
        ));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_storage_failure_keeps_memory_state() {
        let (store, local, _) = memory_store();
        store.load();
        let persisted = local.get(QUOTES_KEY).unwrap();

        local.set_disabled(true);
        let quote = store.add("Offline", "Resilience").unwrap();
        assert_eq!(store.len(), 4);
        assert!(store.get(quote.id).is_some());
        assert!(store.last_storage_failure().is_some());
        assert!(matches!(
            store.try_save(),
            Err(StoreError::StorageFailure(_))
        ));
        assert_eq!(local.get(QUOTES_KEY).unwrap(), persisted);

        local.set_disabled(false);
        store.save();
        assert!(store.last_storage_failure().is_none());
        let stored: Vec<Quote> =
            serde_json::from_str(&local.get(QUOTES_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(stored.len(), 4);
    }

    #[test]
    fn test_list_and_categories() {
        let (store, _, _) = memory_store();
        store.load();
        store.add("Be brave", "Courage").unwrap();
        store.add("New one", "Wisdom").unwrap();

        assert_eq!(store.list(&CategoryFilter::All).len(), 5);
        let courage = store.list(&CategoryFilter::Only("Courage".into()));
        assert_eq!(courage.len(), 2);
        assert!(courage.iter().all(|q| q.category == "Courage"));
        assert!(store.list(&CategoryFilter::Only("Nope".into())).is_empty());

        assert_eq!(
            store.categories(),
            vec!["Motivation", "Life", "Courage", "Wisdom"]
        );
    }

    #[test]
    fn test_pick_random_respects_filter() {
        let (store, _, _) = memory_store();
        store.load();
        store.add("Be brave", "Courage").unwrap();

        let mut rng = StdRng::seed_from_u64(7);
        for category in store.categories() {
            let filter = CategoryFilter::Only(category.clone());
            for _ in 0..50 {
                let quote = store.pick_random_with(&filter, &mut rng).unwrap();
                assert_eq!(quote.category, category);
            }
        }

        let err = store
            .pick_random(&CategoryFilter::Only("Missing".into()))
            .unwrap_err();
        assert!(matches!(err, StoreError::EmptySelection(c) if c == "Missing"));
    }

    #[test]
    fn test_pick_random_on_empty_store() {
        let (store, _, _) = memory_store();
        assert!(matches!(
            store.pick_random(&CategoryFilter::All),
            Err(StoreError::EmptySelection(_))
        ));
    }

    #[test]
    fn test_show_random_remembers_last_viewed() {
        let (store, _, session) = memory_store();
        store.load();
        assert!(store.last_viewed().is_none());

        let shown = store.show_random(&CategoryFilter::All).unwrap();
        assert_eq!(store.last_viewed(), Some(shown.clone()));
        assert_eq!(store.current_or_random(&CategoryFilter::All).unwrap(), shown);

        // A last viewed quote outside the filter is not reused
        let other = store
            .categories()
            .into_iter()
            .find(|c| *c != shown.category)
            .unwrap();
        let filter = CategoryFilter::Only(other.clone());
        assert_eq!(store.current_or_random(&filter).unwrap().category, other);

        session.set(LAST_VIEWED_KEY, "garbage").unwrap();
        assert!(store.last_viewed().is_none());
    }

    #[test]
    fn test_select_category_persists() {
        let (store, local, session) = memory_store();
        store.load();
        store.select_category(CategoryFilter::Only("Life".into()));
        assert_eq!(
            local.get(SELECTED_CATEGORY_KEY).unwrap().as_deref(),
            Some("Life")
        );

        let reopened = QuoteStore::new(Arc::new(local), Arc::new(session));
        reopened.load();
        assert_eq!(
            reopened.selected_category(),
            CategoryFilter::Only("Life".into())
        );
    }

    #[test]
    fn test_import_skips_invalid_entries() {
        let (store, _, _) = memory_store();
        store.load();

        let added = store
            .import_entries(&json!([
                {"text": "", "category": "x"},
                {"text": "ok", "category": "y"}
            ]))
            .unwrap();
        assert_eq!(added, 1);
        assert_eq!(store.len(), 4);
        assert_eq!(store.list(&CategoryFilter::Only("y".into()))[0].text, "ok");
    }

    #[test]
    fn test_import_rejections_do_not_mutate() {
        let (store, _, _) = memory_store();
        store.load();
        let before = store.snapshot();

        assert!(matches!(
            store.import_entries(&json!({"text": "a", "category": "b"})),
            Err(StoreError::MalformedImport(_))
        ));
        assert!(matches!(
            store.import_json("{not json"),
            Err(StoreError::MalformedImport(_))
        ));
        assert!(matches!(
            store.import_entries(&json!([{"text": " ", "category": "b"}, 42])),
            Err(StoreError::NoValidEntries)
        ));
        assert!(matches!(
            store.import_entries(&json!([])),
            Err(StoreError::NoValidEntries)
        ));

        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn test_import_id_handling() {
        let (store, _, _) = memory_store();
        store.load();

        let added = store
            .import_entries(&json!([
                {"id": 50, "text": "kept id", "category": "c"},
                {"id": 1, "text": "collides with default", "category": "c"},
                {"id": 50, "text": "collides within batch", "category": "c"},
                {"id": "x", "text": "unusable id", "category": "c"},
                {"text": "no id", "category": "c"}
            ]))
            .unwrap();
        assert_eq!(added, 4);

        let snapshot = store.snapshot();
        let mut ids: Vec<u64> = snapshot.iter().map(|q| q.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), snapshot.len());

        assert_eq!(store.get(50).unwrap().text, "kept id");
        assert_eq!(store.get(1).unwrap().text, default_quotes()[0].text);
    }

    #[test]
    fn test_import_max_id_then_add() {
        let (store, _, _) = memory_store();
        store.load();

        let added = store
            .import_entries(&json!([
                {"id": u64::MAX, "text": "a", "category": "b"},
                {"text": "c", "category": "d"}
            ]))
            .unwrap();
        assert_eq!(added, 2);

        let quote = store.add("After the top id", "Edge").unwrap();
        assert!(store.get(u64::MAX).is_some());

        let mut ids: Vec<u64> = store.snapshot().iter().map(|q| q.id).collect();
        assert!(ids.contains(&quote.id));
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), store.len());
    }

    #[test]
    fn test_export_import_round_trip() {
        let (store, _, _) = memory_store();
        store.load();
        store.add("Exported", "Travel").unwrap();

        let exported = store.export_snapshot().unwrap();
        assert!(exported.contains("\n  "));

        let (fresh, _, _) = memory_store();
        let added = fresh.import_json(&exported).unwrap();
        assert_eq!(added, store.len());
        assert_eq!(pairs(&fresh.snapshot()), pairs(&store.snapshot()));
    }

    #[tokio::test]
    async fn test_sync_merges_remote() {
        let (store, local, _) = memory_store();
        local
            .set(
                QUOTES_KEY,
                &serde_json::to_string(&vec![q(1, "A"), q(2, "B")]).unwrap(),
            )
            .unwrap();
        store.load();

        let remote = FixedRemote(Ok(vec![q(2, "B2"), q(3, "C")]));
        let report = store.sync(&remote).await.unwrap();

        assert_eq!(store.snapshot(), vec![q(1, "A"), q(2, "B2"), q(3, "C")]);
        assert_eq!(
            report,
            SyncReport {
                kept_local: 1,
                replaced: 1,
                added: 1,
                discarded: 0,
                total: 3,
            }
        );

        let stored: Vec<Quote> =
            serde_json::from_str(&local.get(QUOTES_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(stored, store.snapshot());

        // Same snapshot again changes nothing
        store.sync(&remote).await.unwrap();
        assert_eq!(store.snapshot(), vec![q(1, "A"), q(2, "B2"), q(3, "C")]);
    }

    #[tokio::test]
    async fn test_sync_failure_leaves_state_untouched() {
        let (store, local, _) = memory_store();
        store.load();
        store.add("Local only", "Mine").unwrap();
        let before = store.export_snapshot().unwrap();
        let stored_before = local.get(QUOTES_KEY).unwrap();

        let remote = FixedRemote(Err(RemoteError::Transport("connection refused".into())));
        let err = store.sync(&remote).await.unwrap_err();
        assert!(matches!(err, StoreError::SyncFailed(RemoteError::Transport(_))));

        assert_eq!(store.export_snapshot().unwrap(), before);
        assert_eq!(local.get(QUOTES_KEY).unwrap(), stored_before);
    }

    #[tokio::test]
    async fn test_sync_discards_invalid_remote_quotes() {
        let (store, _, _) = memory_store();
        let remote = FixedRemote(Ok(vec![q(1, "fine"), q(2, "  ")]));

        let report = store.sync(&remote).await.unwrap();
        assert_eq!(report.discarded, 1);
        assert_eq!(store.snapshot(), vec![q(1, "fine")]);
    }

    #[tokio::test]
    async fn test_sync_trims_remote_quotes() {
        let (store, local, session) = memory_store();
        let remote = FixedRemote(Ok(vec![Quote {
            id: 4,
            text: "  padded text ".into(),
            category: " User 1 ".into(),
        }]));

        store.sync(&remote).await.unwrap();
        let expected = Quote {
            id: 4,
            text: "padded text".into(),
            category: "User 1".into(),
        };
        assert_eq!(store.snapshot(), vec![expected.clone()]);

        let reopened = QuoteStore::new(Arc::new(local), Arc::new(session));
        reopened.load();
        assert_eq!(reopened.snapshot(), vec![expected]);
    }

    #[tokio::test]
    async fn test_sync_is_single_flight_and_sees_concurrent_adds() {
        let (store, _, _) = memory_store();
        store.load();

        let remote = Arc::new(GatedRemote {
            started: Notify::new(),
            release: Notify::new(),
            quotes: vec![q(2, "Remote two"), q(900, "Remote only")],
        });

        let task = {
            let store = store.clone();
            let remote = Arc::clone(&remote);
            tokio::spawn(async move { store.sync(remote.as_ref()).await })
        };

        remote.started.notified().await;
        assert!(matches!(
            store.sync(remote.as_ref()).await,
            Err(StoreError::SyncInProgress)
        ));

        let added = store.add("Written mid-sync", "Live").unwrap();
        remote.release.notify_one();

        let report = task.await.unwrap().unwrap();
        assert_eq!(report.total, 5);
        assert_eq!(report.added, 1);
        assert_eq!(report.replaced, 1);
        assert!(store.get(added.id).is_some());
        assert_eq!(store.get(2).unwrap().text, "Remote two");

        // Gate is released once the sync finishes
        let remote = FixedRemote(Ok(vec![]));
        assert!(store.sync(&remote).await.is_ok());
    }

    #[test]
    fn test_reset_restores_defaults() {
        let (store, local, _) = memory_store();
        store.load();
        store.add("Temporary", "Scratch").unwrap();
        store.select_category(CategoryFilter::Only("Scratch".into()));

        store.reset();
        assert_eq!(store.snapshot(), default_quotes());
        assert_eq!(store.selected_category(), CategoryFilter::All);
        assert_eq!(
            local.get(SELECTED_CATEGORY_KEY).unwrap().as_deref(),
            Some("all")
        );
    }
}
