//! Application state container
//!
//! Constructed once at startup and handed to the presentation layer.

use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinHandle;

use quotebox_remote::HttpRemote;
use quotebox_storage::{Database, KeyValueStore, LocalStorage, SessionStorage};
use quotebox_store::{publish, Quote, QuoteStore, RemoteSource, SyncReport};

use crate::config::Config;
use crate::scheduler::SyncScheduler;
use crate::Result;

pub struct App {
    /// Configuration
    config: Config,
    /// Quote collection
    store: QuoteStore,
    /// Session-scoped area, cleared on shutdown
    session: SessionStorage,
    /// Remote source used for sync and publishing
    remote: Arc<dyn RemoteSource>,
    /// Periodic sync, when started
    scheduler: Mutex<Option<SyncScheduler>>,
    /// Background publishes not yet awaited
    pending_publishes: Mutex<Vec<JoinHandle<()>>>,
}

impl App {
    /// Open storage and build the HTTP remote described by `config`.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        if let Some(parent) = config.database_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::open(&config.database_path)?;

        let remote = HttpRemote::new(
            config.parsed_remote_url()?,
            config.remote_limit,
            config.request_timeout(),
        )?;

        Ok(Self::with_parts(config, db, Arc::new(remote)))
    }

    /// Assemble an app from an already opened database and any remote source.
    pub fn with_parts(config: Config, db: Database, remote: Arc<dyn RemoteSource>) -> Self {
        let local: Arc<dyn KeyValueStore> = match config.storage_quota_bytes {
            Some(quota) => Arc::new(LocalStorage::with_quota(db.clone(), quota)),
            None => Arc::new(LocalStorage::new(db.clone())),
        };
        let session = SessionStorage::new(db);
        let store = QuoteStore::new(local, Arc::new(session.clone()));

        Self {
            config,
            store,
            session,
            remote,
            scheduler: Mutex::new(None),
            pending_publishes: Mutex::new(Vec::new()),
        }
    }

    /// Restore persisted state. Returns the number of quotes loaded.
    pub fn initialize(&self) -> usize {
        let count = self.store.load();
        tracing::info!(
            quotes = count,
            category = %self.store.selected_category(),
            "Quotebox initialized"
        );
        count
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &QuoteStore {
        &self.store
    }

    /// Add a quote locally and publish it from a background task.
    ///
    /// Returns once the quote is stored; the publish outcome is only logged.
    /// Must be called from within a tokio runtime.
    pub fn add_quote(&self, text: &str, category: &str) -> Result<Quote> {
        let quote = self.store.add(text, category)?;

        let remote = Arc::clone(&self.remote);
        let published = quote.clone();
        let handle = tokio::spawn(async move {
            publish(remote.as_ref(), &published).await;
        });

        let mut pending = self.pending_publishes.lock();
        pending.retain(|h| !h.is_finished());
        pending.push(handle);

        Ok(quote)
    }

    /// Wait for every background publish started so far.
    pub async fn wait_for_publishes(&self) {
        let handles = std::mem::take(&mut *self.pending_publishes.lock());
        for handle in handles {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "Publish task did not complete");
            }
        }
    }

    pub async fn sync_now(&self) -> Result<SyncReport> {
        Ok(self.store.sync(self.remote.as_ref()).await?)
    }

    /// Start the periodic sync. A running scheduler is replaced.
    pub fn start_periodic_sync(&self) {
        let scheduler = SyncScheduler::spawn(
            self.store.clone(),
            Arc::clone(&self.remote),
            self.config.sync_interval(),
        );
        *self.scheduler.lock() = Some(scheduler);
    }

    pub fn is_syncing_periodically(&self) -> bool {
        self.scheduler
            .lock()
            .as_ref()
            .is_some_and(SyncScheduler::is_running)
    }

    /// Import quotes from a JSON file. Returns how many were added.
    pub fn import_file(&self, path: &Path) -> Result<usize> {
        let json = std::fs::read_to_string(path)?;
        let added = self.store.import_json(&json)?;
        tracing::info!(path = %path.display(), added, "Imported quotes from file");
        Ok(added)
    }

    /// Write the pretty-printed snapshot to a file.
    pub fn export_file(&self, path: &Path) -> Result<()> {
        let json = self.store.export_snapshot()?;
        std::fs::write(path, json)?;
        tracing::info!(path = %path.display(), quotes = self.store.len(), "Exported quotes");
        Ok(())
    }

    /// Stop periodic sync, abort unfinished publishes, flush the snapshot and end the session.
    pub fn shutdown(&self) -> Result<()> {
        if let Some(scheduler) = self.scheduler.lock().take() {
            scheduler.stop();
        }
        for handle in self.pending_publishes.lock().drain(..) {
            handle.abort();
        }
        self.store.save();
        self.session.end_session()?;
        tracing::info!("Quotebox shut down");
        Ok(())
    }
}
