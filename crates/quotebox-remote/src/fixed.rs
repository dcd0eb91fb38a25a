//! In-memory remote source

use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;

use quotebox_store::{Quote, RemoteError, RemoteSource};

/// Serves a fixed snapshot and records what gets posted.
pub struct StaticRemote {
    snapshot: Arc<RwLock<Result<Vec<Quote>, RemoteError>>>,
    posted: Arc<RwLock<Vec<Quote>>>,
}

impl StaticRemote {
    pub fn new(quotes: Vec<Quote>) -> Self {
        Self {
            snapshot: Arc::new(RwLock::new(Ok(quotes))),
            posted: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// A source whose every fetch fails with `error`.
    pub fn failing(error: RemoteError) -> Self {
        Self {
            snapshot: Arc::new(RwLock::new(Err(error))),
            posted: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn set_snapshot(&self, quotes: Vec<Quote>) {
        *self.snapshot.write() = Ok(quotes);
    }

    pub fn posted(&self) -> Vec<Quote> {
        self.posted.read().clone()
    }
}

impl Default for StaticRemote {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Clone for StaticRemote {
    fn clone(&self) -> Self {
        Self {
            snapshot: Arc::clone(&self.snapshot),
            posted: Arc::clone(&self.posted),
        }
    }
}

#[async_trait]
impl RemoteSource for StaticRemote {
    async fn fetch_quotes(&self) -> Result<Vec<Quote>, RemoteError> {
        self.snapshot.read().clone()
    }

    async fn post_quote(&self, quote: &Quote) -> Result<(), RemoteError> {
        self.posted.write().push(quote.clone());
        Ok(())
    }
}
