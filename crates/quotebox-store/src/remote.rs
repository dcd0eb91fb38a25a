//! Remote snapshot source

use async_trait::async_trait;
use thiserror::Error;

use crate::quote::Quote;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Remote returned HTTP {0}")]
    Status(u16),

    #[error("Could not decode remote payload: {0}")]
    Decode(String),
}

/// Where remote quotes come from and where new local quotes are published.
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// Fetch the full remote snapshot.
    async fn fetch_quotes(&self) -> std::result::Result<Vec<Quote>, RemoteError>;

    /// Publish one quote. The response is not needed for local consistency.
    async fn post_quote(&self, quote: &Quote) -> std::result::Result<(), RemoteError>;
}

/// Fire-and-forget publish: failures are logged, never returned.
pub async fn publish(remote: &dyn RemoteSource, quote: &Quote) {
    match remote.post_quote(quote).await {
        Ok(()) => tracing::info!(quote_id = quote.id, "Quote published to remote"),
        Err(e) => tracing::warn!(quote_id = quote.id, error = %e, "Failed to publish quote"),
    }
}
