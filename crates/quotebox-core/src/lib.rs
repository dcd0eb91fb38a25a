//! Quotebox Core
//!
//! Wires storage, the quote store and the remote source into one `App`
//! instance owned by the caller. Nothing here is global.

mod app;
mod config;
mod error;
mod scheduler;

pub use app::App;
pub use config::Config;
pub use error::CoreError;
pub use scheduler::SyncScheduler;

// Re-export core components
pub use quotebox_remote::{HttpRemote, StaticRemote};
pub use quotebox_storage::{Database, LocalStorage, SessionStorage, StorageError};
pub use quotebox_store::{
    CategoryFilter, Quote, QuoteStore, RemoteError, RemoteSource, StoreError, SyncReport,
};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
