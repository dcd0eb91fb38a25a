//! Quotebox Quote Store
//!
//! - Quotes carry a stable id from creation; entries are never identified by position
//! - Every mutation persists a full snapshot; storage failures only warn
//! - Sync merges a remote snapshot into the local one, remote wins on id conflict

mod error;
mod ids;
mod merge;
mod quote;
mod remote;
mod store;

pub use error::StoreError;
pub use merge::{merge, merge_with_report, MergeReport};
pub use quote::{default_quotes, CategoryFilter, Quote};
pub use remote::{publish, RemoteError, RemoteSource};
pub use store::{QuoteStore, SyncReport, LAST_VIEWED_KEY, QUOTES_KEY, SELECTED_CATEGORY_KEY};

pub type Result<T> = std::result::Result<T, StoreError>;
