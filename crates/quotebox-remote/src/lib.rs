//! Quotebox Remote Sources
//!
//! - `HttpRemote`: a JSON endpoint of post records, mapped to quotes
//! - `StaticRemote`: a fixed in-memory snapshot

mod http;
mod fixed;

pub use fixed::StaticRemote;
pub use http::{HttpRemote, RemotePost, DEFAULT_LIMIT};
