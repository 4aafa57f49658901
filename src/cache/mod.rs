//! Query cache
//!
//! Sits between the command host and the aggregation service:
//!
//! - reads are cached per [`QueryKey`] for `stale_after` and bounded by an LRU
//!   capacity;
//! - concurrent reads of one key share a single fetch;
//! - mutations invalidate the keys they touch and advance an epoch so results
//!   fetched before the mutation are not cached.
//!
//! ```toml
//! [query]
//! enabled = true
//! stale_after_seconds = 30
//! capacity = 64
//! ```

mod config;
mod keys;
pub(crate) mod lock;
mod query;
mod store;

pub use config::QueryCacheConfig;
pub use keys::{QueryKey, QueryValue};
pub use query::{Epoch, QueryClient};
pub use store::QueryStore;
