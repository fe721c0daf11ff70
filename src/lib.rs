//! opscache - a two-tier persistent cache for client-side dashboard data.
//!
//! The cache keeps every entry in an in-memory map and, when the local
//! filesystem is usable, mirrors it to a durable JSON record so values
//! survive process restarts. Reads classify entries by age: fresh entries
//! are safe to use as-is, stale entries are still returned but flagged so
//! the caller can refetch in the background, and expired entries are
//! treated as absent and removed lazily.
//!
//! Storage failures are never surfaced: if the durable tier is unusable at
//! construction the cache runs memory-only, and a mid-session write failure
//! degrades that one value to memory-only after a cleanup-and-retry cycle.
//!
//! ```no_run
//! use opscache::{cache_key, PersistentCache};
//!
//! let mut cache = PersistentCache::new();
//! let key = cache_key("contacts", [("client", "Acme")]);
//!
//! cache.set(&key, &vec![1, 2, 3]);
//! if let Some(hit) = cache.get::<Vec<i32>>(&key) {
//!     if hit.is_stale {
//!         // usable for display, but kick off a refresh
//!     }
//! }
//! ```

pub mod cache;
pub mod config;
pub mod error;

pub use cache::entry::Freshness;
pub use cache::key::{cache_key, KeyParam};
pub use cache::manager::{CacheHit, PersistentCache};
pub use cache::store::{Availability, DurableStore};
pub use config::CacheConfig;
pub use error::StoreError;
