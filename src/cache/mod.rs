//! Two-tier caching module.
//!
//! This module provides the `PersistentCache` for storing and retrieving
//! backend query results across page loads and process restarts. Every
//! entry lives in an in-memory map; when the filesystem is usable, entries
//! are mirrored to JSON records that survive restarts.
//!
//! Reads classify entries by age:
//! - fresh: safe to use without a refresh
//! - stale: returned, but the caller should refetch in the background
//! - expired: treated as absent and removed lazily

pub mod entry;
pub mod key;
pub mod manager;
pub mod store;

pub use entry::Freshness;
pub use key::cache_key;
pub use manager::{CacheHit, PersistentCache};
