//! Two-tier persistent cache.

use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::cache::entry::{CacheRecord, Freshness};
use crate::cache::store::{Availability, DisabledStore, DurableStore, FileStore};
use crate::config::CacheConfig;

/// A usable cache read: the payload plus enough metadata for the caller
/// to decide whether to trigger a background refresh.
#[derive(Debug, Clone)]
pub struct CacheHit<T> {
    pub data: T,
    pub cached_at: DateTime<Utc>,
    /// True when the entry is past the fresh window. The value is still
    /// fine to display, but the caller should refetch.
    pub is_stale: bool,
}

impl<T> CacheHit<T> {
    pub fn age_minutes(&self) -> i64 {
        (Utc::now() - self.cached_at).num_minutes()
    }

    /// Human-readable age for dashboard status lines.
    pub fn age_display(&self) -> String {
        let minutes = self.age_minutes();
        if minutes < 1 {
            // Covers clock skew as well
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else {
            format!("{}h ago", minutes / 60)
        }
    }
}

/// Process-wide cache over an in-memory map and an optional durable tier.
///
/// Construct one instance at the application's composition root and hand
/// out references; tests build a fresh instance per test over a temp
/// directory. No operation returns an error or panics: durable-tier
/// failures degrade to misses or memory-only writes, because a cache must
/// never be less reliable than having no cache at all.
pub struct PersistentCache {
    memory: HashMap<String, CacheRecord>,
    durable: Box<dyn DurableStore>,
    durable_enabled: bool,
    fresh_ttl: Duration,
    stale_ttl: Duration,
}

impl PersistentCache {
    pub fn new() -> Self {
        Self::with_config(CacheConfig::default())
    }

    /// Build a cache, probing the durable tier once. A failed probe (no
    /// cache directory, unwritable path, full disk) switches the instance
    /// to memory-only for its whole lifetime; there is no re-probing.
    pub fn with_config(config: CacheConfig) -> Self {
        debug_assert!(
            config.fresh_ttl_minutes < config.stale_ttl_minutes,
            "fresh window must be shorter than stale window"
        );
        let (fresh_ttl, stale_ttl) = if config.fresh_ttl_minutes < config.stale_ttl_minutes {
            (config.fresh_ttl(), config.stale_ttl())
        } else {
            let defaults = CacheConfig::default();
            warn!(
                fresh = config.fresh_ttl_minutes,
                stale = config.stale_ttl_minutes,
                "Misordered freshness windows, using defaults"
            );
            (defaults.fresh_ttl(), defaults.stale_ttl())
        };

        let (durable, durable_enabled): (Box<dyn DurableStore>, bool) =
            match config.resolve_storage_dir() {
                Some(dir) => {
                    let store = FileStore::new(dir, config.namespace.clone());
                    match store.probe() {
                        Availability::Available => (Box::new(store), true),
                        Availability::Unavailable(reason) => {
                            warn!(reason = %reason, "Durable cache tier unavailable, running memory-only");
                            (Box::new(DisabledStore), false)
                        }
                    }
                }
                None => {
                    warn!("No cache directory on this platform, running memory-only");
                    (Box::new(DisabledStore), false)
                }
            };

        let mut cache = Self {
            memory: HashMap::new(),
            durable,
            durable_enabled,
            fresh_ttl,
            stale_ttl,
        };

        // Reclaim whatever a previous session left behind expired.
        if cache.durable_enabled {
            let removed = cache.cleanup();
            if removed > 0 {
                debug!(removed, "Removed leftover cache records at startup");
            }
        }

        cache
    }

    /// Whether the construction-time probe enabled the durable tier.
    pub fn is_durable(&self) -> bool {
        self.durable_enabled
    }

    /// Look up a key in both tiers.
    ///
    /// Returns `None` on a miss or when the entry has expired; expired
    /// entries are removed from both tiers on the way out. Stale entries
    /// are returned with `is_stale` set. Never fails: unreadable durable
    /// records and payloads that do not match `T` read as misses.
    pub fn get<T: DeserializeOwned>(&mut self, key: &str) -> Option<CacheHit<T>> {
        let record = self.lookup(key)?;

        let freshness = record.freshness(self.fresh_ttl, self.stale_ttl);
        if freshness == Freshness::Expired {
            self.invalidate(key);
            return None;
        }

        match serde_json::from_value::<T>(record.data) {
            Ok(data) => Some(CacheHit {
                data,
                cached_at: record.timestamp,
                is_stale: freshness == Freshness::Stale,
            }),
            Err(e) => {
                debug!(key, error = %e, "Cached payload does not match requested type");
                None
            }
        }
    }

    /// Store a value in both tiers with the current time as its write time.
    ///
    /// The memory write always succeeds. The durable write is best-effort:
    /// on failure the cache reclaims expired records and retries once, then
    /// gives up and keeps the value memory-only for this session.
    pub fn set<T: Serialize>(&mut self, key: &str, data: &T) {
        let value = match serde_json::to_value(data) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "Failed to serialize value, not caching");
                return;
            }
        };

        let record = CacheRecord::new(value);
        self.memory.insert(key.to_string(), record.clone());

        if !self.durable_enabled {
            return;
        }
        let contents = match serde_json::to_string(&record) {
            Ok(contents) => contents,
            Err(e) => {
                warn!(key, error = %e, "Failed to serialize cache record, value cached in memory only");
                return;
            }
        };
        if let Err(e) = self.durable.write(key, &contents) {
            // Likely out of space: drop expired records and retry once.
            debug!(key, error = %e, "Durable write failed, cleaning up and retrying");
            self.cleanup();
            if let Err(e) = self.durable.write(key, &contents) {
                warn!(key, error = %e, "Durable write failed again, value cached in memory only");
            }
        }
    }

    /// Remove a key from both tiers. Removing an absent key is a no-op.
    pub fn invalidate(&mut self, key: &str) {
        self.memory.remove(key);
        if let Err(e) = self.durable.remove(key) {
            warn!(key, error = %e, "Failed to remove durable cache record");
        }
    }

    /// Remove every entry whose key starts with `prefix` from both tiers,
    /// leaving all other keys untouched. Used to drop a whole family of
    /// parameterized keys without enumerating them.
    pub fn invalidate_prefix(&mut self, prefix: &str) {
        self.memory.retain(|key, _| !key.starts_with(prefix));
        match self.durable.keys() {
            Ok(keys) => {
                for key in keys.iter().filter(|key| key.starts_with(prefix)) {
                    if let Err(e) = self.durable.remove(key) {
                        warn!(key = %key, error = %e, "Failed to remove durable cache record");
                    }
                }
            }
            Err(e) => {
                warn!(prefix, error = %e, "Failed to list durable cache records");
            }
        }
    }

    /// Remove every entry this cache owns. Durable records outside the
    /// cache's namespace are not touched.
    pub fn clear(&mut self) {
        self.memory.clear();
        match self.durable.keys() {
            Ok(keys) => {
                for key in keys {
                    if let Err(e) = self.durable.remove(&key) {
                        warn!(key = %key, error = %e, "Failed to remove durable cache record");
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to list durable cache records");
            }
        }
    }

    /// Scan the durable tier and drop records that are expired or
    /// unreadable, returning the number removed. Runs at construction and
    /// after a failed durable write; expiry is the only mechanism bounding
    /// retained durable space.
    pub fn cleanup(&mut self) -> usize {
        let keys = match self.durable.keys() {
            Ok(keys) => keys,
            Err(e) => {
                warn!(error = %e, "Failed to list durable cache records");
                return 0;
            }
        };

        let mut removed = 0;
        for key in keys {
            let drop = match self.load_durable(&key) {
                Ok(Some(record)) => {
                    record.freshness(self.fresh_ttl, self.stale_ttl) == Freshness::Expired
                }
                Ok(None) => false,
                Err(e) => {
                    debug!(key = %key, error = %e, "Dropping unreadable cache record");
                    true
                }
            };
            if drop {
                match self.durable.remove(&key) {
                    Ok(()) => removed += 1,
                    Err(e) => {
                        warn!(key = %key, error = %e, "Failed to remove durable cache record");
                    }
                }
            }
        }
        removed
    }

    /// Classify a key's entry without deserializing the payload. `None`
    /// means the key is absent from both tiers; `Expired` entries are left
    /// for the next `get` to remove.
    pub fn freshness(&mut self, key: &str) -> Option<Freshness> {
        self.lookup(key)
            .map(|record| record.freshness(self.fresh_ttl, self.stale_ttl))
    }

    /// Number of entries in the memory tier.
    pub fn len(&self) -> usize {
        self.memory.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memory.is_empty()
    }

    /// Memory first; on a miss, fall through to durable storage and
    /// repopulate memory, since durable records are the source of truth
    /// across restarts and memory is the hot-path accelerator.
    fn lookup(&mut self, key: &str) -> Option<CacheRecord> {
        if let Some(record) = self.memory.get(key) {
            return Some(record.clone());
        }
        match self.load_durable(key) {
            Ok(Some(record)) => {
                self.memory.insert(key.to_string(), record.clone());
                Some(record)
            }
            Ok(None) => None,
            Err(e) => {
                debug!(key, error = %e, "Failed to load cache record, treating as miss");
                None
            }
        }
    }

    fn load_durable(&self, key: &str) -> Result<Option<CacheRecord>> {
        let contents = self
            .durable
            .read(key)
            .with_context(|| format!("Failed to read cache record: {}", key))?;
        match contents {
            Some(contents) => {
                let record = serde_json::from_str(&contents)
                    .with_context(|| format!("Failed to parse cache record: {}", key))?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }
}

impl Default for PersistentCache {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
