//! Cache configuration.
//!
//! Controls where durable records live, the key namespace they are scoped
//! under, and the two freshness windows. The defaults match the cadence of
//! slowly-changing dashboard data; tests point `storage_dir` at a temp
//! directory for isolation.

use std::path::PathBuf;

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Application name used for the default cache directory path
const APP_NAME: &str = "opscache";

/// Entries younger than this are fresh and need no refresh.
/// Balances freshness with reducing redundant backend round-trips.
const DEFAULT_FRESH_TTL_MINUTES: i64 = 5;

/// Entries older than the fresh window but younger than this are still
/// served, flagged stale so the caller can refetch in the background.
/// Anything older is treated as absent.
const DEFAULT_STALE_TTL_MINUTES: i64 = 30;

/// Key prefix scoping this cache's durable records within a directory
/// that may hold unrelated files.
const DEFAULT_NAMESPACE: &str = "cache";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Directory for durable records. `None` resolves to the platform
    /// cache directory (e.g. `~/.cache/opscache`).
    pub storage_dir: Option<PathBuf>,
    /// Namespace prefix for durable record keys.
    pub namespace: String,
    /// Fresh window, in minutes. Must be less than `stale_ttl_minutes`.
    pub fresh_ttl_minutes: i64,
    /// Stale window, in minutes.
    pub stale_ttl_minutes: i64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            storage_dir: None,
            namespace: DEFAULT_NAMESPACE.to_string(),
            fresh_ttl_minutes: DEFAULT_FRESH_TTL_MINUTES,
            stale_ttl_minutes: DEFAULT_STALE_TTL_MINUTES,
        }
    }
}

impl CacheConfig {
    pub fn fresh_ttl(&self) -> Duration {
        Duration::minutes(self.fresh_ttl_minutes)
    }

    pub fn stale_ttl(&self) -> Duration {
        Duration::minutes(self.stale_ttl_minutes)
    }

    /// The effective storage directory, or `None` when the platform has no
    /// cache directory (the cache then runs memory-only).
    pub fn resolve_storage_dir(&self) -> Option<PathBuf> {
        self.storage_dir
            .clone()
            .or_else(|| dirs::cache_dir().map(|dir| dir.join(APP_NAME)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_windows_are_ordered() {
        let config = CacheConfig::default();
        assert!(config.fresh_ttl() < config.stale_ttl());
    }

    #[test]
    fn test_explicit_storage_dir_wins() {
        let config = CacheConfig {
            storage_dir: Some(PathBuf::from("/tmp/opscache-test")),
            ..Default::default()
        };
        assert_eq!(
            config.resolve_storage_dir(),
            Some(PathBuf::from("/tmp/opscache-test"))
        );
    }
}
