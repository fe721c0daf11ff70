//! Cache records and freshness classification.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How usable a record is at read time, derived from its age.
///
/// Classification is recomputed on every read; nothing about freshness is
/// ever stored, so it decays purely with wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Within the fresh window; safe to use without a refresh.
    Fresh,
    /// Past the fresh window but within the stale window; usable for
    /// display while the caller triggers a refresh.
    Stale,
    /// Past the stale window; treated as absent.
    Expired,
}

/// The stored form of a cache entry, shared by both tiers.
///
/// Only the payload and its write time are kept. The timestamp is
/// persisted as integer milliseconds since epoch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheRecord {
    pub data: Value,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

impl CacheRecord {
    pub fn new(data: Value) -> Self {
        Self {
            data,
            timestamp: Utc::now(),
        }
    }

    pub fn age(&self) -> Duration {
        Utc::now() - self.timestamp
    }

    /// Classify this record against the given windows.
    ///
    /// A negative age (clock skew) counts as fresh.
    pub fn freshness(&self, fresh_ttl: Duration, stale_ttl: Duration) -> Freshness {
        let age = self.age();
        if age <= fresh_ttl {
            Freshness::Fresh
        } else if age <= stale_ttl {
            Freshness::Stale
        } else {
            Freshness::Expired
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fresh_ttl() -> Duration {
        Duration::minutes(5)
    }

    fn stale_ttl() -> Duration {
        Duration::minutes(30)
    }

    fn aged(minutes: i64) -> CacheRecord {
        let mut record = CacheRecord::new(json!([1, 2, 3]));
        record.timestamp = Utc::now() - Duration::minutes(minutes);
        record
    }

    #[test]
    fn test_new_record_is_fresh() {
        let record = CacheRecord::new(json!("x"));
        assert_eq!(record.freshness(fresh_ttl(), stale_ttl()), Freshness::Fresh);
    }

    #[test]
    fn test_freshness_windows() {
        assert_eq!(aged(4).freshness(fresh_ttl(), stale_ttl()), Freshness::Fresh);
        assert_eq!(aged(6).freshness(fresh_ttl(), stale_ttl()), Freshness::Stale);
        assert_eq!(aged(29).freshness(fresh_ttl(), stale_ttl()), Freshness::Stale);
        assert_eq!(aged(31).freshness(fresh_ttl(), stale_ttl()), Freshness::Expired);
    }

    #[test]
    fn test_freshness_is_monotonic_in_age() {
        // Once stale, an older read can only be stale or expired.
        let mut record = aged(6);
        assert_eq!(record.freshness(fresh_ttl(), stale_ttl()), Freshness::Stale);
        record.timestamp = record.timestamp - Duration::minutes(10);
        assert_ne!(record.freshness(fresh_ttl(), stale_ttl()), Freshness::Fresh);
        record.timestamp = record.timestamp - Duration::minutes(30);
        assert_eq!(record.freshness(fresh_ttl(), stale_ttl()), Freshness::Expired);
    }

    #[test]
    fn test_clock_skew_counts_as_fresh() {
        let record = aged(-10);
        assert_eq!(record.freshness(fresh_ttl(), stale_ttl()), Freshness::Fresh);
    }

    #[test]
    fn test_timestamp_serializes_as_epoch_millis() {
        let record = aged(0);
        let value = serde_json::to_value(&record).unwrap();
        assert!(value["timestamp"].is_i64());
        assert_eq!(value["data"], json!([1, 2, 3]));

        let parsed: CacheRecord = serde_json::from_value(value).unwrap();
        assert_eq!(
            parsed.timestamp.timestamp_millis(),
            record.timestamp.timestamp_millis()
        );
    }
}
