//! Short-lived indicator cache
//!
//! Entries are reused only while younger than the freshness window, so the
//! rate-limited indicator provider sees at most one request pair per symbol
//! per window. Stale entries are superseded in place, never deleted.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;

use super::IndicatorSnapshot;

/// Millisecond clock, injectable so tests control entry age.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

/// Wall-clock implementation used outside of tests.
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// A cached indicator reading plus the instant it was fetched.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub snapshot: IndicatorSnapshot,
    pub fetched_at_ms: i64,
}

/// Process-wide snapshot cache keyed by normalized symbol.
///
/// The map is guarded because two classify calls for the same symbol can
/// interleave a read-then-write. Both fetching on a shared miss is benign:
/// entries are idempotent snapshots and the later write supersedes.
pub struct IndicatorCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    freshness_ms: i64,
    clock: Arc<dyn Clock>,
}

impl IndicatorCache {
    pub fn new(freshness_ms: i64, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            freshness_ms,
            clock,
        }
    }

    pub fn with_system_clock(freshness_ms: i64) -> Self {
        Self::new(freshness_ms, Arc::new(SystemClock))
    }

    /// Returns the cached snapshot if one exists and is still fresh.
    /// Entries at or beyond the freshness window are treated as absent.
    pub async fn get(&self, symbol: &str) -> Option<IndicatorSnapshot> {
        let entries = self.entries.read().await;
        let entry = entries.get(symbol)?;
        let age_ms = self.clock.now_millis() - entry.fetched_at_ms;
        if age_ms < self.freshness_ms {
            Some(entry.snapshot)
        } else {
            None
        }
    }

    /// Stores a fresh entry, overwriting any prior entry for the symbol.
    pub async fn put(&self, symbol: &str, snapshot: IndicatorSnapshot) {
        let entry = CacheEntry {
            snapshot,
            fetched_at_ms: self.clock.now_millis(),
        };
        let mut entries = self.entries.write().await;
        entries.insert(symbol.to_string(), entry);
    }

    /// Number of distinct symbols ever cached (stale entries included).
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}
