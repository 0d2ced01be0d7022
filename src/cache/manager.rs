//! In-memory expiring cache for raw upstream responses
//!
//! Provides an `ExpiringCache` that stores response bodies keyed by a
//! normalized lookup key, each tagged with the time it was inserted.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// Default freshness window in minutes
pub const DEFAULT_FRESHNESS_MINUTES: i64 = 30;

/// A single cached payload and its insertion time
///
/// Entries are never mutated once stored; a later `put` for the same key
/// replaces the whole entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Raw response body
    pub payload: String,
    /// When the entry was inserted
    pub created_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Returns true if the entry is older than `window` at time `now`
    ///
    /// An entry aged exactly `window` is still fresh.
    pub fn is_stale_at(&self, window: Duration, now: DateTime<Utc>) -> bool {
        now - self.created_at > window
    }

    /// Returns true if the entry is older than `window` right now
    pub fn is_stale(&self, window: Duration) -> bool {
        self.is_stale_at(window, Utc::now())
    }
}

/// Key-value store with time-based freshness
///
/// Entries past the freshness window are still returned by `get`; callers
/// check `is_stale` and refetch. Nothing is purged in the background, so an
/// expired entry stays until the same key is written again or `clear` runs.
///
/// All access goes through a single mutex. Two concurrent misses on the same
/// key may both fetch and both insert; the last writer wins.
#[derive(Debug)]
pub struct ExpiringCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    window: Duration,
}

impl Default for ExpiringCache {
    fn default() -> Self {
        Self::new(Duration::minutes(DEFAULT_FRESHNESS_MINUTES))
    }
}

impl ExpiringCache {
    /// Creates an empty cache with the given freshness window
    pub fn new(window: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            window,
        }
    }

    /// The freshness window this cache was built with
    pub fn window(&self) -> Duration {
        self.window
    }

    // The map only ever holds whole entries, so a poisoned lock is safe to reuse.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Looks up `key` without normalizing it
    ///
    /// Returns the entry whether or not it is stale.
    pub fn get(&self, key: &str) -> Option<CacheEntry> {
        self.lock().get(key).cloned()
    }

    /// Returns true if `entry` has outlived this cache's freshness window
    pub fn is_stale(&self, entry: &CacheEntry) -> bool {
        entry.is_stale(self.window)
    }

    /// Inserts or replaces the entry for `key`, stamped with the current time
    pub fn put(&self, key: impl Into<String>, payload: impl Into<String>) {
        let entry = CacheEntry {
            payload: payload.into(),
            created_at: Utc::now(),
        };
        self.lock().insert(key.into(), entry);
    }

    /// Removes every entry, returning how many were dropped
    pub fn clear(&self) -> usize {
        let mut entries = self.lock();
        let count = entries.len();
        entries.clear();
        count
    }

    /// Number of entries held, fresh or stale
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns true if the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
