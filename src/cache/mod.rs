//! Cache module for short-lived upstream responses
//!
//! Holds raw weather responses in memory keyed by normalized city name. Entries
//! past their freshness window are still returned, flagged as stale, so the
//! caller decides whether to refetch or fall back to the old payload.

mod manager;

pub use manager::{CacheEntry, ExpiringCache, DEFAULT_FRESHNESS_MINUTES};
