//! TTL response cache

use bizlens_core::CacheKey;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;
use tokio::time::Instant;

/// One memoized response payload.
#[derive(Debug, Clone)]
struct CacheEntry {
    data: Value,
    stored_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_live(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.stored_at) <= self.ttl
    }
}

/// Snapshot of the cache contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheInfo {
    /// Number of live entries
    pub entries: usize,
    /// Live keys, sorted
    pub keys: Vec<String>,
}

/// Memoizes successful read responses keyed by [`CacheKey`].
/// Thread-safe via RwLock.
#[derive(Default)]
pub struct ResponseCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a live entry.
    ///
    /// An expired entry is removed as a side effect and reported as absent.
    pub fn get(&self, key: &CacheKey) -> Option<Value> {
        let now = Instant::now();
        {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            match entries.get(key) {
                Some(entry) if entry.is_live(now) => return Some(entry.data.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if entries.get(key).is_some_and(|e| !e.is_live(now)) {
            entries.remove(key);
        }
        None
    }

    /// Store or overwrite an entry with a fresh timestamp.
    pub fn set(&self, key: CacheKey, data: Value, ttl: Duration) {
        let entry = CacheEntry {
            data,
            stored_at: Instant::now(),
            ttl,
        };
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, entry);
    }

    /// Remove every entry.
    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Live entry count and sorted keys. Expired entries are not reported.
    pub fn info(&self) -> CacheInfo {
        let now = Instant::now();
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let mut keys: Vec<String> = entries
            .iter()
            .filter(|(_, entry)| entry.is_live(now))
            .map(|(key, _)| key.as_str().to_string())
            .collect();
        keys.sort();
        CacheInfo {
            entries: keys.len(),
            keys,
        }
    }

    /// Number of stored entries, live or not yet evicted.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .map(|e| e.len())
            .unwrap_or_else(|poisoned| poisoned.into_inner().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache")
            .field("current_size", &self.len())
            .finish()
    }
}
