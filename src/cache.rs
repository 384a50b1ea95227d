//! In-memory TTL cache for computed API payloads.
//!
//! Payloads are stored as `serde_json::Value` so one cache serves every
//! endpoint. The server clears it whenever the dataset is re-imported.

use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Default time to live, overridden by `CACHE_TTL`
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

#[derive(Clone, Debug)]
struct Entry {
    value: serde_json::Value,
    stored_at: Instant,
}

/// Snapshot of the cache state, served for diagnostics
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub total_keys: usize,
    pub keys: Vec<String>,
    pub default_ttl: u64,
    pub hits: u64,
    pub misses: u64,
}

#[derive(Debug)]
pub struct ResponseCache {
    entries: HashMap<String, Entry>,
    default_ttl: Duration,
    hits: u64,
    misses: u64,
}

impl Default for ResponseCache {
    fn default() -> Self {
        ResponseCache::new(DEFAULT_TTL)
    }
}

impl ResponseCache {
    pub fn new(default_ttl: Duration) -> Self {
        ResponseCache {
            entries: HashMap::new(),
            default_ttl,
            hits: 0,
            misses: 0,
        }
    }

    /// Cached value of `key` if younger than the default TTL
    pub fn get(&mut self, key: &str) -> Option<serde_json::Value> {
        self.get_with_ttl(key, self.default_ttl)
    }

    /// Cached value of `key` if younger than `ttl`; expired entries are dropped
    pub fn get_with_ttl(&mut self, key: &str, ttl: Duration) -> Option<serde_json::Value> {
        match self.entries.get(key) {
            Some(entry) if entry.stored_at.elapsed() < ttl => {
                self.hits += 1;
                debug!("cache hit: {}", key);
                Some(entry.value.clone())
            }
            Some(_) => {
                self.entries.remove(key);
                self.misses += 1;
                debug!("cache expired: {}", key);
                None
            }
            None => {
                self.misses += 1;
                debug!("cache miss: {}", key);
                None
            }
        }
    }

    pub fn set(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.entries.insert(
            key.into(),
            Entry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    /// Drop one key, or everything when `key` is `None`
    pub fn clear(&mut self, key: Option<&str>) {
        match key {
            Some(k) => {
                self.entries.remove(k);
            }
            None => self.entries.clear(),
        }
    }

    /// Drop every key containing `pattern`
    pub fn invalidate_pattern(&mut self, pattern: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|k, _| !k.contains(pattern));
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        let mut keys: Vec<String> = self.entries.keys().cloned().collect();
        keys.sort();
        CacheStats {
            total_keys: keys.len(),
            keys,
            default_ttl: self.default_ttl.as_secs(),
            hits: self.hits,
            misses: self.misses,
        }
    }
}
