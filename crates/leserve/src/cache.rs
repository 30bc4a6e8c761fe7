//! Response cache keyed by request fingerprint

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Hex characters kept from the digest
const FINGERPRINT_LEN: usize = 16;

/// Deterministic cache key for an operation and its normalized arguments
///
/// Arguments are joined with `|` after the operation tag and hashed with
/// BLAKE3; the key is the first 16 hex characters of the digest.
pub fn fingerprint(operation: &str, args: &[&str]) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(operation.as_bytes());
    for arg in args {
        hasher.update(b"|");
        hasher.update(arg.as_bytes());
    }
    let mut key = hasher.finalize().to_hex().to_string();
    key.truncate(FINGERPRINT_LEN);
    key
}

struct Entry<V> {
    value: V,
    created: Instant,
}

/// Time-bounded map from fingerprint to response
///
/// Expired entries are treated as absent and dropped when next looked up.
pub struct ResponseCache<V> {
    entries: Mutex<HashMap<String, Entry<V>>>,
    ttl: Duration,
}

impl<V: Clone> ResponseCache<V> {
    /// Create an empty cache
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Look up a live entry
    pub fn get(&self, key: &str) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    /// Store a value, replacing any previous entry
    pub fn put(&self, key: impl Into<String>, value: V) {
        self.put_at(key, value, Instant::now());
    }

    /// Look up a live entry as of `now`
    pub fn get_at(&self, key: &str, now: Instant) -> Option<V> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let live = entries
            .get(key)
            .map(|entry| now.saturating_duration_since(entry.created) < self.ttl);
        match live {
            Some(true) => entries.get(key).map(|entry| entry.value.clone()),
            Some(false) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Store a value created at `now`
    pub fn put_at(&self, key: impl Into<String>, value: V, now: Instant) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.into(), Entry { value, created: now });
    }

    /// Number of stored entries, live or not yet evicted
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Whether nothing is stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Configured lifetime
    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}
