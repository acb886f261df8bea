//! Cache Store Module
//!
//! Process-local key/value storage with absolute per-entry expiry.
//! Callers provide the locking; every method here is one logical operation.

use std::collections::HashMap;

use crate::cache::entry::current_timestamp_ms;
use crate::cache::{CacheEntry, CacheStats};
use crate::error::{CacheError, Result};

// == Cache Store ==
/// Expiring key/value storage.
#[derive(Debug)]
pub struct CacheStore<T> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<T>>,
    /// Performance statistics
    stats: CacheStats,
}

impl<T> Default for CacheStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> CacheStore<T> {
    // == Constructor ==
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            stats: CacheStats::new(),
        }
    }

    // == Set ==
    /// Stores a payload expiring `ttl` seconds from now.
    ///
    /// Any existing entry under the key is replaced unconditionally.
    pub fn set(&mut self, key: String, payload: T, ttl: i64) {
        let entry = CacheEntry::new(key.clone(), payload, ttl);
        self.entries.insert(key, entry);
        self.stats.set_total_entries(self.entries.len());
    }

    // == Get ==
    /// Retrieves a payload by key.
    ///
    /// An expired entry is removed on the spot and reported as `Expired`;
    /// the next read of the same key reports `NotFound`.
    pub fn get(&mut self, key: &str) -> Result<T>
    where
        T: Clone,
    {
        let expired = match self.entries.get(key) {
            None => {
                self.stats.record_miss();
                return Err(CacheError::NotFound(key.to_string()));
            }
            Some(entry) => entry.is_expired(),
        };

        if expired {
            self.entries.remove(key);
            self.stats.set_total_entries(self.entries.len());
            self.stats.record_lazy_expiration();
            return Err(CacheError::Expired(key.to_string()));
        }

        self.stats.record_hit();
        self.entries
            .get(key)
            .map(|entry| entry.payload.clone())
            .ok_or_else(|| CacheError::NotFound(key.to_string()))
    }

    // == Delete ==
    /// Removes the given keys.
    ///
    /// Every requested key counts toward the result whether or not it was present.
    pub fn delete<K: AsRef<str>>(&mut self, keys: &[K]) -> usize {
        for key in keys {
            self.entries.remove(key.as_ref());
        }
        self.stats.set_total_entries(self.entries.len());
        keys.len()
    }

    // == Expire ==
    /// Resets the TTL of a live entry to `ttl` seconds from now.
    ///
    /// Returns false for absent or already expired entries, which stay unreadable.
    pub fn expire(&mut self, key: &str, ttl: i64) -> bool {
        match self.entries.get_mut(key) {
            Some(entry) if !entry.is_expired() => {
                entry.extend(ttl);
                true
            }
            _ => false,
        }
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from the store.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let now = current_timestamp_ms();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired_at(now));

        let removed = before - self.entries.len();
        self.stats.record_swept(removed);
        self.stats.set_total_entries(self.entries.len());
        removed
    }

    // == Dump ==
    /// Snapshot of every entry still physically present, expired or not.
    pub fn dump(&self) -> HashMap<String, CacheEntry<T>>
    where
        T: Clone,
    {
        self.entries.clone()
    }

    // == Flush ==
    /// Clears the store and returns how many entries it held.
    pub fn flush(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        self.stats.set_total_entries(0);
        count
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    /// Returns the current number of entries, including expired ones not yet removed.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
