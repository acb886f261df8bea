//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with absolute expiry.

use chrono::Utc;
use serde::Serialize;

// == Cache Entry ==
/// A single cache entry with its payload and absolute expiry.
#[derive(Debug, Clone, Serialize)]
pub struct CacheEntry<T> {
    /// Key the entry is stored under
    pub key: String,
    /// The stored payload
    pub payload: T,
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at: i64,
}

impl<T> CacheEntry<T> {
    // == Constructor ==
    /// Creates a new cache entry expiring `ttl_seconds` from now.
    ///
    /// A non-positive TTL yields an entry that is already expired.
    pub fn new(key: String, payload: T, ttl_seconds: i64) -> Self {
        Self {
            key,
            payload,
            expires_at: deadline_after(ttl_seconds),
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once the current time reaches its expiration time.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(current_timestamp_ms())
    }

    /// Checks expiry against a given instant in Unix milliseconds.
    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        now_ms >= self.expires_at
    }

    // == Extend ==
    /// Resets the expiry to `ttl_seconds` from now.
    pub fn extend(&mut self, ttl_seconds: i64) {
        self.expires_at = deadline_after(ttl_seconds);
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds, 0 once expired.
    pub fn ttl_remaining_ms(&self) -> i64 {
        (self.expires_at - current_timestamp_ms()).max(0)
    }

    /// Returns remaining TTL in whole seconds, 0 once expired.
    pub fn ttl_remaining(&self) -> i64 {
        self.ttl_remaining_ms() / 1000
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> i64 {
    Utc::now().timestamp_millis()
}

fn deadline_after(ttl_seconds: i64) -> i64 {
    current_timestamp_ms().saturating_add(ttl_seconds.saturating_mul(1000))
}
