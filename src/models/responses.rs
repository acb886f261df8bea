//! Response DTOs for the cache server API
//!
//! Defines the structure of outgoing HTTP response bodies.

use chrono::{TimeZone, Utc};
use serde::Serialize;

use crate::cache::{CacheEntry, CacheStats};
use crate::provider::Envelope;

type JsonEnvelope = Envelope<serde_json::Value>;

/// A cached value as seen by clients
#[derive(Debug, Clone, Serialize)]
pub struct CachedValue {
    /// Stored value, null for a rejected entry
    pub value: Option<serde_json::Value>,
    /// True when the entry is a cached "no value" result
    pub rejected: bool,
}

impl From<JsonEnvelope> for CachedValue {
    fn from(envelope: JsonEnvelope) -> Self {
        let rejected = envelope.is_rejected();
        Self {
            value: envelope.into_data(),
            rejected,
        }
    }
}

/// Response body for the GET operation (GET /get/:key)
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    pub key: String,
    #[serde(flatten)]
    pub cached: CachedValue,
}

impl GetResponse {
    pub fn new(key: impl Into<String>, envelope: JsonEnvelope) -> Self {
        Self {
            key: key.into(),
            cached: envelope.into(),
        }
    }
}

/// Response body for POST /mget, aligned with the requested keys
#[derive(Debug, Clone, Serialize)]
pub struct MGetResponse {
    pub values: Vec<Option<CachedValue>>,
}

impl MGetResponse {
    pub fn new(values: Vec<Option<JsonEnvelope>>) -> Self {
        Self {
            values: values
                .into_iter()
                .map(|value| value.map(CachedValue::from))
                .collect(),
        }
    }
}

/// Response body for the SET operation (PUT /set)
#[derive(Debug, Clone, Serialize)]
pub struct SetResponse {
    /// Success message
    pub message: String,
    /// The key that was set
    pub key: String,
}

impl SetResponse {
    /// Creates a new SetResponse
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' set successfully", key),
            key,
        }
    }
}

/// Response body for POST /mset
#[derive(Debug, Clone, Serialize)]
pub struct MSetResponse {
    pub message: String,
    pub count: usize,
}

impl MSetResponse {
    pub fn new(count: usize) -> Self {
        Self {
            message: "OK".to_string(),
            count,
        }
    }
}

/// Response body for POST /del
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    pub removed: usize,
}

/// Response body for POST /expire/:key
#[derive(Debug, Clone, Serialize)]
pub struct ExpireResponse {
    pub key: String,
    /// 1 when the live key's TTL was reset, 0 otherwise
    pub updated: u8,
}

impl ExpireResponse {
    pub fn new(key: impl Into<String>, updated: bool) -> Self {
        Self {
            key: key.into(),
            updated: u8::from(updated),
        }
    }
}

/// One entry of GET /dump
#[derive(Debug, Clone, Serialize)]
pub struct DumpEntry {
    pub key: String,
    #[serde(flatten)]
    pub cached: CachedValue,
    /// Expiration time in ISO 8601 format
    pub expires_at: String,
    pub expired: bool,
}

impl From<CacheEntry<JsonEnvelope>> for DumpEntry {
    fn from(entry: CacheEntry<JsonEnvelope>) -> Self {
        let expired = entry.is_expired();
        let expires_at = Utc
            .timestamp_millis_opt(entry.expires_at)
            .single()
            .map(|at| at.to_rfc3339())
            .unwrap_or_default();
        Self {
            key: entry.key,
            cached: entry.payload.into(),
            expires_at,
            expired,
        }
    }
}

/// Response body for GET /dump, sorted by key
#[derive(Debug, Clone, Serialize)]
pub struct DumpResponse {
    pub entries: Vec<DumpEntry>,
}

impl DumpResponse {
    pub fn new(entries: impl IntoIterator<Item = CacheEntry<JsonEnvelope>>) -> Self {
        let mut entries: Vec<DumpEntry> = entries.into_iter().map(DumpEntry::from).collect();
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        Self { entries }
    }
}

/// Response body for POST /flush
#[derive(Debug, Clone, Serialize)]
pub struct FlushResponse {
    pub removed: usize,
}

/// Response body for POST /key
#[derive(Debug, Clone, Serialize)]
pub struct KeyResponse {
    pub operation: String,
    pub key: String,
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub hits: u64,
    pub misses: u64,
    pub lazy_expirations: u64,
    pub swept: u64,
    pub total_entries: usize,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl From<CacheStats> for StatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            hits: stats.hits,
            misses: stats.misses,
            lazy_expirations: stats.lazy_expirations,
            swept: stats.swept,
            total_entries: stats.total_entries,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}
