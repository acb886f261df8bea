//! Request DTOs for the cache server API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

fn validate_key(key: &str) -> Option<String> {
    if key.is_empty() {
        return Some("Key cannot be empty".to_string());
    }
    if key.len() > MAX_KEY_LENGTH {
        return Some(format!(
            "Key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        ));
    }
    None
}

fn validate_keys(keys: &[String]) -> Option<String> {
    if keys.is_empty() {
        return Some("At least one key is required".to_string());
    }
    keys.iter().find_map(|key| validate_key(key))
}

/// Request body for the SET operation (PUT /set), also one entry of MSET
///
/// # Fields
/// - `key`: The cache key to store the value under
/// - `value`: Any JSON value
/// - `ttl`: Optional TTL in seconds (uses default if not specified)
/// - `reject`: Store a cached "no value" result instead of `value`
#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    pub key: String,
    #[serde(default)]
    pub value: serde_json::Value,
    #[serde(default)]
    pub ttl: Option<i64>,
    #[serde(default)]
    pub reject: bool,
}

impl SetRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        validate_key(&self.key)
    }
}

/// Request body for POST /mset
#[derive(Debug, Clone, Deserialize)]
pub struct MSetRequest {
    pub entries: Vec<SetRequest>,
}

impl MSetRequest {
    pub fn validate(&self) -> Option<String> {
        self.entries.iter().find_map(SetRequest::validate)
    }
}

/// Request body for POST /mget and POST /del
#[derive(Debug, Clone, Deserialize)]
pub struct KeysRequest {
    pub keys: Vec<String>,
}

impl KeysRequest {
    pub fn validate(&self) -> Option<String> {
        validate_keys(&self.keys)
    }
}

/// Request body for POST /expire/:key
#[derive(Debug, Clone, Deserialize)]
pub struct ExpireRequest {
    /// New TTL in seconds from now
    pub ttl: i64,
}

/// Request body for POST /key
#[derive(Debug, Clone, Deserialize)]
pub struct KeyRequest {
    /// Logical operation name
    pub operation: String,
    /// Arguments of the call, in order
    #[serde(default)]
    pub args: Vec<serde_json::Value>,
}

impl KeyRequest {
    pub fn validate(&self) -> Option<String> {
        if self.operation.is_empty() {
            return Some("Operation cannot be empty".to_string());
        }
        None
    }
}
