//! Cache Provider Module
//!
//! The contract every cache backend satisfies, plus the shared batching types.
//!
//! # Backends
//! - `memory` - process-local store with TTL expiry and a background sweep
//! - `remote` - Redis-backed store (cargo feature `redis`)

mod memory;
#[cfg(feature = "redis")]
mod remote;

use std::future::Future;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CacheError, Result};
use crate::keygen::CacheKey;

pub use memory::{Envelope, MemoryProvider};
#[cfg(feature = "redis")]
pub use remote::{RedisOptions, RedisProvider};

// == TTL ==
/// Time-to-live in seconds from the moment of a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ttl(i64);

impl Ttl {
    pub const fn seconds(secs: i64) -> Self {
        Self(secs)
    }

    pub const fn as_secs(self) -> i64 {
        self.0
    }
}

impl From<i64> for Ttl {
    fn from(secs: i64) -> Self {
        Self(secs)
    }
}

/// Resolves an optional TTL against a backend default.
pub(crate) fn effective_ttl(ttl: Option<Ttl>, default_ttl: i64) -> i64 {
    ttl.map_or(default_ttl, Ttl::as_secs)
}

// == Key Value Pair ==
/// One write of a batched `mset`.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyValuePair<T> {
    pub key: CacheKey,
    pub value: T,
    /// Falls back to the backend default when absent
    pub ttl: Option<Ttl>,
}

impl<T> KeyValuePair<T> {
    pub fn new(key: impl Into<CacheKey>, value: T) -> Self {
        Self {
            key: key.into(),
            value,
            ttl: None,
        }
    }

    pub fn with_ttl(mut self, ttl: Ttl) -> Self {
        self.ttl = Some(ttl);
        self
    }
}

// == Pipeline ==
/// A queued operation of a [`Pipeline`].
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOp<T> {
    Get(CacheKey),
    Set {
        key: CacheKey,
        value: T,
        ttl: Option<Ttl>,
    },
    Del(CacheKey),
    Expire {
        key: CacheKey,
        ttl: Ttl,
    },
}

/// Result of one pipelined operation, in queue order.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineReply<T> {
    Value(Option<T>),
    Stored,
    Removed(usize),
    Updated(bool),
}

/// Operations queued for a single round trip.
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline<T> {
    ops: Vec<PipelineOp<T>>,
}

impl<T> Default for Pipeline<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Pipeline<T> {
    pub fn new() -> Self {
        Self { ops: Vec::new() }
    }

    pub fn get(mut self, key: impl Into<CacheKey>) -> Self {
        self.ops.push(PipelineOp::Get(key.into()));
        self
    }

    pub fn set(mut self, key: impl Into<CacheKey>, value: T, ttl: Option<Ttl>) -> Self {
        self.ops.push(PipelineOp::Set {
            key: key.into(),
            value,
            ttl,
        });
        self
    }

    pub fn del(mut self, key: impl Into<CacheKey>) -> Self {
        self.ops.push(PipelineOp::Del(key.into()));
        self
    }

    pub fn expire(mut self, key: impl Into<CacheKey>, ttl: Ttl) -> Self {
        self.ops.push(PipelineOp::Expire {
            key: key.into(),
            ttl,
        });
        self
    }

    pub fn ops(&self) -> &[PipelineOp<T>] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<PipelineOp<T>> {
        self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

// == Cache Provider ==
/// Capability set of a cache backend storing values of type `T`.
///
/// No operation retries internally. `NotFound`, `Expired` and `NoResults`
/// mean "recompute"; `Unsupported` is a wiring error.
#[async_trait]
pub trait CacheProvider<T>: Send + Sync
where
    T: Send + 'static,
{
    /// Identifying name of the backend
    fn name(&self) -> &str;

    /// Whether values are stored as native objects rather than serialized by the caller
    fn stores_as_obj(&self) -> bool;

    async fn get(&self, key: &CacheKey) -> Result<T>;

    /// Values aligned with `keys`; fails with `NoResults` only when every key misses.
    async fn mget(&self, keys: &[CacheKey]) -> Result<Vec<Option<T>>>;

    /// Stores a value; without a TTL the backend default applies.
    async fn set(&self, key: &CacheKey, value: T, ttl: Option<Ttl>) -> Result<()>;

    /// Stores every pair; fails with `EmptyInput` on an empty batch.
    async fn mset(&self, pairs: Vec<KeyValuePair<T>>) -> Result<()>;

    /// Removes keys and reports how many were removed.
    async fn del(&self, keys: &[CacheKey]) -> Result<usize>;

    /// Resets the TTL of a live key. Returns false (0) for absent or expired keys.
    async fn expire(&self, key: &CacheKey, ttl: Ttl) -> Result<bool>;

    /// Starts a batched pipeline, if the backend supports one.
    fn pipeline(&self) -> Result<Pipeline<T>> {
        Err(CacheError::Unsupported("pipeline"))
    }

    /// Runs a pipeline in one round trip.
    async fn exec_pipeline(&self, _pipeline: Pipeline<T>) -> Result<Vec<PipelineReply<T>>> {
        Err(CacheError::Unsupported("pipeline"))
    }
}

/// Returns the cached value for `key`, computing and storing it on a miss.
///
/// Any error other than a miss is returned without calling `compute`.
pub async fn get_or_compute<T, P, F, Fut>(
    provider: &P,
    key: &CacheKey,
    ttl: Option<Ttl>,
    compute: F,
) -> Result<T>
where
    T: Clone + Send + 'static,
    P: CacheProvider<T> + ?Sized,
    F: FnOnce() -> Fut,
    Fut: Future<Output = T>,
{
    match provider.get(key).await {
        Ok(value) => Ok(value),
        Err(err) if err.is_miss() => {
            debug!(provider = provider.name(), key = %key, "Cache miss, computing value");
            let value = compute().await;
            provider.set(key, value.clone(), ttl).await?;
            Ok(value)
        }
        Err(err) => Err(err),
    }
}
