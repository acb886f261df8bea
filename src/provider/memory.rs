//! In-Memory Provider
//!
//! Process-local backend: one store behind one exclusive lock, lazy eviction
//! on read, and a background sweep reclaiming expired entries.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::cache::{CacheEntry, CacheStats, CacheStore};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::keygen::CacheKey;
use crate::provider::{effective_ttl, CacheProvider, KeyValuePair, Ttl};
use crate::tasks::Sweeper;

// == Envelope ==
/// Payload wrapper stored by the in-memory provider.
///
/// A rejected envelope is a cached "no value" result, which a reader can tell
/// apart from a key that was never cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    data: Option<T>,
    reject: bool,
}

impl<T> Envelope<T> {
    pub fn new(data: T) -> Self {
        Self {
            data: Some(data),
            reject: false,
        }
    }

    pub fn rejected() -> Self {
        Self {
            data: None,
            reject: true,
        }
    }

    pub fn is_rejected(&self) -> bool {
        self.reject
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn into_data(self) -> Option<T> {
        self.data
    }
}

// == Memory Provider ==
/// In-process cache provider with TTL expiry.
///
/// Every operation holds the store lock for its whole duration, so a batch
/// write is never observed half applied, including by the sweep.
#[derive(Debug)]
pub struct MemoryProvider<T> {
    store: Arc<Mutex<CacheStore<Envelope<T>>>>,
    default_ttl: i64,
    sweeper: Mutex<Option<Sweeper>>,
}

impl<T> MemoryProvider<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Creates a provider with default settings on the current Tokio runtime.
    ///
    /// Fails with `Runtime` when called outside a runtime, which would have
    /// nowhere to host the sweep task.
    pub fn new() -> Result<Self> {
        Self::with_config(&Config::default())
    }

    /// Creates a provider using the TTL and sweep settings of `config` on the
    /// current Tokio runtime.
    pub fn with_config(config: &Config) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|err| CacheError::Runtime(err.to_string()))?;
        Ok(Self::with_runtime(config, &runtime))
    }

    /// Creates a provider whose sweep runs on `runtime`.
    ///
    /// Usable from synchronous code that owns a runtime handle.
    pub fn with_runtime(config: &Config, runtime: &Handle) -> Self {
        let store = Arc::new(Mutex::new(CacheStore::new()));
        let sweeper = Sweeper::spawn(
            runtime,
            store.clone(),
            Duration::from_secs(config.sweep_interval),
        );
        info!(
            default_ttl = config.default_ttl,
            sweep_interval = config.sweep_interval,
            "Memory cache provider started"
        );

        Self {
            store,
            default_ttl: config.default_ttl,
            sweeper: Mutex::new(Some(sweeper)),
        }
    }

    /// TTL applied to writes that carry none.
    pub fn default_ttl(&self) -> i64 {
        self.default_ttl
    }

    /// Snapshot of every stored entry, including expired ones not yet removed.
    pub async fn dump(&self) -> HashMap<String, CacheEntry<Envelope<T>>> {
        self.store.lock().await.dump()
    }

    /// Clears the store, returning how many entries were dropped.
    pub async fn flush_db(&self) -> usize {
        let removed = self.store.lock().await.flush();
        info!("Flushed {} entries", removed);
        removed
    }

    pub async fn stats(&self) -> CacheStats {
        self.store.lock().await.stats()
    }

    /// Stops the sweep task, waiting for an in-flight pass to finish.
    ///
    /// Idempotent. The provider keeps serving reads and writes afterwards;
    /// only proactive reclamation stops.
    pub async fn shutdown(&self) {
        let sweeper = self.sweeper.lock().await.take();
        if let Some(sweeper) = sweeper {
            sweeper.shutdown().await;
        }
    }
}

#[async_trait]
impl<T> CacheProvider<Envelope<T>> for MemoryProvider<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        "memory"
    }

    fn stores_as_obj(&self) -> bool {
        true
    }

    async fn get(&self, key: &CacheKey) -> Result<Envelope<T>> {
        let result = self.store.lock().await.get(key.as_str());
        if let Err(err) = &result {
            debug!(key = %key, "Memory get missed: {}", err);
        }
        result
    }

    async fn mget(&self, keys: &[CacheKey]) -> Result<Vec<Option<Envelope<T>>>> {
        if keys.is_empty() {
            return Err(CacheError::EmptyInput("mget"));
        }

        let values: Vec<Option<Envelope<T>>> = {
            let mut store = self.store.lock().await;
            keys.iter().map(|key| store.get(key.as_str()).ok()).collect()
        };

        if values.iter().all(Option::is_none) {
            return Err(CacheError::NoResults);
        }
        Ok(values)
    }

    async fn set(&self, key: &CacheKey, value: Envelope<T>, ttl: Option<Ttl>) -> Result<()> {
        let ttl = effective_ttl(ttl, self.default_ttl);
        self.store
            .lock()
            .await
            .set(key.as_str().to_string(), value, ttl);
        debug!(key = %key, ttl, "Memory set");
        Ok(())
    }

    async fn mset(&self, pairs: Vec<KeyValuePair<Envelope<T>>>) -> Result<()> {
        if pairs.is_empty() {
            return Err(CacheError::EmptyInput("mset"));
        }

        let count = pairs.len();
        let mut store = self.store.lock().await;
        for pair in pairs {
            let ttl = effective_ttl(pair.ttl, self.default_ttl);
            store.set(pair.key.into_inner(), pair.value, ttl);
        }
        debug!("Memory mset of {} pairs", count);
        Ok(())
    }

    async fn del(&self, keys: &[CacheKey]) -> Result<usize> {
        Ok(self.store.lock().await.delete(keys))
    }

    async fn expire(&self, key: &CacheKey, ttl: Ttl) -> Result<bool> {
        Ok(self.store.lock().await.expire(key.as_str(), ttl.as_secs()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::get_or_compute;

    fn key(k: &str) -> CacheKey {
        CacheKey::from(k)
    }

    fn provider() -> MemoryProvider<String> {
        MemoryProvider::new().unwrap()
    }

    /// Sweep slow enough that reads observe expiry before it runs.
    fn lazy_provider() -> MemoryProvider<String> {
        let config = Config {
            sweep_interval: 60,
            ..Config::default()
        };
        MemoryProvider::with_config(&config).unwrap()
    }

    #[tokio::test]
    async fn test_identity() {
        let provider = provider();
        assert_eq!(provider.name(), "memory");
        assert!(provider.stores_as_obj());
        assert_eq!(provider.default_ttl(), 300);
        provider.shutdown().await;
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let provider = provider();

        provider
            .set(&key("k"), Envelope::new("v".to_string()), Some(Ttl::seconds(60)))
            .await
            .unwrap();
        let envelope = provider.get(&key("k")).await.unwrap();

        assert_eq!(envelope.data(), Some(&"v".to_string()));
        assert!(!envelope.is_rejected());
    }

    #[tokio::test]
    async fn test_rejected_is_distinct_from_missing() {
        let provider = provider();

        provider
            .set(&key("negative"), Envelope::rejected(), None)
            .await
            .unwrap();

        let cached = provider.get(&key("negative")).await.unwrap();
        assert!(cached.is_rejected());
        assert!(cached.into_data().is_none());
        assert!(matches!(
            provider.get(&key("never")).await,
            Err(CacheError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_ttl_expiry_then_not_found() {
        let provider = lazy_provider();

        provider
            .set(&key("k"), Envelope::new("v".to_string()), Some(Ttl::seconds(1)))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(1100)).await;

        assert!(matches!(
            provider.get(&key("k")).await,
            Err(CacheError::Expired(_))
        ));
        assert!(matches!(
            provider.get(&key("k")).await,
            Err(CacheError::NotFound(_))
        ));

        let stats = provider.stats().await;
        assert_eq!(stats.lazy_expirations, 1);
        assert_eq!(stats.swept, 0);
        provider.shutdown().await;
    }

    #[test]
    fn test_new_outside_runtime_fails() {
        let result = MemoryProvider::<String>::new();
        assert!(matches!(result, Err(CacheError::Runtime(_))));
    }

    #[test]
    fn test_with_runtime_from_sync_code() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let provider = MemoryProvider::<String>::with_runtime(&Config::default(), runtime.handle());

        runtime.block_on(async {
            provider
                .set(&key("k"), Envelope::new("v".to_string()), None)
                .await
                .unwrap();
            assert!(provider.get(&key("k")).await.is_ok());
            provider.shutdown().await;
        });
    }

    #[tokio::test]
    async fn test_expire_extends_live_key() {
        let provider = provider();

        provider
            .set(&key("k"), Envelope::new("v".to_string()), Some(Ttl::seconds(1)))
            .await
            .unwrap();
        assert!(provider.expire(&key("k"), Ttl::seconds(60)).await.unwrap());

        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert!(provider.get(&key("k")).await.is_ok());
    }

    #[tokio::test]
    async fn test_expire_never_resurrects() {
        let provider = provider();

        provider
            .set(&key("k"), Envelope::new("v".to_string()), Some(Ttl::seconds(0)))
            .await
            .unwrap();

        assert!(!provider.expire(&key("k"), Ttl::seconds(60)).await.unwrap());
        assert!(!provider.expire(&key("absent"), Ttl::seconds(60)).await.unwrap());
        assert!(provider.get(&key("k")).await.is_err());
        assert!(provider.get(&key("absent")).await.is_err());
    }

    #[tokio::test]
    async fn test_mget_partial_hit() {
        let provider = provider();

        provider
            .set(&key("k2"), Envelope::new("two".to_string()), None)
            .await
            .unwrap();

        let values = provider
            .mget(&[key("k1"), key("k2"), key("k3")])
            .await
            .unwrap();

        assert_eq!(values.len(), 3);
        assert!(values[0].is_none());
        assert_eq!(
            values[1].as_ref().and_then(Envelope::data),
            Some(&"two".to_string())
        );
        assert!(values[2].is_none());
    }

    #[tokio::test]
    async fn test_mget_all_missing() {
        let provider = provider();
        let result = provider.mget(&[key("a"), key("b")]).await;
        assert!(matches!(result, Err(CacheError::NoResults)));
        assert!(matches!(
            provider.mget(&[]).await,
            Err(CacheError::EmptyInput(_))
        ));
    }

    #[tokio::test]
    async fn test_mset_applies_default_and_explicit_ttl() {
        let provider = provider();

        provider
            .mset(vec![
                KeyValuePair::new("a", Envelope::new("1".to_string())),
                KeyValuePair::new("b", Envelope::new("2".to_string())).with_ttl(Ttl::seconds(-1)),
            ])
            .await
            .unwrap();

        assert!(provider.get(&key("a")).await.is_ok());
        assert!(matches!(
            provider.get(&key("b")).await,
            Err(CacheError::Expired(_))
        ));

        let dump = provider.dump().await;
        assert!(dump["a"].ttl_remaining() > 290);
    }

    #[tokio::test]
    async fn test_mset_empty_fails() {
        let provider = provider();
        assert!(matches!(
            provider.mset(Vec::new()).await,
            Err(CacheError::EmptyInput("mset"))
        ));
    }

    #[tokio::test]
    async fn test_del_is_idempotent() {
        let provider = provider();

        provider
            .set(&key("k"), Envelope::new("v".to_string()), None)
            .await
            .unwrap();

        assert_eq!(provider.del(&[key("k"), key("missing")]).await.unwrap(), 2);
        assert_eq!(provider.del(&[key("k")]).await.unwrap(), 1);
        assert!(provider.get(&key("k")).await.is_err());
    }

    #[tokio::test]
    async fn test_pipeline_unsupported() {
        let provider = provider();
        assert!(matches!(
            provider.pipeline(),
            Err(CacheError::Unsupported("pipeline"))
        ));
        let result = provider
            .exec_pipeline(crate::provider::Pipeline::new().get("k"))
            .await;
        assert!(matches!(result, Err(CacheError::Unsupported(_))));
    }

    #[tokio::test]
    async fn test_dump_and_flush() {
        let provider = provider();

        provider
            .set(&key("a"), Envelope::new("1".to_string()), None)
            .await
            .unwrap();
        provider
            .set(&key("b"), Envelope::new("2".to_string()), None)
            .await
            .unwrap();

        assert_eq!(provider.dump().await.len(), 2);
        assert_eq!(provider.flush_db().await, 2);
        assert!(provider.dump().await.is_empty());
        assert_eq!(provider.stats().await.total_entries, 0);
    }

    #[tokio::test]
    async fn test_get_or_compute_caches_result() {
        let provider = provider();
        let k = key("expensive");

        let first = get_or_compute(&provider, &k, None, || async {
            Envelope::new("computed".to_string())
        })
        .await
        .unwrap();
        let second = get_or_compute(&provider, &k, None, || async {
            Envelope::new("recomputed".to_string())
        })
        .await
        .unwrap();

        assert_eq!(first.data(), Some(&"computed".to_string()));
        assert_eq!(second.data(), Some(&"computed".to_string()));
    }

    #[tokio::test]
    async fn test_shutdown_is_idempotent() {
        let provider = provider();
        provider.shutdown().await;
        provider.shutdown().await;

        // Still usable, only the sweep stopped
        provider
            .set(&key("k"), Envelope::new("v".to_string()), None)
            .await
            .unwrap();
        assert!(provider.get(&key("k")).await.is_ok());
    }
}
