//! Redis Provider
//!
//! Networked backend delegating every operation to a Redis server through a
//! `deadpool-redis` connection pool. Values are plain strings; callers
//! serialize their own objects.

use async_trait::async_trait;
use deadpool_redis::{Config as PoolConfig, Connection, Pool, Runtime};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::keygen::CacheKey;
use crate::provider::{
    effective_ttl, CacheProvider, KeyValuePair, Pipeline, PipelineOp, PipelineReply, Ttl,
};

/// Connection settings for [`RedisProvider`].
#[derive(Debug, Clone)]
pub struct RedisOptions {
    /// Name reported by `CacheProvider::name`
    pub name: String,
    pub url: String,
    pub pool_size: usize,
    /// PING the server while connecting instead of on first use
    pub connect: bool,
    /// TTL in seconds applied to writes that carry none
    pub default_ttl: i64,
}

impl RedisOptions {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            name: "redis".to_string(),
            url: url.into(),
            pool_size: 16,
            connect: false,
            default_ttl: Config::default().default_ttl,
        }
    }

    /// Builds options from the environment config, if a Redis URL is set.
    pub fn from_config(config: &Config) -> Option<Self> {
        config.redis_url.as_ref().map(|url| Self {
            connect: config.redis_connect,
            default_ttl: config.default_ttl,
            ..Self::new(url.clone())
        })
    }
}

/// Cache provider backed by Redis.
pub struct RedisProvider {
    name: String,
    url: String,
    pool: Pool,
    default_ttl: i64,
}

impl RedisProvider {
    /// Creates the connection pool, pinging the server when `options.connect` is set.
    pub async fn connect(options: RedisOptions) -> Result<Self> {
        info!(name = %options.name, "Creating Redis connection pool...");

        let pool = PoolConfig::from_url(&options.url)
            .builder()
            .map_err(|e| CacheError::Configuration(format!("Invalid Redis config: {}", e)))?
            .max_size(options.pool_size)
            .runtime(Runtime::Tokio1)
            .build()
            .map_err(|e| CacheError::Configuration(format!("Failed to create pool: {}", e)))?;

        let provider = Self {
            name: options.name,
            url: options.url,
            pool,
            default_ttl: options.default_ttl,
        };

        if options.connect {
            provider.ping().await?;
            info!("Redis connection established");
        }

        Ok(provider)
    }

    async fn conn(&self) -> Result<Connection> {
        Ok(self.pool.get().await?)
    }

    pub async fn ping(&self) -> Result<String> {
        let mut conn = self.conn().await?;
        Ok(redis::cmd("PING").query_async(&mut *conn).await?)
    }

    pub async fn exists(&self, keys: &[CacheKey]) -> Result<usize> {
        let mut conn = self.conn().await?;
        Ok(redis::cmd("EXISTS")
            .arg(key_args(keys))
            .query_async(&mut *conn)
            .await?)
    }

    pub async fn lpush(&self, key: &str, values: &[String]) -> Result<usize> {
        self.list_push("LPUSH", key, values).await
    }

    pub async fn rpush(&self, key: &str, values: &[String]) -> Result<usize> {
        self.list_push("RPUSH", key, values).await
    }

    async fn list_push(&self, command: &str, key: &str, values: &[String]) -> Result<usize> {
        if values.is_empty() {
            return Err(CacheError::EmptyInput("list push"));
        }
        let mut conn = self.conn().await?;
        Ok(redis::cmd(command)
            .arg(key)
            .arg(values)
            .query_async(&mut *conn)
            .await?)
    }

    pub async fn lpop(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn().await?;
        Ok(redis::cmd("LPOP").arg(key).query_async(&mut *conn).await?)
    }

    pub async fn llen(&self, key: &str) -> Result<usize> {
        let mut conn = self.conn().await?;
        Ok(redis::cmd("LLEN").arg(key).query_async(&mut *conn).await?)
    }

    pub async fn lrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<String>> {
        let mut conn = self.conn().await?;
        Ok(redis::cmd("LRANGE")
            .arg(key)
            .arg(start)
            .arg(stop)
            .query_async(&mut *conn)
            .await?)
    }

    pub async fn sadd(&self, key: &str, members: &[String]) -> Result<usize> {
        if members.is_empty() {
            return Err(CacheError::EmptyInput("sadd"));
        }
        let mut conn = self.conn().await?;
        Ok(redis::cmd("SADD")
            .arg(key)
            .arg(members)
            .query_async(&mut *conn)
            .await?)
    }

    pub async fn srem(&self, key: &str, members: &[String]) -> Result<usize> {
        if members.is_empty() {
            return Err(CacheError::EmptyInput("srem"));
        }
        let mut conn = self.conn().await?;
        Ok(redis::cmd("SREM")
            .arg(key)
            .arg(members)
            .query_async(&mut *conn)
            .await?)
    }

    pub async fn smembers(&self, key: &str) -> Result<Vec<String>> {
        let mut conn = self.conn().await?;
        Ok(redis::cmd("SMEMBERS").arg(key).query_async(&mut *conn).await?)
    }

    pub async fn sismember(&self, key: &str, member: &str) -> Result<bool> {
        let mut conn = self.conn().await?;
        Ok(redis::cmd("SISMEMBER")
            .arg(key)
            .arg(member)
            .query_async(&mut *conn)
            .await?)
    }

    pub async fn scard(&self, key: &str) -> Result<usize> {
        let mut conn = self.conn().await?;
        Ok(redis::cmd("SCARD").arg(key).query_async(&mut *conn).await?)
    }

    pub async fn decr_by(&self, key: &str, by: i64) -> Result<i64> {
        let mut conn = self.conn().await?;
        Ok(redis::cmd("DECRBY")
            .arg(key)
            .arg(by)
            .query_async(&mut *conn)
            .await?)
    }

    /// Publishes a message, returning how many subscribers received it.
    pub async fn publish(&self, channel: &str, message: &str) -> Result<usize> {
        let mut conn = self.conn().await?;
        Ok(redis::cmd("PUBLISH")
            .arg(channel)
            .arg(message)
            .query_async(&mut *conn)
            .await?)
    }

    /// Opens a dedicated pub/sub connection subscribed to `channels`.
    pub async fn subscribe(&self, channels: &[String]) -> Result<redis::aio::PubSub> {
        let client = redis::Client::open(self.url.as_str())?;
        let mut pubsub = client.get_async_pubsub().await?;
        for channel in channels {
            pubsub.subscribe(channel.as_str()).await?;
        }
        Ok(pubsub)
    }

    pub async fn flush_db(&self) -> Result<()> {
        let mut conn = self.conn().await?;
        let _: () = redis::cmd("FLUSHDB").query_async(&mut *conn).await?;
        info!(name = %self.name, "Flushed Redis database");
        Ok(())
    }
}

fn key_args(keys: &[CacheKey]) -> Vec<&str> {
    keys.iter().map(CacheKey::as_str).collect()
}

/// Queues a write on a pipeline. A non-positive TTL deletes the key, since an
/// entry written already expired is never readable.
fn queue_write(pipe: &mut redis::Pipeline, key: &CacheKey, value: &str, ttl: i64) {
    if ttl > 0 {
        pipe.cmd("SET").arg(key.as_str()).arg(value).arg("EX").arg(ttl);
    } else {
        pipe.cmd("DEL").arg(key.as_str());
    }
}

#[async_trait]
impl CacheProvider<String> for RedisProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn stores_as_obj(&self) -> bool {
        false
    }

    async fn get(&self, key: &CacheKey) -> Result<String> {
        let mut conn = self.conn().await?;
        let value: Option<String> = redis::cmd("GET")
            .arg(key.as_str())
            .query_async(&mut *conn)
            .await?;
        value.ok_or_else(|| CacheError::NotFound(key.to_string()))
    }

    async fn mget(&self, keys: &[CacheKey]) -> Result<Vec<Option<String>>> {
        if keys.is_empty() {
            return Err(CacheError::EmptyInput("mget"));
        }
        let mut conn = self.conn().await?;
        let values: Vec<Option<String>> = redis::cmd("MGET")
            .arg(key_args(keys))
            .query_async(&mut *conn)
            .await?;

        if values.iter().all(Option::is_none) {
            return Err(CacheError::NoResults);
        }
        Ok(values)
    }

    async fn set(&self, key: &CacheKey, value: String, ttl: Option<Ttl>) -> Result<()> {
        let ttl = effective_ttl(ttl, self.default_ttl);
        let mut pipe = redis::pipe();
        queue_write(&mut pipe, key, &value, ttl);
        let _: () = pipe.ignore().query_async(&mut *self.conn().await?).await?;
        debug!(key = %key, ttl, "Redis set");
        Ok(())
    }

    async fn mset(&self, pairs: Vec<KeyValuePair<String>>) -> Result<()> {
        if pairs.is_empty() {
            return Err(CacheError::EmptyInput("mset"));
        }
        let mut pipe = redis::pipe();
        pipe.atomic();
        for pair in &pairs {
            queue_write(&mut pipe, &pair.key, &pair.value, effective_ttl(pair.ttl, self.default_ttl));
            pipe.ignore();
        }
        let _: () = pipe.query_async(&mut *self.conn().await?).await?;
        debug!("Redis mset of {} pairs", pairs.len());
        Ok(())
    }

    async fn del(&self, keys: &[CacheKey]) -> Result<usize> {
        if keys.is_empty() {
            return Ok(0);
        }
        let mut conn = self.conn().await?;
        Ok(redis::cmd("DEL")
            .arg(key_args(keys))
            .query_async(&mut *conn)
            .await?)
    }

    async fn expire(&self, key: &CacheKey, ttl: Ttl) -> Result<bool> {
        let mut conn = self.conn().await?;
        Ok(redis::cmd("EXPIRE")
            .arg(key.as_str())
            .arg(ttl.as_secs())
            .query_async(&mut *conn)
            .await?)
    }

    fn pipeline(&self) -> Result<Pipeline<String>> {
        Ok(Pipeline::new())
    }

    async fn exec_pipeline(&self, pipeline: Pipeline<String>) -> Result<Vec<PipelineReply<String>>> {
        if pipeline.is_empty() {
            return Ok(Vec::new());
        }

        let ops = pipeline.into_ops();
        let mut pipe = redis::pipe();
        for op in &ops {
            match op {
                PipelineOp::Get(key) => {
                    pipe.cmd("GET").arg(key.as_str());
                }
                PipelineOp::Set { key, value, ttl } => {
                    queue_write(&mut pipe, key, value, effective_ttl(*ttl, self.default_ttl));
                }
                PipelineOp::Del(key) => {
                    pipe.cmd("DEL").arg(key.as_str());
                }
                PipelineOp::Expire { key, ttl } => {
                    pipe.cmd("EXPIRE").arg(key.as_str()).arg(ttl.as_secs());
                }
            }
        }

        let raw: Vec<redis::Value> = pipe.query_async(&mut *self.conn().await?).await?;
        let replies = ops
            .iter()
            .zip(raw.iter())
            .map(|(op, value)| decode_reply(op, value))
            .collect::<Result<Vec<_>>>()?;

        debug!("Redis pipeline ran {} operations", replies.len());
        Ok(replies)
    }
}

fn decode_reply(op: &PipelineOp<String>, value: &redis::Value) -> Result<PipelineReply<String>> {
    let reply = match op {
        PipelineOp::Get(_) => PipelineReply::Value(redis::from_redis_value(value)?),
        PipelineOp::Set { .. } => PipelineReply::Stored,
        PipelineOp::Del(_) => PipelineReply::Removed(redis::from_redis_value(value)?),
        PipelineOp::Expire { .. } => PipelineReply::Updated(redis::from_redis_value(value)?),
    };
    Ok(reply)
}
