//! API Handlers
//!
//! HTTP request handlers exposing the in-memory provider and key generator.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::keygen::{CacheKey, KeyGenerator, ToValue, Value};
use crate::models::{
    DeleteResponse, DumpResponse, ExpireRequest, ExpireResponse, FlushResponse, GetResponse,
    HealthResponse, KeyRequest, KeyResponse, KeysRequest, MGetResponse, MSetRequest,
    MSetResponse, SetRequest, SetResponse, StatsResponse,
};
use crate::provider::{CacheProvider, Envelope, KeyValuePair, MemoryProvider, Ttl};

/// Values served over HTTP are arbitrary JSON.
pub type JsonProvider = MemoryProvider<serde_json::Value>;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<JsonProvider>,
}

impl AppState {
    pub fn new(provider: JsonProvider) -> Self {
        Self {
            provider: Arc::new(provider),
        }
    }

    /// Creates the provider from configuration on the current Tokio runtime.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(MemoryProvider::with_config(config)?))
    }
}

fn envelope_of(req: &SetRequest) -> Envelope<serde_json::Value> {
    if req.reject {
        Envelope::rejected()
    } else {
        Envelope::new(req.value.clone())
    }
}

fn cache_keys(keys: Vec<String>) -> Vec<CacheKey> {
    keys.into_iter().map(CacheKey::from).collect()
}

/// Handler for PUT /set
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let key = CacheKey::from(req.key.as_str());
    state
        .provider
        .set(&key, envelope_of(&req), req.ttl.map(Ttl::seconds))
        .await?;

    Ok(Json(SetResponse::new(req.key)))
}

/// Handler for GET /get/:key
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    let envelope = state.provider.get(&CacheKey::from(key.as_str())).await?;

    Ok(Json(GetResponse::new(key, envelope)))
}

/// Handler for POST /mget
pub async fn mget_handler(
    State(state): State<AppState>,
    Json(req): Json<KeysRequest>,
) -> Result<Json<MGetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let values = state.provider.mget(&cache_keys(req.keys)).await?;

    Ok(Json(MGetResponse::new(values)))
}

/// Handler for POST /mset
pub async fn mset_handler(
    State(state): State<AppState>,
    Json(req): Json<MSetRequest>,
) -> Result<Json<MSetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let pairs: Vec<KeyValuePair<Envelope<serde_json::Value>>> = req
        .entries
        .iter()
        .map(|entry| KeyValuePair {
            key: CacheKey::from(entry.key.as_str()),
            value: envelope_of(entry),
            ttl: entry.ttl.map(Ttl::seconds),
        })
        .collect();
    let count = pairs.len();
    state.provider.mset(pairs).await?;

    Ok(Json(MSetResponse::new(count)))
}

/// Handler for POST /del
pub async fn delete_handler(
    State(state): State<AppState>,
    Json(req): Json<KeysRequest>,
) -> Result<Json<DeleteResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let removed = state.provider.del(&cache_keys(req.keys)).await?;

    Ok(Json(DeleteResponse { removed }))
}

/// Handler for POST /expire/:key
pub async fn expire_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(req): Json<ExpireRequest>,
) -> Result<Json<ExpireResponse>> {
    let updated = state
        .provider
        .expire(&CacheKey::from(key.as_str()), Ttl::seconds(req.ttl))
        .await?;

    Ok(Json(ExpireResponse::new(key, updated)))
}

/// Handler for GET /dump
pub async fn dump_handler(State(state): State<AppState>) -> Json<DumpResponse> {
    let entries = state.provider.dump().await;

    Json(DumpResponse::new(entries.into_values()))
}

/// Handler for POST /flush
pub async fn flush_handler(State(state): State<AppState>) -> Json<FlushResponse> {
    let removed = state.provider.flush_db().await;

    Json(FlushResponse { removed })
}

/// Handler for POST /key
///
/// Derives the cache key a caller would use for `operation(args...)`.
pub async fn key_handler(Json(req): Json<KeyRequest>) -> Result<Json<KeyResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let args: Vec<Value> = req.args.iter().map(ToValue::to_value).collect();
    let generator = KeyGenerator::new(req.operation.as_str());
    let key = generator.key_for(&args)?;

    Ok(Json(KeyResponse {
        operation: generator.operation().to_string(),
        key: key.into_inner(),
    }))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let stats = state.provider.stats().await;

    Json(StatsResponse::from(stats))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
