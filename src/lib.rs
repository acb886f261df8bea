//! Memo Cache - Deterministic cache keys and pluggable cache providers
//!
//! Derives stable cache keys from arbitrary call arguments and stores values
//! through a common provider contract, with a TTL-expiring in-memory backend.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod keygen;
pub mod models;
pub mod provider;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use error::{CacheError, Result};
pub use keygen::{CacheKey, KeyGenerator, ToValue, Value};
pub use provider::{get_or_compute, CacheProvider, Envelope, KeyValuePair, MemoryProvider, Ttl};
pub use tasks::Sweeper;
