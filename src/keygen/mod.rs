//! Key Generation Module
//!
//! Canonicalizes call arguments and derives deterministic cache keys from them.

mod canonical;
mod generator;
mod value;


// Re-export public types
pub use canonical::{reduce, CanonicalValue, NIL_TOKEN};
pub use generator::{CacheKey, KeyGenerator, KEY_DIGEST_BYTES};
pub use value::{ToValue, Value};
