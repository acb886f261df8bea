//! Cache Module
//!
//! Process-local storage with absolute TTL expiry, shared by the in-memory provider.

mod entry;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::{current_timestamp_ms, CacheEntry};
pub use stats::CacheStats;
pub use store::CacheStore;
