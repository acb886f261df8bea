//! Background Tasks Module
//!
//! Contains background tasks that run for the lifetime of a provider.
//!
//! # Tasks
//! - Expiry Sweep: Removes expired entries at a fixed interval

mod sweep;

pub use sweep::Sweeper;
