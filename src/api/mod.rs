//! API Module
//!
//! HTTP handlers and routing for operating an in-memory cache provider.
//!
//! # Endpoints
//! - `PUT /set`, `GET /get/:key`, `POST /mget`, `POST /mset`, `POST /del`,
//!   `POST /expire/:key` - provider contract operations
//! - `GET /dump`, `POST /flush` - whole-store snapshot and clear
//! - `POST /key` - Cache key generation
//! - `GET /stats`, `GET /health` - Statistics and health check

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
