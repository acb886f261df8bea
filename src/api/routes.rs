//! API Routes
//!
//! Configures the Axum router with all cache server endpoints.

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    delete_handler, dump_handler, expire_handler, flush_handler, get_handler, health_handler,
    key_handler, mget_handler, mset_handler, set_handler, stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `PUT /set` - Store a value
/// - `GET /get/:key` - Retrieve a value by key
/// - `POST /mget` - Retrieve several values, aligned with the keys
/// - `POST /mset` - Store several values
/// - `POST /del` - Delete keys
/// - `POST /expire/:key` - Reset the TTL of a live key
/// - `GET /dump` - Snapshot of the store
/// - `POST /flush` - Clear the store
/// - `POST /key` - Derive a cache key from an operation and arguments
/// - `GET /stats` - Get cache statistics
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/set", put(set_handler))
        .route("/get/:key", get(get_handler))
        .route("/mget", post(mget_handler))
        .route("/mset", post(mset_handler))
        .route("/del", post(delete_handler))
        .route("/expire/:key", post(expire_handler))
        .route("/dump", get(dump_handler))
        .route("/flush", post(flush_handler))
        .route("/key", post(key_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
