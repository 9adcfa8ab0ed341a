//! cache_all - A pluggable cache with memory, file and Redis backends
//!
//! One [`Cache`] facade over interchangeable stores, with TTL expiry,
//! pattern-based invalidation and an axum response-caching middleware.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod facade;
pub mod middleware;
pub mod models;

pub use api::AppState;
pub use cache::{CacheItem, KeyPattern, Store, Ttl};
pub use config::{CacheConfig, Engine, ServerConfig};
pub use error::{CacheError, Result};
pub use facade::{Cache, Outcome};
pub use middleware::{cache_response, ResponseCache};
