//! Store Module
//!
//! The contract every backend implements, and the factory selecting one by
//! configuration.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use crate::cache::{CacheItem, Clock, FileStore, KeyPattern, MemoryStore, RemoteStore, Ttl};
use crate::config::{CacheConfig, Engine};
use crate::error::Result;

// == Store Trait ==
/// Asynchronous key-value store with TTL expiry.
///
/// Stores are shared behind `Arc<dyn Store>`; no operation is transactional
/// and concurrent writers to one key race with last-write-wins semantics.
#[async_trait]
pub trait Store: Send + Sync + std::fmt::Debug {
    /// Short backend name used in logs.
    fn name(&self) -> &'static str;

    /// Returns the stored value, or `None` if absent or expired.
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Stores `value` under `key`.
    ///
    /// `value = None` carries "nothing to store"; how it is treated is
    /// backend specific. `ttl = None` uses the store default of 60 seconds.
    async fn set(&self, key: &str, value: Option<Value>, ttl: Option<Ttl>) -> Result<()>;

    async fn remove(&self, key: &str) -> Result<()>;

    /// Removes every key matching `pattern`.
    async fn remove_by_pattern(&self, pattern: &KeyPattern) -> Result<()>;

    async fn clear(&self) -> Result<()>;

    /// Returns every live entry.
    async fn get_all(&self) -> Result<Vec<CacheItem>>;
}

// == Factory ==
/// Builds and initializes the backend selected by `config.engine`.
///
/// Waits for the backend's own setup (directory listing, remote handshake)
/// and fails if it does.
pub async fn open_store(config: &CacheConfig, clock: Arc<dyn Clock>) -> Result<Arc<dyn Store>> {
    let store: Arc<dyn Store> = match config.engine {
        Engine::Memory => {
            info!(
                max_entries = config.memory.max_entries,
                "Initializing in-memory cache store"
            );
            Arc::new(MemoryStore::with_clock(config.memory.max_entries, clock))
        }
        Engine::File => {
            info!(path = %config.file.path.display(), "Initializing file cache store");
            Arc::new(FileStore::open_with_clock(&config.file.path, clock).await?)
        }
        Engine::Redis => {
            info!("Initializing remote cache store");
            Arc::new(RemoteStore::connect(&config.redis).await?)
        }
    };

    Ok(store)
}
