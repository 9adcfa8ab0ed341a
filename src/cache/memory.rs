//! Memory Store Module
//!
//! In-process backend on a capacity-bounded LRU map. Values are kept as JSON
//! text so every read goes through the same deserialization as the other
//! backends.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::debug;

use crate::cache::{
    CacheEntry, CacheItem, Clock, KeyPattern, LruMap, Store, SystemClock, Ttl,
    DEFAULT_STORE_TTL_SECS,
};
use crate::error::Result;

/// Default number of entries held before LRU eviction kicks in.
pub const DEFAULT_MAX_ENTRIES: usize = 100;

// == Memory Store ==
#[derive(Debug)]
pub struct MemoryStore {
    entries: Mutex<LruMap<CacheEntry>>,
    clock: Arc<dyn Clock>,
}

impl MemoryStore {
    // == Constructor ==
    /// Creates a store holding at most `max_entries` keys.
    pub fn new(max_entries: usize) -> Self {
        Self::with_clock(max_entries, Arc::new(SystemClock))
    }

    pub fn with_clock(max_entries: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(LruMap::new(max_entries)),
            clock,
        }
    }

    /// Number of physically held entries, including expired ones not yet
    /// read and tombstones.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    fn tombstone(&self) -> CacheEntry {
        CacheEntry {
            value: Value::Null.to_string(),
            expire_at: Ttl::Never.expire_at(self.clock.now_ms()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES)
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    // == Get ==
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let now = self.clock.now_ms();
        let decoded = {
            let mut entries = self.entries.lock().await;
            let lookup = entries
                .get(key)
                .map(|entry| (!entry.is_expired_at(now)).then(|| entry.decode()));

            match lookup {
                None => None,
                Some(None) => {
                    entries.remove(key);
                    debug!(key, "Memory entry expired");
                    None
                }
                Some(Some(decoded)) => Some(decoded),
            }
        };

        tokio::task::yield_now().await;
        Ok(decoded.transpose()?)
    }

    // == Set ==
    async fn set(&self, key: &str, value: Option<Value>, ttl: Option<Ttl>) -> Result<()> {
        // Nothing to store is a successful no-op; an explicit null is stored.
        let Some(value) = value else {
            return Ok(());
        };

        let ttl = Ttl::or_default(ttl, DEFAULT_STORE_TTL_SECS);
        let entry = CacheEntry::encode(&value, ttl, self.clock.now_ms())?;

        let evicted = self.entries.lock().await.insert(key.to_string(), entry);
        if let Some(evicted) = evicted {
            debug!(key = %evicted, "Memory entry evicted by capacity");
        }

        tokio::task::yield_now().await;
        Ok(())
    }

    // == Remove ==
    async fn remove(&self, key: &str) -> Result<()> {
        self.set(key, Some(Value::Null), Some(Ttl::Never)).await
    }

    // == Remove By Pattern ==
    async fn remove_by_pattern(&self, pattern: &KeyPattern) -> Result<()> {
        let removed = {
            let mut entries = self.entries.lock().await;
            let matching: Vec<String> = entries
                .keys()
                .into_iter()
                .filter(|key| pattern.is_match(key))
                .collect();

            for key in &matching {
                entries.insert(key.clone(), self.tombstone());
            }
            matching.len()
        };

        debug!(pattern = pattern.as_str(), removed, "Memory entries removed by pattern");
        tokio::task::yield_now().await;
        Ok(())
    }

    // == Clear ==
    async fn clear(&self) -> Result<()> {
        self.entries.lock().await.clear();
        tokio::task::yield_now().await;
        Ok(())
    }

    // == Get All ==
    async fn get_all(&self) -> Result<Vec<CacheItem>> {
        let now = self.clock.now_ms();
        let entries = self.entries.lock().await;

        entries
            .iter()
            .filter(|(_, entry)| !entry.is_expired_at(now))
            .map(|(key, entry)| -> Result<CacheItem> {
                Ok(CacheItem::new(key.clone(), entry.decode()?))
            })
            .collect()
    }
}
