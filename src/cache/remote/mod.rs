//! Remote Store Module
//!
//! Backend on a remote key-value server. Every key is namespaced on the wire
//! by a prefix (`cacheall:` unless configured; an empty prefix disables
//! namespacing).

pub mod client;

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::try_join_all;
use serde_json::Value;
use tracing::debug;

use crate::cache::{CacheItem, KeyPattern, Store, Ttl, DEFAULT_STORE_TTL_SECS};
use crate::config::RedisConfig;
use crate::error::Result;

pub use client::{RedisClient, RemoteClient};

/// Prefix applied when none is configured.
pub const DEFAULT_PREFIX: &str = "cacheall:";

// == Remote Store ==
#[derive(Debug, Clone)]
pub struct RemoteStore {
    client: Arc<dyn RemoteClient>,
    prefix: String,
}

impl RemoteStore {
    // == Constructor ==
    /// Wraps an existing client.
    pub fn new(client: Arc<dyn RemoteClient>, prefix: impl Into<String>) -> Self {
        Self {
            client,
            prefix: prefix.into(),
        }
    }

    /// Uses the injected client from `config`, or connects to Redis.
    pub async fn connect(config: &RedisConfig) -> Result<Self> {
        let client: Arc<dyn RemoteClient> = match &config.client {
            Some(client) => client.clone(),
            None => Arc::new(RedisClient::connect(config).await?),
        };
        Ok(Self::new(client, config.effective_prefix()))
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Build a full key with the configured prefix.
    fn prefixed_key(&self, key: &str) -> String {
        format!("{}{key}", self.prefix)
    }

    /// `KEYS` pattern matching exactly the keys under this store's prefix.
    fn namespace_glob(&self) -> String {
        format!("{}*", escape_glob(&self.prefix))
    }

    /// Lists every physical key under this store's prefix.
    async fn scan_physical_keys(&self) -> Result<Vec<String>> {
        let keys = self.client.keys(&self.namespace_glob()).await?;
        Ok(keys
            .into_iter()
            .filter(|key| key.starts_with(&self.prefix))
            .collect())
    }

    /// Lists every key under this store's prefix, returned unprefixed.
    ///
    /// Keys created after the listing are missed by whatever acts on it;
    /// keys removed meanwhile produce harmless misses.
    async fn scan_keys(&self) -> Result<Vec<String>> {
        Ok(self
            .scan_physical_keys()
            .await?
            .into_iter()
            .filter_map(|key| key.strip_prefix(&self.prefix).map(str::to_string))
            .collect())
    }
}

/// Escapes the characters `KEYS` treats as glob syntax.
fn escape_glob(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[async_trait]
impl Store for RemoteStore {
    fn name(&self) -> &'static str {
        "redis"
    }

    // == Get ==
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let raw = self.client.get(&self.prefixed_key(key)).await?;
        match raw {
            None => Ok(None),
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        }
    }

    // == Set ==
    async fn set(&self, key: &str, value: Option<Value>, ttl: Option<Ttl>) -> Result<()> {
        let Some(value) = value else {
            return Ok(());
        };

        let full_key = self.prefixed_key(key);
        let payload = serde_json::to_string(&value)?;

        match Ttl::or_default(ttl, DEFAULT_STORE_TTL_SECS) {
            Ttl::Never => self.client.set(&full_key, &payload).await,
            Ttl::Seconds(seconds) => self.client.set_ex(&full_key, &payload, seconds).await,
        }
    }

    // == Remove ==
    async fn remove(&self, key: &str) -> Result<()> {
        self.client.del(&self.prefixed_key(key)).await
    }

    // == Remove By Pattern ==
    /// Matches against keys as callers see them, without the prefix.
    async fn remove_by_pattern(&self, pattern: &KeyPattern) -> Result<()> {
        let matching: Vec<String> = self
            .scan_keys()
            .await?
            .into_iter()
            .filter(|key| pattern.is_match(key))
            .map(|key| self.prefixed_key(&key))
            .collect();

        try_join_all(matching.iter().map(|key| self.client.del(key))).await?;

        debug!(
            pattern = pattern.as_str(),
            removed = matching.len(),
            "Remote entries removed by pattern"
        );
        Ok(())
    }

    // == Clear ==
    async fn clear(&self) -> Result<()> {
        let keys = self.scan_physical_keys().await?;
        try_join_all(keys.iter().map(|key| self.client.del(key))).await?;

        debug!(prefix = %self.prefix, removed = keys.len(), "Remote entries cleared");
        Ok(())
    }

    // == Get All ==
    async fn get_all(&self) -> Result<Vec<CacheItem>> {
        let keys = self.scan_keys().await?;
        let values = try_join_all(keys.iter().map(|key| self.get(key))).await?;

        Ok(keys
            .into_iter()
            .zip(values)
            .filter_map(|(key, value)| value.map(|value| CacheItem::new(key, value)))
            .collect())
    }
}
