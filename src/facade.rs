//! Cache Facade
//!
//! The caller-facing entry point. A [`Cache`] owns at most one active store,
//! chosen by `init`. While inactive (never initialized, or initialized with
//! `is_enable = false`) every mutating call resolves to status 0 and every
//! read to an absent value; nothing fails just because caching is off.
//!
//! Re-initializing while other calls are in flight against the previous
//! store is not synchronized with them; do not re-`init` under traffic.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::cache::{open_store, CacheItem, Clock, IntoPattern, Store, SystemClock, Ttl};
use crate::config::CacheConfig;
use crate::error::Result;
use crate::middleware::ResponseCache;

// == Outcome ==
/// `{status: 0|1}` result of a mutating call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub status: u8,
}

impl Outcome {
    /// The store applied the operation.
    pub const APPLIED: Outcome = Outcome { status: 1 };
    /// Nothing happened because the facade is inactive.
    pub const NOT_APPLIED: Outcome = Outcome { status: 0 };

    pub fn is_applied(&self) -> bool {
        self.status == 1
    }
}

#[derive(Debug)]
struct ActiveStore {
    store: Arc<dyn Store>,
    default_ttl: u64,
}

// == Cache ==
#[derive(Debug, Clone)]
pub struct Cache {
    active: Arc<RwLock<Option<Arc<ActiveStore>>>>,
    clock: Arc<dyn Clock>,
}

impl Cache {
    // == Constructor ==
    /// Creates an inactive cache.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates an inactive cache whose stores read time from `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            active: Arc::new(RwLock::new(None)),
            clock,
        }
    }

    /// Creates and initializes a cache in one step.
    pub async fn from_config(config: CacheConfig) -> Result<Self> {
        let cache = Self::new();
        cache.init(config).await?;
        Ok(cache)
    }

    // == Init ==
    /// Activates the backend selected by `config`, replacing any previous one.
    ///
    /// With `is_enable = false` the cache becomes inactive instead. Backend
    /// setup failures (directory creation, remote handshake) are returned.
    pub async fn init(&self, config: CacheConfig) -> Result<()> {
        if !config.is_enable {
            info!("Cache disabled, all operations are no-ops");
            *self.active.write().await = None;
            return Ok(());
        }

        let store = open_store(&config, self.clock.clone()).await?;
        info!(
            backend = store.name(),
            default_ttl = config.ttl,
            "Cache initialized"
        );

        *self.active.write().await = Some(Arc::new(ActiveStore {
            store,
            default_ttl: config.ttl,
        }));
        Ok(())
    }

    /// Whether a store is active.
    pub async fn is_active(&self) -> bool {
        self.active.read().await.is_some()
    }

    /// Default TTL of the active store, if any.
    pub async fn default_ttl(&self) -> Option<u64> {
        self.current().await.map(|active| active.default_ttl)
    }

    async fn current(&self) -> Option<Arc<ActiveStore>> {
        self.active.read().await.clone()
    }

    // == Set ==
    /// Stores `value` under `key`. A missing or zero `ttl` uses the
    /// configured default.
    pub async fn set<T>(&self, key: &str, value: &T, ttl: Option<Ttl>) -> Result<Outcome>
    where
        T: Serialize + ?Sized,
    {
        let Some(active) = self.current().await else {
            return Ok(Outcome::NOT_APPLIED);
        };

        let value = serde_json::to_value(value)?;
        let ttl = Ttl::or_default(ttl, active.default_ttl);
        active.store.set(key, Some(value), Some(ttl)).await?;

        debug!(key, ?ttl, "Cache set");
        Ok(Outcome::APPLIED)
    }

    // == Get ==
    /// Returns the cached value; a stored `null` reads as absent.
    pub async fn get(&self, key: &str) -> Result<Option<Value>> {
        let Some(active) = self.current().await else {
            return Ok(None);
        };

        let value = active.store.get(key).await?;
        Ok(value.filter(|value| !value.is_null()))
    }

    /// Like [`Cache::get`], deserializing into `T`.
    pub async fn get_as<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: serde::de::DeserializeOwned,
    {
        match self.get(key).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    // == Get All ==
    /// Every live entry, or `None` while inactive.
    pub async fn get_all(&self) -> Result<Option<Vec<CacheItem>>> {
        let Some(active) = self.current().await else {
            return Ok(None);
        };

        Ok(Some(active.store.get_all().await?))
    }

    // == Has ==
    /// Reads the key and reports whether the value is truthy.
    ///
    /// This is a full `get`, deserialization included; `null`, `false`, `0`
    /// and `""` all report false.
    pub async fn has(&self, key: &str) -> Result<bool> {
        Ok(self.get(key).await?.as_ref().is_some_and(is_truthy))
    }

    // == Remove ==
    pub async fn remove(&self, key: &str) -> Result<Outcome> {
        let Some(active) = self.current().await else {
            return Ok(Outcome::NOT_APPLIED);
        };

        active.store.remove(key).await?;
        Ok(Outcome::APPLIED)
    }

    // == Remove By Pattern ==
    /// Removes every key matching `pattern` (regex search semantics).
    ///
    /// Memory and remote engines match the key itself. The file engine
    /// matches document file names, `<sanitized-key>.json`, so an end anchor
    /// like `_1$` must account for the extension there.
    pub async fn remove_by_pattern(&self, pattern: impl IntoPattern) -> Result<Outcome> {
        let Some(active) = self.current().await else {
            return Ok(Outcome::NOT_APPLIED);
        };

        let pattern = pattern.into_pattern()?;
        active.store.remove_by_pattern(&pattern).await?;
        Ok(Outcome::APPLIED)
    }

    // == Clear ==
    pub async fn clear(&self) -> Result<Outcome> {
        let Some(active) = self.current().await else {
            return Ok(Outcome::NOT_APPLIED);
        };

        active.store.clear().await?;
        Ok(Outcome::APPLIED)
    }

    // == Middleware ==
    /// Response-caching middleware state bound to this cache.
    ///
    /// `ttl = None` uses the default TTL; `prefix` namespaces the keys so they
    /// can be invalidated with `remove_by_pattern(prefix)`.
    pub fn middleware(&self, ttl: Option<Ttl>, prefix: Option<&str>) -> ResponseCache {
        ResponseCache::new(self.clone(), ttl, prefix.map(str::to_string))
    }
}

impl Default for Cache {
    fn default() -> Self {
        Self::new()
    }
}

/// JSON truthiness: `null`, `false`, `0` and `""` are falsy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
