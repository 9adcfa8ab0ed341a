//! Remote client abstraction and its Redis implementation.

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use tracing::info;

use crate::config::RedisConfig;
use crate::error::{CacheError, Result};

// == Remote Client ==
/// The five wire operations the remote store needs. Keys passed here are
/// already prefixed.
#[async_trait]
pub trait RemoteClient: Send + Sync + std::fmt::Debug {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// SET without expiry.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// SETEX with an expiry in seconds.
    async fn set_ex(&self, key: &str, value: &str, seconds: u64) -> Result<()>;

    async fn del(&self, key: &str) -> Result<()>;

    /// KEYS with a glob pattern.
    async fn keys(&self, pattern: &str) -> Result<Vec<String>>;
}

// == Redis Client ==
/// Redis client wrapper with connection management.
#[derive(Clone)]
pub struct RedisClient {
    /// Redis connection manager (reconnecting).
    conn: ConnectionManager,
}

impl std::fmt::Debug for RedisClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisClient").finish_non_exhaustive()
    }
}

impl RedisClient {
    /// Connects to the server described by `config`.
    ///
    /// Authentication and database selection are part of the handshake, so a
    /// bad password or database index fails here rather than on first use.
    pub async fn connect(config: &RedisConfig) -> Result<Self> {
        let url = connection_url(config);
        info!(url = %mask_redis_url(&url), "Connecting to Redis");

        let client = Client::open(url.as_str()).map_err(|e| {
            CacheError::Configuration(format!("failed to create Redis client: {e}"))
        })?;

        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| CacheError::Configuration(format!("failed to connect to Redis: {e}")))?;

        info!("Successfully connected to Redis");
        Ok(Self { conn })
    }

    /// Get a mutable clone of the connection manager.
    fn conn_mut(&self) -> ConnectionManager {
        self.conn.clone()
    }

    fn map_err(e: redis::RedisError) -> CacheError {
        CacheError::Remote(e.to_string())
    }
}

#[async_trait]
impl RemoteClient for RedisClient {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn_mut();
        let value: Option<String> = conn.get(key).await.map_err(Self::map_err)?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut conn = self.conn_mut();
        let _: () = conn.set(key, value).await.map_err(Self::map_err)?;
        Ok(())
    }

    async fn set_ex(&self, key: &str, value: &str, seconds: u64) -> Result<()> {
        let mut conn = self.conn_mut();
        let _: () = conn
            .set_ex(key, value, seconds)
            .await
            .map_err(Self::map_err)?;
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<()> {
        let mut conn = self.conn_mut();
        let _: () = conn.del(key).await.map_err(Self::map_err)?;
        Ok(())
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        let mut conn = self.conn_mut();
        let keys: Vec<String> = conn.keys(pattern).await.map_err(Self::map_err)?;
        Ok(keys)
    }
}

// == Helpers ==
/// Builds `redis://[:password@]host:port/db`, or returns the configured URL.
fn connection_url(config: &RedisConfig) -> String {
    if let Some(url) = &config.url {
        return url.clone();
    }

    let auth = config
        .password
        .as_deref()
        .map(|password| format!(":{}@", percent_encode(password)))
        .unwrap_or_default();
    let database = config.database.unwrap_or(0);

    format!("redis://{auth}{}:{}/{database}", config.host, config.port)
}

/// Percent-encode a URL userinfo component
fn percent_encode(raw: &str) -> String {
    utf8_percent_encode(raw, NON_ALPHANUMERIC).to_string()
}

/// Mask password in Redis URL for safe logging.
fn mask_redis_url(url: &str) -> String {
    if let Some(at_pos) = url.find('@') {
        if let Some(colon_pos) = url[..at_pos].rfind(':') {
            let scheme_end = url.find("://").map(|p| p + 3).unwrap_or(0);
            if colon_pos >= scheme_end {
                return format!("{}:****@{}", &url[..colon_pos], &url[at_pos + 1..]);
            }
        }
    }
    url.to_string()
}
