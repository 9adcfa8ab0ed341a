//! Configuration Module
//!
//! Cache configuration with defaults, serde deserialization (every field
//! optional, merged over the defaults) and environment loading.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Deserialize;
use tracing::warn;

use crate::cache::{RemoteClient, DEFAULT_MAX_ENTRIES, DEFAULT_PREFIX};

/// Default TTL in seconds applied by the facade.
pub const DEFAULT_TTL_SECS: u64 = 90;

// == Engine ==
/// Backend selected at `init` time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    #[default]
    Memory,
    File,
    Redis,
}

impl std::str::FromStr for Engine {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(Engine::Memory),
            "file" => Ok(Engine::File),
            "redis" => Ok(Engine::Redis),
            other => Err(format!(
                "unknown cache engine '{other}', expected memory, file or redis"
            )),
        }
    }
}

// == Cache Config ==
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub engine: Engine,
    /// When false, `init` leaves the facade inactive
    #[serde(alias = "isEnable")]
    pub is_enable: bool,
    /// Default TTL in seconds for writes without an explicit TTL
    #[serde(alias = "expire_in", alias = "expireIn")]
    pub ttl: u64,
    pub file: FileConfig,
    pub memory: MemoryConfig,
    pub redis: RedisConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Root directory of the cache documents
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Maximum number of entries before LRU eviction
    #[serde(alias = "maxEntries")]
    pub max_entries: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RedisConfig {
    pub host: String,
    pub port: u16,
    pub password: Option<String>,
    /// Logical database index selected on connect
    pub database: Option<i64>,
    /// Key namespace. `None` uses `cacheall:`; `Some("")` disables namespacing.
    pub prefix: Option<String>,
    /// Full connection URL, overriding host/port/password/database
    pub url: Option<String>,
    /// Ready-made client used instead of connecting
    #[serde(skip)]
    pub client: Option<Arc<dyn RemoteClient>>,
}

impl RedisConfig {
    /// Prefix actually applied to keys.
    pub fn effective_prefix(&self) -> &str {
        self.prefix.as_deref().unwrap_or(DEFAULT_PREFIX)
    }
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_ENGINE` - memory, file or redis (default: memory)
    /// - `CACHE_ENABLED` - enable switch: true/false, 1/0, yes/no, on/off (default: true)
    /// - `CACHE_TTL` - default TTL in seconds (default: 90)
    /// - `CACHE_FILE_PATH` - file engine root (default: `<cwd>/storage/cache`)
    /// - `CACHE_MAX_ENTRIES` - memory engine capacity (default: 100)
    /// - `REDIS_URL`, `REDIS_HOST`, `REDIS_PORT`, `REDIS_PASSWORD`,
    ///   `REDIS_DATABASE`, `REDIS_PREFIX` - remote engine connection
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            engine: parse_env("CACHE_ENGINE").unwrap_or(defaults.engine),
            is_enable: parse_env_with("CACHE_ENABLED", parse_flag)
                .unwrap_or(defaults.is_enable),
            ttl: parse_env("CACHE_TTL").unwrap_or(defaults.ttl),
            file: FileConfig {
                path: env::var("CACHE_FILE_PATH")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.file.path),
            },
            memory: MemoryConfig {
                max_entries: parse_env("CACHE_MAX_ENTRIES")
                    .unwrap_or(defaults.memory.max_entries),
            },
            redis: RedisConfig {
                host: env::var("REDIS_HOST").unwrap_or(defaults.redis.host),
                port: parse_env("REDIS_PORT").unwrap_or(defaults.redis.port),
                password: env::var("REDIS_PASSWORD").ok(),
                database: parse_env("REDIS_DATABASE"),
                prefix: env::var("REDIS_PREFIX").ok(),
                url: env::var("REDIS_URL").ok(),
                client: None,
            },
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    parse_env_with(name, |raw| raw.parse().ok())
}

/// Reads `name` and parses it; a set but unparsable value falls back with a warning.
fn parse_env_with<T>(name: &str, parse: impl FnOnce(&str) -> Option<T>) -> Option<T> {
    let raw = env::var(name).ok()?;
    let parsed = parse(raw.trim());
    if parsed.is_none() {
        warn!(var = name, value = %raw, "Ignoring unparsable environment value, using default");
    }
    parsed
}

/// Parses an on/off switch, case-insensitively.
fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            engine: Engine::default(),
            is_enable: true,
            ttl: DEFAULT_TTL_SECS,
            file: FileConfig::default(),
            memory: MemoryConfig::default(),
            redis: RedisConfig::default(),
        }
    }
}

impl Default for FileConfig {
    fn default() -> Self {
        let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            path: cwd.join("storage").join("cache"),
        }
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 6379,
            password: None,
            database: None,
            prefix: None,
            url: None,
            client: None,
        }
    }
}

// == Server Config ==
/// Settings of the demo HTTP service.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP server port
    pub server_port: u16,
}

impl ServerConfig {
    /// Loads `SERVER_PORT` (default: 3000).
    pub fn from_env() -> Self {
        Self {
            server_port: parse_env("SERVER_PORT").unwrap_or(3000),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { server_port: 3000 }
    }
}
