//! Integration Tests for the Cache facade
//!
//! Runs the same scenarios against every engine: memory, file on a temp
//! directory, and redis through an injected in-process client.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use cache_all::cache::{Clock, ManualClock, RemoteClient};
use cache_all::{Cache, CacheConfig, CacheError, Engine, Outcome, Result, Ttl};
use serde_json::{json, Value};
use tempfile::TempDir;

// == Helpers ==

/// In-process stand-in for a Redis server.
#[derive(Debug, Default)]
struct InMemoryRedis {
    data: Mutex<BTreeMap<String, String>>,
}

impl InMemoryRedis {
    fn physical_keys(&self) -> Vec<String> {
        self.data.lock().unwrap().keys().cloned().collect()
    }
}

#[async_trait]
impl RemoteClient for InMemoryRedis {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.data.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.data.lock().unwrap().insert(key.into(), value.into());
        Ok(())
    }

    async fn set_ex(&self, key: &str, value: &str, _seconds: u64) -> Result<()> {
        self.set(key, value).await
    }

    async fn del(&self, key: &str) -> Result<()> {
        self.data.lock().unwrap().remove(key);
        Ok(())
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        let prefix = pattern.trim_end_matches('*');
        Ok(self
            .physical_keys()
            .into_iter()
            .filter(|key| key.starts_with(prefix))
            .collect())
    }
}

fn memory_config() -> CacheConfig {
    CacheConfig::default()
}

fn file_config(dir: &TempDir) -> CacheConfig {
    let mut config = CacheConfig::default();
    config.engine = Engine::File;
    config.file.path = dir.path().join("cache");
    config
}

fn redis_config(client: Arc<InMemoryRedis>, prefix: Option<&str>) -> CacheConfig {
    let mut config = CacheConfig::default();
    config.engine = Engine::Redis;
    config.redis.prefix = prefix.map(str::to_string);
    config.redis.client = Some(client as Arc<dyn RemoteClient>);
    config
}

/// One initialized cache per engine; the temp dir must outlive the file cache.
async fn all_engines() -> (Vec<(&'static str, Cache)>, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let caches = vec![
        ("memory", Cache::from_config(memory_config()).await.unwrap()),
        ("file", Cache::from_config(file_config(&dir)).await.unwrap()),
        (
            "redis",
            Cache::from_config(redis_config(Arc::new(InMemoryRedis::default()), None))
                .await
                .unwrap(),
        ),
    ];
    (caches, dir)
}

// == Scenarios on every engine ==

#[tokio::test]
async fn test_get_all_then_remove_scenario() {
    let (caches, _dir) = all_engines().await;

    for (engine, cache) in caches {
        cache.set("foo", "bar", None).await.unwrap();
        cache.set("foo1", &json!({"bar": "baz"}), None).await.unwrap();

        let items = cache.get_all().await.unwrap().unwrap();
        assert_eq!(items.len(), 2, "{engine}");

        assert_eq!(cache.remove("foo").await.unwrap(), Outcome::APPLIED);
        assert_eq!(cache.get("foo").await.unwrap(), None, "{engine}");
        assert_eq!(
            cache.get("foo1").await.unwrap(),
            Some(json!({"bar": "baz"})),
            "{engine}"
        );
    }
}

#[tokio::test]
async fn test_roundtrip_on_every_engine() {
    let (caches, _dir) = all_engines().await;
    let values = [
        json!("text"),
        json!(42),
        json!(1.5),
        json!(true),
        json!([1, "two", {"three": 3}]),
        json!({"nested": {"list": [null, false]}}),
    ];

    for (engine, cache) in caches {
        for (i, value) in values.iter().enumerate() {
            let key = format!("key{i}");
            cache.set(&key, value, None).await.unwrap();
            assert_eq!(cache.get(&key).await.unwrap().as_ref(), Some(value), "{engine}");
        }
    }
}

#[tokio::test]
async fn test_clear_twice_leaves_store_empty() {
    let (caches, _dir) = all_engines().await;

    for (engine, cache) in caches {
        cache.set("a", &1, None).await.unwrap();
        cache.set("b", &2, None).await.unwrap();

        assert_eq!(cache.clear().await.unwrap(), Outcome::APPLIED, "{engine}");
        assert_eq!(cache.clear().await.unwrap(), Outcome::APPLIED, "{engine}");
        assert_eq!(cache.get_all().await.unwrap(), Some(vec![]), "{engine}");
    }
}

#[tokio::test]
async fn test_remove_by_pattern_on_every_engine() {
    let (caches, _dir) = all_engines().await;

    for (engine, cache) in caches {
        cache.set("user_1", "a", None).await.unwrap();
        cache.set("user_2", "b", None).await.unwrap();
        cache.set("post_1", "c", None).await.unwrap();

        assert_eq!(
            cache.remove_by_pattern("^user_").await.unwrap(),
            Outcome::APPLIED
        );
        assert!(!cache.has("user_1").await.unwrap(), "{engine}");
        assert!(!cache.has("user_2").await.unwrap(), "{engine}");
        assert!(cache.has("post_1").await.unwrap(), "{engine}");
    }
}

#[tokio::test]
async fn test_has_uses_truthiness() {
    let (caches, _dir) = all_engines().await;

    for (engine, cache) in caches {
        cache.set("zero", &0, None).await.unwrap();
        cache.set("empty", "", None).await.unwrap();
        cache.set("no", &false, None).await.unwrap();
        cache.set("yes", "value", None).await.unwrap();

        assert!(!cache.has("zero").await.unwrap(), "{engine}");
        assert!(!cache.has("empty").await.unwrap(), "{engine}");
        assert!(!cache.has("no").await.unwrap(), "{engine}");
        assert!(cache.has("yes").await.unwrap(), "{engine}");
        assert!(!cache.has("missing").await.unwrap(), "{engine}");
    }
}

// == Disabled facade ==

#[tokio::test]
async fn test_disabled_cache_is_inert() {
    let mut config = CacheConfig::default();
    config.is_enable = false;
    let cache = Cache::from_config(config).await.unwrap();

    assert!(!cache.is_active().await);
    assert_eq!(cache.set("k", "v", None).await.unwrap(), Outcome::NOT_APPLIED);
    assert_eq!(cache.get("k").await.unwrap(), None);
    assert_eq!(cache.get_all().await.unwrap(), None);
    assert!(!cache.has("k").await.unwrap());
    assert_eq!(cache.remove("k").await.unwrap(), Outcome::NOT_APPLIED);
    assert_eq!(
        cache.remove_by_pattern("k").await.unwrap(),
        Outcome::NOT_APPLIED
    );
    assert_eq!(cache.clear().await.unwrap(), Outcome::NOT_APPLIED);
}

#[tokio::test]
async fn test_reinit_disabled_deactivates() {
    let cache = Cache::from_config(memory_config()).await.unwrap();
    cache.set("k", "v", None).await.unwrap();

    let mut disabled = CacheConfig::default();
    disabled.is_enable = false;
    cache.init(disabled).await.unwrap();

    assert!(!cache.is_active().await);
    assert_eq!(cache.get("k").await.unwrap(), None);
}

// == TTL ==

#[tokio::test]
async fn test_default_ttl_expiry_with_manual_clock() {
    let clock = Arc::new(ManualClock::new(1_700_000_000_000));
    let cache = Cache::with_clock(clock.clone() as Arc<dyn Clock>);
    let mut config = CacheConfig::default();
    config.ttl = 30;
    cache.init(config).await.unwrap();

    cache.set("default", "v", None).await.unwrap();
    cache.set("short", "v", Some(Ttl::Seconds(5))).await.unwrap();
    cache.set("forever", "v", Some(Ttl::Never)).await.unwrap();

    clock.advance(Duration::from_secs(5));
    assert_eq!(cache.get("short").await.unwrap(), None);
    assert_eq!(cache.get("default").await.unwrap(), Some(json!("v")));

    clock.advance(Duration::from_secs(25));
    assert_eq!(cache.get("default").await.unwrap(), None);

    clock.advance(Duration::from_secs(10 * 365 * 24 * 3600));
    assert_eq!(cache.get("forever").await.unwrap(), Some(json!("v")));
}

#[tokio::test]
async fn test_file_engine_ttl_expiry_with_manual_clock() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::new(1_700_000_000_000));
    let cache = Cache::with_clock(clock.clone() as Arc<dyn Clock>);
    cache.init(file_config(&dir)).await.unwrap();

    cache.set("k", &json!({"v": 1}), Some(Ttl::Seconds(2))).await.unwrap();
    assert!(cache.has("k").await.unwrap());

    clock.advance(Duration::from_secs(2));
    assert_eq!(cache.get("k").await.unwrap(), None);
    assert!(!dir.path().join("cache").join("k.json").exists());
}

// == Remote prefixes ==

#[tokio::test]
async fn test_remote_prefix_scenarios() {
    let cases = [
        (Some(""), "prefixKey"),
        (None, "cacheall:prefixKey"),
        (Some("custom:"), "custom:prefixKey"),
    ];

    for (prefix, physical) in cases {
        let server = Arc::new(InMemoryRedis::default());
        let cache = Cache::from_config(redis_config(server.clone(), prefix))
            .await
            .unwrap();

        cache.set("prefixKey", "value", None).await.unwrap();

        assert_eq!(server.physical_keys(), vec![physical.to_string()]);
        assert_eq!(cache.get("prefixKey").await.unwrap(), Some(json!("value")));
    }
}

// == Errors ==

#[tokio::test]
async fn test_invalid_pattern_is_rejected() {
    let cache = Cache::from_config(memory_config()).await.unwrap();
    let result = cache.remove_by_pattern("user(").await;
    assert!(matches!(result, Err(CacheError::InvalidPattern(_))));
}

#[tokio::test]
async fn test_file_engine_rejects_null() {
    let dir = tempfile::tempdir().unwrap();
    let cache = Cache::from_config(file_config(&dir)).await.unwrap();

    let result = cache.set("k", &Value::Null, None).await;
    assert!(matches!(result, Err(CacheError::InvalidValue(_))));
}

#[tokio::test]
async fn test_get_as_deserializes() {
    #[derive(Debug, PartialEq, serde::Deserialize, serde::Serialize)]
    struct Profile {
        name: String,
        age: u32,
    }

    let cache = Cache::from_config(memory_config()).await.unwrap();
    let profile = Profile {
        name: "Ada".into(),
        age: 36,
    };
    cache.set("profile", &profile, None).await.unwrap();

    assert_eq!(cache.get_as::<Profile>("profile").await.unwrap(), Some(profile));
}
