//! File Store Module
//!
//! One JSON document per key under a root directory.
//!
//! The in-memory key index is authoritative: a document on disk whose key is
//! not indexed is treated as not cached. The index is built from a single
//! directory listing when the store opens and is then maintained by the
//! store's own operations, so files written behind its back are ignored.

use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::cache::{
    CacheEntry, CacheItem, Clock, KeyPattern, Store, SystemClock, Ttl, DEFAULT_STORE_TTL_SECS,
};
use crate::error::{CacheError, Result};

const EXTENSION: &str = ".json";

/// Longest file name (in bytes) a sanitized key may produce, extension excluded.
const MAX_FILE_STEM: usize = 255 - EXTENSION.len();

// == On-disk Document ==
/// Document shape: `{"value": "<json>", "expire": "<epoch-ms or -1>"}`.
#[derive(Debug, Serialize, Deserialize)]
struct FileDocument {
    value: String,
    expire: String,
}

impl FileDocument {
    fn from_entry(entry: &CacheEntry) -> Result<Self> {
        Ok(Self {
            value: entry.value.clone(),
            expire: serde_json::to_string(&entry.expire_at)?,
        })
    }

    fn into_entry(self) -> Result<CacheEntry> {
        Ok(CacheEntry {
            expire_at: serde_json::from_str(&self.expire)?,
            value: self.value,
        })
    }
}

// == File Store ==
#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
    index: RwLock<HashSet<String>>,
    clock: Arc<dyn Clock>,
}

impl FileStore {
    // == Constructor ==
    /// Opens (creating if needed) the cache directory at `root` and indexes
    /// the documents already in it.
    pub async fn open(root: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_clock(root, Arc::new(SystemClock)).await
    }

    pub async fn open_with_clock(root: impl AsRef<Path>, clock: Arc<dyn Clock>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        fs::create_dir_all(&root).await.map_err(|e| {
            CacheError::Configuration(format!(
                "failed to create cache directory {}: {e}",
                root.display()
            ))
        })?;

        let keys = list_keys(&root).await.map_err(|e| {
            CacheError::Configuration(format!(
                "failed to list cache directory {}: {e}",
                root.display()
            ))
        })?;

        info!(path = %root.display(), keys = keys.len(), "File cache index built");
        Ok(Self {
            root,
            index: RwLock::new(keys.into_iter().collect()),
            clock,
        })
    }

    /// Root directory of the cache documents.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the document holding an already sanitized key.
    fn document_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}{EXTENSION}"))
    }

    async fn is_indexed(&self, key: &str) -> bool {
        self.index.read().await.contains(key)
    }

    async fn delete_document(&self, key: &str) -> Result<()> {
        let path = self.document_path(key);
        match fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(CacheError::io(path, e)),
        }
        self.index.write().await.remove(key);
        Ok(())
    }
}

#[async_trait]
impl Store for FileStore {
    fn name(&self) -> &'static str {
        "file"
    }

    // == Get ==
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let key = sanitize_key(key);
        if !self.is_indexed(&key).await {
            return Ok(None);
        }

        let path = self.document_path(&key);
        let raw = match fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CacheError::io(path, e)),
        };

        let entry = serde_json::from_str::<FileDocument>(&raw)?.into_entry()?;
        if entry.is_expired_at(self.clock.now_ms()) {
            debug!(key = %key, "File entry expired");
            self.delete_document(&key).await?;
            return Ok(None);
        }

        Ok(Some(entry.decode()?))
    }

    // == Set ==
    async fn set(&self, key: &str, value: Option<Value>, ttl: Option<Ttl>) -> Result<()> {
        let value = match value {
            None | Some(Value::Null) => {
                return Err(CacheError::InvalidValue("val not set".to_string()))
            }
            Some(value) => value,
        };

        let key = sanitize_key(key);
        let ttl = Ttl::or_default(ttl, DEFAULT_STORE_TTL_SECS);
        let entry = CacheEntry::encode(&value, ttl, self.clock.now_ms())?;
        let document = serde_json::to_string_pretty(&FileDocument::from_entry(&entry)?)?;

        let path = self.document_path(&key);
        fs::write(&path, document)
            .await
            .map_err(|e| CacheError::io(path, e))?;

        self.index.write().await.insert(key);
        Ok(())
    }

    // == Remove ==
    async fn remove(&self, key: &str) -> Result<()> {
        self.delete_document(&sanitize_key(key)).await
    }

    // == Remove By Pattern ==
    /// Matches against file names in the directory itself, not the index.
    async fn remove_by_pattern(&self, pattern: &KeyPattern) -> Result<()> {
        let mut dir = fs::read_dir(&self.root)
            .await
            .map_err(|e| CacheError::io(&self.root, e))?;

        let mut cleared = Vec::new();
        while let Some(item) = dir
            .next_entry()
            .await
            .map_err(|e| CacheError::io(&self.root, e))?
        {
            let file_name = item.file_name().to_string_lossy().into_owned();
            if !pattern.is_match(&file_name) {
                continue;
            }

            let path = item.path();
            match fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(CacheError::io(path, e)),
            }
            cleared.push(key_from_file_name(&file_name).to_string());
        }

        let mut index = self.index.write().await;
        for key in &cleared {
            index.remove(key);
        }

        debug!(
            pattern = pattern.as_str(),
            removed = cleared.len(),
            "File entries removed by pattern"
        );
        Ok(())
    }

    // == Clear ==
    async fn clear(&self) -> Result<()> {
        match fs::remove_dir_all(&self.root).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(CacheError::io(&self.root, e)),
        }
        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| CacheError::io(&self.root, e))?;

        self.index.write().await.clear();
        Ok(())
    }

    // == Get All ==
    /// Reads every indexed key concurrently and waits for all of them.
    async fn get_all(&self) -> Result<Vec<CacheItem>> {
        let mut keys: Vec<String> = self.index.read().await.iter().cloned().collect();
        keys.sort();

        let values = try_join_all(keys.iter().map(|key| self.get(key))).await?;

        Ok(keys
            .into_iter()
            .zip(values)
            .filter_map(|(key, value)| value.map(|value| CacheItem::new(key, value)))
            .collect())
    }
}

// == Helpers ==
async fn list_keys(root: &Path) -> std::io::Result<Vec<String>> {
    let mut dir = fs::read_dir(root).await?;
    let mut keys = Vec::new();
    while let Some(item) = dir.next_entry().await? {
        if item.file_type().await?.is_file() {
            let file_name = item.file_name().to_string_lossy().into_owned();
            keys.push(key_from_file_name(&file_name).to_string());
        }
    }
    Ok(keys)
}

fn key_from_file_name(file_name: &str) -> &str {
    file_name.strip_suffix(EXTENSION).unwrap_or(file_name)
}

/// Makes `key` safe to use as a file name.
///
/// Strips path separators, characters reserved on common filesystems and
/// control characters; rejects `.`/`..` and Windows device names; trims
/// trailing dots and spaces; truncates to the file-name length limit on a
/// character boundary.
pub fn sanitize_key(key: &str) -> String {
    const RESERVED: &[char] = &['/', '?', '<', '>', '\\', ':', '*', '|', '"'];
    const WINDOWS_DEVICES: &[&str] = &[
        "con", "prn", "aux", "nul", "com1", "com2", "com3", "com4", "com5", "com6", "com7",
        "com8", "com9", "lpt1", "lpt2", "lpt3", "lpt4", "lpt5", "lpt6", "lpt7", "lpt8", "lpt9",
    ];

    let mut cleaned: String = key
        .chars()
        .filter(|c| !RESERVED.contains(c) && !c.is_control())
        .collect();

    if cleaned.chars().all(|c| c == '.') {
        cleaned.clear();
    }

    let stem = cleaned.split('.').next().unwrap_or_default().to_ascii_lowercase();
    if WINDOWS_DEVICES.contains(&stem.as_str()) {
        cleaned.clear();
    }

    let trimmed_len = cleaned.trim_end_matches(['.', ' ']).len();
    cleaned.truncate(trimmed_len);

    if cleaned.len() > MAX_FILE_STEM {
        let mut cut = MAX_FILE_STEM;
        while !cleaned.is_char_boundary(cut) {
            cut -= 1;
        }
        cleaned.truncate(cut);
    }

    cleaned
}
