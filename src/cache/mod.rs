//! Cache Module
//!
//! The store contract and its three backends: in-process memory, one file per
//! key on disk, and a remote key-value server.

mod clock;
mod entry;
mod file;
mod lru;
mod memory;
mod pattern;
pub mod remote;
mod store;


// Re-export public types
pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::{CacheEntry, CacheItem, Ttl, DEFAULT_STORE_TTL_SECS, NEVER_EXPIRES};
pub use file::{sanitize_key, FileStore};
pub use lru::LruMap;
pub use memory::{MemoryStore, DEFAULT_MAX_ENTRIES};
pub use pattern::{IntoPattern, KeyPattern};
pub use remote::{RedisClient, RemoteClient, RemoteStore, DEFAULT_PREFIX};
pub use store::{open_store, Store};
