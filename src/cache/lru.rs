//! LRU Map Module
//!
//! Capacity-bounded map that evicts the least recently used key on insert.

use std::collections::{HashMap, VecDeque};

// == LRU Map ==
/// Bounded key-value map with least-recently-used eviction.
///
/// Access order is kept in a VecDeque where:
/// - Front = Most recently used
/// - Back = Least recently used
#[derive(Debug)]
pub struct LruMap<V> {
    entries: HashMap<String, V>,
    order: VecDeque<String>,
    capacity: usize,
}

impl<V> LruMap<V> {
    // == Constructor ==
    /// Creates an empty map holding at most `capacity` keys (minimum 1).
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Maximum number of keys held before eviction.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    // == Get ==
    /// Returns the value for `key` and marks it most recently used.
    pub fn get(&mut self, key: &str) -> Option<&V> {
        if !self.entries.contains_key(key) {
            return None;
        }
        self.touch(key);
        self.entries.get(key)
    }

    /// Returns the value for `key` without touching recency.
    pub fn peek(&self, key: &str) -> Option<&V> {
        self.entries.get(key)
    }

    // == Insert ==
    /// Stores `value` under `key`, marking it most recently used.
    ///
    /// Returns the key evicted to make room, if any. Overwriting an
    /// existing key never evicts.
    pub fn insert(&mut self, key: String, value: V) -> Option<String> {
        let mut evicted = None;
        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_back() {
                self.entries.remove(&oldest);
                evicted = Some(oldest);
            }
        }

        self.touch(&key);
        self.entries.insert(key, value);
        evicted
    }

    // == Remove ==
    /// Removes `key`, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<V> {
        let value = self.entries.remove(key)?;
        self.order.retain(|k| k != key);
        Some(value)
    }

    // == Clear ==
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    /// Keys from most to least recently used.
    pub fn keys(&self) -> Vec<String> {
        self.order.iter().cloned().collect()
    }

    /// Entries from most to least recently used, without touching recency.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &V)> {
        self.order
            .iter()
            .filter_map(|key| self.entries.get_key_value(key.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn touch(&mut self, key: &str) {
        self.order.retain(|k| k != key);
        self.order.push_front(key.to_string());
    }
}
