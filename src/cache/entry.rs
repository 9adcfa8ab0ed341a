//! Cache Entry Module
//!
//! Defines stored entries, their expiry sentinel and the TTL type shared by
//! every backend.

use serde::Serialize;
use serde_json::Value;

/// Expiry timestamp meaning "never expires by time".
pub const NEVER_EXPIRES: i64 = -1;

/// TTL applied by a store when the caller gives none.
pub const DEFAULT_STORE_TTL_SECS: u64 = 60;

// == Ttl ==
/// Time-to-live for a single write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ttl {
    /// Entry never expires by time (wire value `-1`)
    Never,
    /// Entry expires after the given number of seconds
    Seconds(u64),
}

impl Ttl {
    /// Builds a TTL from its signed wire form, where `-1` means never.
    ///
    /// Any other negative value is treated like `0`, which falls back to a
    /// default TTL wherever one is resolved.
    pub fn from_wire(secs: i64) -> Self {
        match secs {
            NEVER_EXPIRES => Ttl::Never,
            s if s < 0 => Ttl::Seconds(0),
            s => Ttl::Seconds(s as u64),
        }
    }

    /// Resolves an optional TTL, replacing a missing or zero TTL with
    /// `default_secs`.
    pub fn or_default(ttl: Option<Ttl>, default_secs: u64) -> Ttl {
        match ttl {
            None | Some(Ttl::Seconds(0)) => Ttl::Seconds(default_secs),
            Some(ttl) => ttl,
        }
    }

    /// Absolute expiry timestamp for a write happening at `now_ms`.
    pub fn expire_at(self, now_ms: i64) -> i64 {
        match self {
            Ttl::Never => NEVER_EXPIRES,
            Ttl::Seconds(secs) => {
                let secs = i64::try_from(secs).unwrap_or(i64::MAX);
                now_ms.saturating_add(secs.saturating_mul(1000))
            }
        }
    }
}

impl From<u64> for Ttl {
    fn from(secs: u64) -> Self {
        Ttl::Seconds(secs)
    }
}

impl From<std::time::Duration> for Ttl {
    fn from(duration: std::time::Duration) -> Self {
        Ttl::Seconds(duration.as_secs())
    }
}

// == Cache Entry ==
/// A stored value with its expiry.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    /// JSON text of the stored value
    pub value: String,
    /// Expiration timestamp (Unix milliseconds), `NEVER_EXPIRES` = no expiration
    pub expire_at: i64,
}

impl CacheEntry {
    // == Constructor ==
    /// Serializes `value` and computes its expiry relative to `now_ms`.
    pub fn encode(value: &Value, ttl: Ttl, now_ms: i64) -> serde_json::Result<Self> {
        Ok(Self {
            value: serde_json::to_string(value)?,
            expire_at: ttl.expire_at(now_ms),
        })
    }

    // == Decode ==
    /// Parses the stored JSON text back into a value.
    pub fn decode(&self) -> serde_json::Result<Value> {
        serde_json::from_str(&self.value)
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now_ms`.
    ///
    /// Once the current time reaches the expiry timestamp the entry is gone.
    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        self.expire_at != NEVER_EXPIRES && now_ms >= self.expire_at
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds, or None if the entry never expires.
    pub fn ttl_remaining_ms(&self, now_ms: i64) -> Option<u64> {
        if self.expire_at == NEVER_EXPIRES {
            return None;
        }
        Some((self.expire_at - now_ms).max(0) as u64)
    }
}

// == Cache Item ==
/// A `{key, value}` pair as returned by `get_all`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheItem {
    pub key: String,
    pub value: Value,
}

impl CacheItem {
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const NOW: i64 = 1_700_000_000_000;

    #[test]
    fn test_ttl_from_wire() {
        assert_eq!(Ttl::from_wire(-1), Ttl::Never);
        assert_eq!(Ttl::from_wire(30), Ttl::Seconds(30));
        assert_eq!(Ttl::from_wire(-7), Ttl::Seconds(0));
    }

    #[test]
    fn test_huge_ttl_saturates_into_the_future() {
        assert_eq!(Ttl::Seconds(u64::MAX).expire_at(NOW), i64::MAX);
        assert_eq!(Ttl::Seconds(i64::MAX as u64 + 1).expire_at(NOW), i64::MAX);

        let entry = CacheEntry::encode(&json!("v"), Ttl::Seconds(u64::MAX), NOW).unwrap();
        assert!(!entry.is_expired_at(NOW));
    }

    #[test]
    fn test_ttl_or_default() {
        assert_eq!(Ttl::or_default(None, 60), Ttl::Seconds(60));
        assert_eq!(Ttl::or_default(Some(Ttl::Seconds(0)), 60), Ttl::Seconds(60));
        assert_eq!(Ttl::or_default(Some(Ttl::Seconds(5)), 60), Ttl::Seconds(5));
        assert_eq!(Ttl::or_default(Some(Ttl::Never), 60), Ttl::Never);
    }

    #[test]
    fn test_entry_creation_no_ttl() {
        let entry = CacheEntry::encode(&json!("test_value"), Ttl::Never, NOW).unwrap();

        assert_eq!(entry.value, "\"test_value\"");
        assert_eq!(entry.expire_at, NEVER_EXPIRES);
        assert!(!entry.is_expired_at(i64::MAX));
    }

    #[test]
    fn test_entry_creation_with_ttl() {
        let entry = CacheEntry::encode(&json!({"bar": "baz"}), Ttl::Seconds(60), NOW).unwrap();

        assert_eq!(entry.expire_at, NOW + 60_000);
        assert!(!entry.is_expired_at(NOW));
        assert_eq!(entry.decode().unwrap(), json!({"bar": "baz"}));
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let entry = CacheEntry::encode(&json!(1), Ttl::Seconds(1), NOW).unwrap();

        assert!(!entry.is_expired_at(NOW + 999));
        assert!(entry.is_expired_at(NOW + 1000), "Entry should be expired at boundary");
    }

    #[test]
    fn test_ttl_remaining_ms() {
        let entry = CacheEntry::encode(&json!(1), Ttl::Seconds(10), NOW).unwrap();

        assert_eq!(entry.ttl_remaining_ms(NOW), Some(10_000));
        assert_eq!(entry.ttl_remaining_ms(NOW + 20_000), Some(0));

        let forever = CacheEntry::encode(&json!(1), Ttl::Never, NOW).unwrap();
        assert!(forever.ttl_remaining_ms(NOW).is_none());
    }

    #[test]
    fn test_decode_corrupt_value() {
        let entry = CacheEntry {
            value: "{not json".to_string(),
            expire_at: NEVER_EXPIRES,
        };
        assert!(entry.decode().is_err());
    }
}
