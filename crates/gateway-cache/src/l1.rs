//! The process-local L1 tier (§4.2 "L1").

use lru::LruCache;
use serde_json::Value;
use std::{
    num::NonZeroUsize,
    sync::Mutex,
    time::{Duration, Instant},
};

struct Entry {
    value: Value,
    expires_at: Instant,
}

/// A bounded, TTL-aware, process-local cache.
///
/// Evicts on size (LRU) or TTL, whichever comes first. All operations are
/// synchronous in-memory work (§5 "Suspension points") guarded by a single
/// mutex — the only process-wide mutable structure besides the rate
/// limiter's counter map.
pub struct L1Cache {
    inner: Mutex<LruCache<String, Entry>>,
}

impl std::fmt::Debug for L1Cache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("L1Cache").finish_non_exhaustive()
    }
}

impl L1Cache {
    /// Creates a new L1 cache bounded to `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::new(1).unwrap());
        Self { inner: Mutex::new(LruCache::new(capacity)) }
    }

    /// Looks up `key`, evicting it (and returning `None`) if its TTL has
    /// elapsed.
    pub fn get(&self, key: &str) -> Option<Value> {
        let mut guard = self.inner.lock().expect("L1Cache mutex poisoned");
        let expired = match guard.peek(key) {
            Some(entry) => Instant::now() >= entry.expires_at,
            None => return None,
        };
        if expired {
            guard.pop(key);
            return None;
        }
        guard.get(key).map(|entry| entry.value.clone())
    }

    /// Inserts `value` under `key` with the given TTL.
    pub fn set(&self, key: String, value: Value, ttl: Duration) {
        let mut guard = self.inner.lock().expect("L1Cache mutex poisoned");
        guard.put(key, Entry { value, expires_at: Instant::now() + ttl });
    }

    /// Removes `key`, if present.
    pub fn delete(&self, key: &str) {
        let mut guard = self.inner.lock().expect("L1Cache mutex poisoned");
        guard.pop(key);
    }

    /// Removes every entry whose key starts with `prefix` — used for
    /// method-scoped invalidation.
    pub fn clear_prefix(&self, prefix: &str) {
        let mut guard = self.inner.lock().expect("L1Cache mutex poisoned");
        let stale: Vec<String> =
            guard.iter().filter(|(k, _)| k.starts_with(prefix)).map(|(k, _)| k.clone()).collect();
        for key in stale {
            guard.pop(&key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_within_ttl_returns_same_value() {
        let cache = L1Cache::new(8);
        cache.set("k".into(), Value::from(42), Duration::from_secs(60));
        assert_eq!(cache.get("k"), Some(Value::from(42)));
    }

    #[test]
    fn entry_expires_after_ttl() {
        let cache = L1Cache::new(8);
        cache.set("k".into(), Value::from(1), Duration::from_millis(1));
        std::thread::sleep(Duration::from_millis(10));
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn evicts_by_capacity() {
        let cache = L1Cache::new(1);
        cache.set("a".into(), Value::from(1), Duration::from_secs(60));
        cache.set("b".into(), Value::from(2), Duration::from_secs(60));
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b"), Some(Value::from(2)));
    }

    #[test]
    fn clear_prefix_removes_matching_keys_only() {
        let cache = L1Cache::new(8);
        cache.set("eth_getBalance:0x1".into(), Value::from(1), Duration::from_secs(60));
        cache.set("eth_getBalance:0x2".into(), Value::from(2), Duration::from_secs(60));
        cache.set("eth_gasPrice".into(), Value::from(3), Duration::from_secs(60));
        cache.clear_prefix("eth_getBalance");
        assert_eq!(cache.get("eth_getBalance:0x1"), None);
        assert_eq!(cache.get("eth_getBalance:0x2"), None);
        assert_eq!(cache.get("eth_gasPrice"), Some(Value::from(3)));
    }
}
