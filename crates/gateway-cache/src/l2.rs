//! The optional shared L2 tier (§4.2 "L2").

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// A shared cache store, implemented identically whether it's backed by an
/// external service or (for tests) an in-process stand-in. L2 failures are
/// logged by the caller and treated as misses — they never fail the request
/// (§4.2 "Failure mode").
#[async_trait]
pub trait SharedCache: Send + Sync + std::fmt::Debug {
    /// The error type surfaced by the backing store.
    type Error: std::fmt::Display + Send + Sync + 'static;

    /// Looks up `key`.
    async fn get(&self, key: &str) -> Result<Option<Value>, Self::Error>;
    /// Inserts `value` under `key` with the given TTL.
    async fn set(&self, key: &str, value: Value, ttl: Duration) -> Result<(), Self::Error>;
    /// Removes `key`, if present.
    async fn delete(&self, key: &str) -> Result<(), Self::Error>;
    /// Removes every entry whose key starts with `prefix`.
    async fn clear_prefix(&self, prefix: &str) -> Result<(), Self::Error>;
}

/// An in-process stand-in for a shared store, used in tests and for the
/// single-instance deployment where no external L2 is configured.
#[derive(Debug, Default)]
pub struct InMemorySharedCache {
    inner: tokio::sync::Mutex<std::collections::HashMap<String, (Value, std::time::Instant)>>,
}

/// [`InMemorySharedCache`] never fails; its error type is uninhabited.
#[derive(Debug, thiserror::Error)]
pub enum InMemorySharedCacheError {}

impl std::fmt::Display for InMemorySharedCacheError {
    fn fmt(&self, _f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {}
    }
}

#[async_trait]
impl SharedCache for InMemorySharedCache {
    type Error = InMemorySharedCacheError;

    async fn get(&self, key: &str) -> Result<Option<Value>, Self::Error> {
        let mut guard = self.inner.lock().await;
        let expired = match guard.get(key) {
            Some((_, expires_at)) => std::time::Instant::now() >= *expires_at,
            None => return Ok(None),
        };
        if expired {
            guard.remove(key);
            return Ok(None);
        }
        Ok(guard.get(key).map(|(v, _)| v.clone()))
    }

    async fn set(&self, key: &str, value: Value, ttl: Duration) -> Result<(), Self::Error> {
        let mut guard = self.inner.lock().await;
        guard.insert(key.to_string(), (value, std::time::Instant::now() + ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), Self::Error> {
        let mut guard = self.inner.lock().await;
        guard.remove(key);
        Ok(())
    }

    async fn clear_prefix(&self, prefix: &str) -> Result<(), Self::Error> {
        let mut guard = self.inner.lock().await;
        guard.retain(|k, _| !k.starts_with(prefix));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_then_get_round_trips() {
        let cache = InMemorySharedCache::default();
        cache.set("k", Value::from(7), Duration::from_secs(30)).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), Some(Value::from(7)));
    }

    #[tokio::test]
    async fn expired_entries_are_treated_as_misses() {
        let cache = InMemorySharedCache::default();
        cache.set("k", Value::from(1), Duration::from_millis(1)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(cache.get("k").await.unwrap(), None);
    }
}
