#![doc = "Per-(ip, method) fixed-window rate limiter for the JSON-RPC gateway (§4.3)."]
#![warn(missing_debug_implementations, missing_docs, rustdoc::all)]
#![deny(unused_must_use, rust_2018_idioms)]

use async_trait::async_trait;
use dashmap::DashMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::warn;

/// A backing store for the rate limiter's window counters. Two
/// implementations exist with identical semantics: [`InMemoryStore`]
/// (process-local) and any externally-synchronized shared store a caller
/// plugs in. A shared implementation must increment-and-read atomically so
/// that two gateway instances sharing it observe one combined counter
/// (§4.3 "Backing stores").
#[async_trait]
pub trait RateLimitStore: Send + Sync + std::fmt::Debug {
    /// The error type surfaced by the backing store.
    type Error: std::fmt::Display + Send + Sync + 'static;

    /// Atomically increments the counter for `key` within the window
    /// identified by `window_start` and returns the count *after* the
    /// increment. Counters for past windows are implicitly abandoned (the
    /// key embeds the window boundary).
    async fn increment(&self, key: &str, window_start: u64) -> Result<u64, Self::Error>;
}

/// A process-local, in-memory [`RateLimitStore`].
#[derive(Debug, Default)]
pub struct InMemoryStore {
    counters: DashMap<String, u64>,
}

/// [`InMemoryStore`] never fails; its error type is uninhabited.
#[derive(Debug, thiserror::Error)]
pub enum InMemoryStoreError {}

impl std::fmt::Display for InMemoryStoreError {
    fn fmt(&self, _f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {}
    }
}

#[async_trait]
impl RateLimitStore for InMemoryStore {
    type Error = InMemoryStoreError;

    async fn increment(&self, key: &str, window_start: u64) -> Result<u64, Self::Error> {
        let windowed_key = format!("{key}@{window_start}");
        let mut entry = self.counters.entry(windowed_key).or_insert(0);
        *entry += 1;
        Ok(*entry)
    }
}

/// A per-`(ip, method)` fixed-window rate limiter.
///
/// `shouldRateLimit` returns `true` iff the current window's count for
/// `(ip, method)` strictly exceeds `threshold`, after atomically
/// incrementing it. On backing-store failure the limiter fails open
/// (returns `false`) and logs (§4.3 "Failure mode").
#[derive(Debug)]
pub struct RateLimiter<S: RateLimitStore> {
    store: S,
    window: Duration,
}

impl<S: RateLimitStore> RateLimiter<S> {
    /// Builds a rate limiter with the given fixed-window width.
    pub fn new(store: S, window: Duration) -> Self {
        Self { store, window }
    }

    /// Returns `true` iff this call should be rejected as rate-limited.
    pub async fn should_rate_limit(&self, ip: &str, method: &str, threshold: u64) -> bool {
        let window_start = current_window_start(self.window);
        let key = format!("{ip}:{method}");
        match self.store.increment(&key, window_start).await {
            Ok(count) => count > threshold,
            Err(e) => {
                warn!(target: "gateway-ratelimit", "rate limit store failed, failing open: {e}");
                false
            }
        }
    }
}

fn current_window_start(window: Duration) -> u64 {
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs();
    let width = window.as_secs().max(1);
    (now / width) * width
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn admits_up_to_threshold_then_rejects() {
        let limiter = RateLimiter::new(InMemoryStore::default(), Duration::from_secs(60));
        for _ in 0..3 {
            assert!(!limiter.should_rate_limit("1.2.3.4", "eth_chainId", 3).await);
        }
        assert!(limiter.should_rate_limit("1.2.3.4", "eth_chainId", 3).await);
    }

    #[tokio::test]
    async fn counters_are_scoped_per_ip() {
        let limiter = RateLimiter::new(InMemoryStore::default(), Duration::from_secs(60));
        for _ in 0..3 {
            assert!(!limiter.should_rate_limit("1.1.1.1", "eth_chainId", 3).await);
        }
        assert!(limiter.should_rate_limit("1.1.1.1", "eth_chainId", 3).await);
        // A different client IP has an independent counter.
        assert!(!limiter.should_rate_limit("2.2.2.2", "eth_chainId", 3).await);
    }

    #[tokio::test]
    async fn counters_are_scoped_per_method() {
        let limiter = RateLimiter::new(InMemoryStore::default(), Duration::from_secs(60));
        for _ in 0..3 {
            assert!(!limiter.should_rate_limit("1.2.3.4", "eth_chainId", 3).await);
        }
        assert!(!limiter.should_rate_limit("1.2.3.4", "eth_blockNumber", 3).await);
    }
}
