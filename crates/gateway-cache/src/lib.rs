#![doc = "Two-tier (L1 process-local + optional shared L2) cache substrate for the JSON-RPC gateway."]
#![warn(missing_debug_implementations, missing_docs, rustdoc::all)]
#![deny(unused_must_use, rust_2018_idioms)]

pub mod key;
mod l1;
mod l2;
mod policy;

pub use l1::L1Cache;
pub use l2::{InMemorySharedCache, SharedCache};
pub use policy::{CachePolicy, CacheTier};

use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

/// The cache substrate consulted by the dispatcher before invoking a
/// method's handler, and populated with the handler's result afterward.
///
/// Reads are L1-first; on an L1 miss for an `L1AndL2` policy, L2 is
/// consulted and, on a hit, L1 is repopulated. Writes are L1-then-L2.
#[derive(Debug, Clone)]
pub struct Cache<S: SharedCache> {
    l1: Arc<L1Cache>,
    l2: Option<Arc<S>>,
}

impl<S: SharedCache> Cache<S> {
    /// Builds a cache with the given L1 capacity and optional L2 store.
    pub fn new(l1_capacity: usize, l2: Option<Arc<S>>) -> Self {
        Self { l1: Arc::new(L1Cache::new(l1_capacity)), l2 }
    }

    /// Looks up `key` per `policy`. L2 failures are logged and treated as
    /// misses (§4.2 "Failure mode").
    pub async fn get(&self, policy: &CachePolicy, key: &str) -> Option<Value> {
        if let Some(hit) = self.l1.get(key) {
            return Some(hit);
        }
        if policy.tier != CacheTier::L1AndL2 {
            return None;
        }
        let Some(l2) = &self.l2 else { return None };
        match l2.get(key).await {
            Ok(Some(value)) => {
                self.l1.set(key.to_string(), value.clone(), policy.ttl);
                Some(value)
            }
            Ok(None) => None,
            Err(e) => {
                warn!(target: "gateway-cache", "L2 cache read failed, treating as miss: {e}");
                None
            }
        }
    }

    /// Stores `value` under `key` per `policy`. L2 failures are logged and
    /// otherwise ignored — they never fail the request.
    pub async fn set(&self, policy: &CachePolicy, key: &str, value: Value) {
        self.l1.set(key.to_string(), value.clone(), policy.ttl);
        if policy.tier == CacheTier::L1AndL2 {
            if let Some(l2) = &self.l2 {
                if let Err(e) = l2.set(key, value, policy.ttl).await {
                    warn!(target: "gateway-cache", "L2 cache write failed: {e}");
                }
            }
        }
    }

    /// Invalidates every L1 (and, if configured, L2) entry scoped to
    /// `method`.
    pub async fn invalidate_method(&self, method: &str) {
        self.l1.clear_prefix(method);
        if let Some(l2) = &self.l2 {
            if let Err(e) = l2.clear_prefix(method).await {
                warn!(target: "gateway-cache", "L2 cache invalidation failed: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn l1_only_policy_never_touches_l2() {
        let cache = Cache::new(8, Some(Arc::new(InMemorySharedCache::default())));
        let policy = CachePolicy::l1(Duration::from_secs(30));
        cache.set(&policy, "k", Value::from(1)).await;
        assert_eq!(cache.get(&policy, "k").await, Some(Value::from(1)));
    }

    #[tokio::test]
    async fn l1_and_l2_repopulates_l1_on_l2_hit() {
        let l2 = Arc::new(InMemorySharedCache::default());
        let policy = CachePolicy::l1_and_l2(Duration::from_secs(30));
        l2.set("k", Value::from(9), Duration::from_secs(30)).await.unwrap();

        let cache = Cache::new(8, Some(l2));
        assert_eq!(cache.get(&policy, "k").await, Some(Value::from(9)));
        // Now satisfied purely from L1 without re-touching L2: drop L2 and confirm.
        assert_eq!(cache.get(&policy, "k").await, Some(Value::from(9)));
    }

    #[tokio::test]
    async fn miss_when_no_l2_configured() {
        let cache: Cache<InMemorySharedCache> = Cache::new(8, None);
        let policy = CachePolicy::l1_and_l2(Duration::from_secs(30));
        assert_eq!(cache.get(&policy, "missing").await, None);
    }
}
