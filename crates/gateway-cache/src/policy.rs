//! Per-method cache policy (§4.2 "Policy hooks").

use std::time::Duration;

/// Which tier(s) a method's cache policy consults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheTier {
    /// Only the process-local L1 tier.
    L1Only,
    /// L1, falling through to the shared L2 tier on miss.
    L1AndL2,
}

/// A declarative cache policy attached to a [`MethodDescriptor`]-equivalent
/// in the dispatcher: a TTL, which tier(s) to consult, and a list of
/// `(param-index, forbidden-value)` pairs that disable caching entirely for
/// a given call — used to skip caching block tags like `latest`/`pending`,
/// block-hash lookups, and dev-mode calls.
///
/// [`MethodDescriptor`]: ../gateway_rpc/struct.MethodDescriptor.html
#[derive(Debug, Clone)]
pub struct CachePolicy {
    /// How long a cached value remains valid.
    pub ttl: Duration,
    /// Which tier(s) this policy consults.
    pub tier: CacheTier,
    /// `(param index, forbidden value)` pairs. If any named parameter
    /// equals its forbidden value, this call is never cached.
    pub disabled_for: Vec<(usize, String)>,
}

impl CachePolicy {
    /// A policy with the given TTL, consulting only L1, with no disabling
    /// patterns.
    pub fn l1(ttl: Duration) -> Self {
        Self { ttl, tier: CacheTier::L1Only, disabled_for: Vec::new() }
    }

    /// A policy with the given TTL, consulting both tiers, with no
    /// disabling patterns.
    pub fn l1_and_l2(ttl: Duration) -> Self {
        Self { ttl, tier: CacheTier::L1AndL2, disabled_for: Vec::new() }
    }

    /// Adds a disabling pattern in builder style.
    pub fn disable_for(mut self, param_index: usize, forbidden_value: impl Into<String>) -> Self {
        self.disabled_for.push((param_index, forbidden_value.into()));
        self
    }

    /// Whether caching is disabled for this particular call, given its
    /// stringified parameters.
    pub fn is_disabled_for(&self, args: &[&str]) -> bool {
        self.disabled_for.iter().any(|(idx, forbidden)| args.get(*idx) == Some(&forbidden.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disables_for_block_tag_latest() {
        let policy = CachePolicy::l1(Duration::from_secs(5)).disable_for(1, "latest");
        assert!(policy.is_disabled_for(&["0xabc", "latest"]));
        assert!(!policy.is_disabled_for(&["0xabc", "0x10"]));
    }
}
