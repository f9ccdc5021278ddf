//! Cache key construction (§4.2 "L1").
//!
//! Keys are method-scoped prefixes followed by colon-separated arguments;
//! long or binary arguments are hashed to keep the key length bounded.

use sha1::{Digest, Sha1};

/// The argument length, in bytes, above which an argument is hashed rather
/// than embedded verbatim in the cache key.
const INLINE_ARG_LIMIT: usize = 64;

/// Builds a cache key from a method name and its (already-stringified)
/// arguments, hashing any argument longer than [`INLINE_ARG_LIMIT`] bytes.
pub fn build(method: &str, args: &[&str]) -> String {
    let mut key = String::from(method);
    for arg in args {
        key.push(':');
        if arg.len() > INLINE_ARG_LIMIT {
            key.push_str(&hash_arg(arg));
        } else {
            key.push_str(arg);
        }
    }
    key
}

/// SHA-1 is sufficient here: this is a cache-key shortener, not a security
/// boundary.
fn hash_arg(arg: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(arg.as_bytes());
    hex::encode(hasher.finalize())
}

/// Minimal hex encoder to avoid pulling in a whole hex crate dependency just
/// for this.
mod hex {
    const CHARS: &[u8; 16] = b"0123456789abcdef";

    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        let bytes = bytes.as_ref();
        let mut out = String::with_capacity(bytes.len() * 2);
        for b in bytes {
            out.push(CHARS[(b >> 4) as usize] as char);
            out.push(CHARS[(b & 0x0f) as usize] as char);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_args_are_inlined() {
        let key = build("eth_getBalance", &["0xabc", "latest"]);
        assert_eq!(key, "eth_getBalance:0xabc:latest");
    }

    #[test]
    fn long_args_are_hashed_and_bounded() {
        let long_arg = "0x".to_string() + &"ff".repeat(200);
        let key = build("eth_call", &[long_arg.as_str()]);
        assert!(key.len() < long_arg.len());
        assert!(key.starts_with("eth_call:"));
    }

    #[test]
    fn hashing_is_deterministic() {
        let long_arg = "x".repeat(100);
        let a = build("m", &[long_arg.as_str()]);
        let b = build("m", &[long_arg.as_str()]);
        assert_eq!(a, b);
    }
}
