//! Hex normalization helpers shared by every response type in this crate.
//!
//! Every hex string the gateway emits is lower-case, `0x`-prefixed, and has
//! no leading zeros except the literal `0x0`. These helpers centralize that
//! so individual response builders don't each reimplement it slightly
//! differently.

use alloy_primitives::{hex, B256, U256};

/// Strips leading zero nibbles from a hex-digit string (no `0x` prefix),
/// leaving a single `0` if the value is zero.
fn strip_leading_zeros(digits: &str) -> &str {
    let trimmed = digits.trim_start_matches('0');
    if trimmed.is_empty() {
        "0"
    } else {
        trimmed
    }
}

/// Formats an unsigned integer as a `0x`-prefixed hex quantity with no
/// leading zeros, e.g. `0x0`, `0x1a`.
pub fn quantity(value: u64) -> String {
    format!("0x{:x}", value)
}

/// Formats a [`U256`] as a `0x`-prefixed hex quantity with no leading zeros.
pub fn quantity_u256(value: U256) -> String {
    let digits = format!("{:x}", value);
    format!("0x{}", strip_leading_zeros(&digits))
}

/// Formats raw bytes as a fixed-width, zero-padded `0x`-prefixed hex string.
/// Used for hash-shaped fields (32 bytes -> 66 chars, addresses -> 42 chars).
pub fn fixed_bytes(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Formats a byte slice as a `0x`-prefixed hex blob (used for `data`/`input`
/// fields, where no width constraint or leading-zero trimming applies).
pub fn blob(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Normalizes a signature component (`r`/`s`) by stripping leading zero
/// bytes, per §4.6.7 — strict Ethereum clients reject leading-zero
/// signature bytes. An all-zero component renders as `0x0`.
pub fn signature_component(value: &[u8]) -> String {
    let digits = hex::encode(value);
    let trimmed = strip_leading_zeros(&digits);
    format!("0x{}", trimmed)
}

/// Normalizes an already-hex-encoded, possibly `0x`-prefixed string the same
/// way: strips a leading `0x` if present, trims leading zero nibbles, and
/// re-adds the prefix. Empty or all-zero input normalizes to `0x0`.
pub fn normalize_hex_quantity(raw: &str) -> String {
    let digits = raw.strip_prefix("0x").unwrap_or(raw);
    if digits.is_empty() {
        return "0x0".to_string();
    }
    format!("0x{}", strip_leading_zeros(digits))
}

/// The empty-bloom sentinel used for blocks/receipts the mirror reports as
/// having no logs bloom.
pub fn empty_bloom() -> String {
    format!("0x{}", "0".repeat(512))
}

/// The EIP-empty-array hash (`sha3Uncles` for a block with no uncles) and
/// the default (empty) Merkle root used for `stateRoot` /
/// `transactionsRoot` when a block has no transactions.
pub fn empty_list_hash() -> B256 {
    "0x1dcc4de8dec75d7aab85b567b6ccd41ad312451b948a7413f0a142fd40d4934"
        .parse()
        .expect("valid constant")
}

/// The default (empty) trie root, used for `stateRoot`.
pub fn default_root_hash() -> B256 {
    "0x56e81f171bcc55a6ff8345e692c0f86e5b48e01b996cadc001622fb5e363b421"
        .parse()
        .unwrap_or_else(|_| B256::ZERO)
}

/// The zero address, used for fields the upstream has no equivalent of
/// (`miner`, synthetic-transaction placeholders when unresolved).
pub fn zero_address() -> String {
    format!("0x{}", "0".repeat(40))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantity_strips_leading_zeros() {
        assert_eq!(quantity(0), "0x0");
        assert_eq!(quantity(26), "0x1a");
    }

    #[test]
    fn normalize_hex_quantity_handles_zero() {
        assert_eq!(normalize_hex_quantity("0x"), "0x0");
        assert_eq!(normalize_hex_quantity("0x0000"), "0x0");
        assert_eq!(normalize_hex_quantity("0x00ab"), "0xab");
    }

    #[test]
    fn signature_component_strips_leading_zero_bytes() {
        assert_eq!(signature_component(&[0, 0, 1, 2]), "0x0102");
        assert_eq!(signature_component(&[0, 0, 0]), "0x0");
    }

    #[test]
    fn fixed_bytes_is_zero_padded() {
        let bytes = [0u8; 32];
        let s = fixed_bytes(&bytes);
        assert_eq!(s.len(), 66);
    }
}
