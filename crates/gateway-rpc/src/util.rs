//! Small conversion helpers shared across the eth/debug services.

use gateway_primitives::units::tinybar_to_weibar;

/// Decodes a hex string the mirror returned, tolerating a missing `0x`
/// prefix (some mirror fields omit it).
pub fn decode_hex_lenient(s: &str) -> Vec<u8> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    if digits.is_empty() {
        return Vec::new();
    }
    let padded = if digits.len() % 2 == 1 { format!("0{digits}") } else { digits.to_string() };
    hex::decode(padded).unwrap_or_default()
}

/// Parses a tinybar amount the mirror reported as a decimal string,
/// converts it to weibar, and formats it as a `0x`-prefixed hex quantity.
pub fn tinybar_decimal_str_to_weibar_hex(s: &str, coef: u64) -> String {
    let tinybar: u64 = s.parse().unwrap_or(0);
    gateway_primitives::hexutil::quantity_u256(tinybar_to_weibar(tinybar, coef))
}

/// Converts a tinybar amount (already a `u64`) to a weibar hex quantity.
pub fn tinybar_to_weibar_hex(tinybar: u64, coef: u64) -> String {
    gateway_primitives::hexutil::quantity_u256(tinybar_to_weibar(tinybar, coef))
}

/// Ensures `s` carries a `0x` prefix without otherwise touching its digits,
/// for mirror fields that are already hex-encoded but sometimes omit it.
pub fn ensure_0x_prefix(s: &str) -> String {
    if s.starts_with("0x") {
        s.to_string()
    } else if s.is_empty() {
        "0x".to_string()
    } else {
        format!("0x{s}")
    }
}

/// `None` for an empty mirror string field, `Some` otherwise.
pub fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// Minimal hex decoder so this crate doesn't need the `hex` crate directly
/// for a handful of call sites.
mod hex {
    pub fn decode(s: String) -> Option<Vec<u8>> {
        if s.len() % 2 != 0 {
            return None;
        }
        (0..s.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&s[i..i + 2], 16).ok())
            .collect()
    }
}
