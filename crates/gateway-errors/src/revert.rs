//! Contract-revert payload decoding (§4.1 "Contract revert decoding").

/// The standard `Error(string)` selector.
const ERROR_STRING_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];

/// Attempts to decode a revert payload as a human-readable string.
///
/// Tries, in order: the standard `Error(string)` selector followed by
/// ABI-encoded string; then a generic custom-error selector followed by the
/// same ABI string encoding (some contracts emit custom errors whose single
/// argument is a string using a different 4-byte selector); otherwise
/// returns `None` and the raw payload passes through untouched.
///
/// Returns the decoded message; the caller retains the raw payload
/// separately (it always stays in the error's `data` field).
pub fn decode_revert(payload: &[u8]) -> Option<String> {
    if payload.len() < 4 {
        return None;
    }
    let (selector, body) = payload.split_at(4);
    if selector == ERROR_STRING_SELECTOR {
        if let Some(s) = abi_decode_string(body) {
            return Some(s);
        }
    }
    // Fallback: an unrecognized (custom-error) selector, but the same
    // ABI-encoded-string tail shape.
    abi_decode_string(body)
}

/// Decodes a single ABI-encoded `string` argument: a 32-byte offset (assumed
/// to point at the start of the length word, i.e. `0x20`), a 32-byte length,
/// then that many bytes of UTF-8 data, right-padded to a 32-byte boundary.
fn abi_decode_string(body: &[u8]) -> Option<String> {
    if body.len() < 64 {
        return None;
    }
    let offset = be_u64(&body[0..32])? as usize;
    if offset.checked_add(32)? > body.len() {
        return None;
    }
    let len_word = &body[offset..offset + 32];
    let len = be_u64(len_word)? as usize;
    let start = offset + 32;
    let end = start.checked_add(len)?;
    if end > body.len() {
        return None;
    }
    std::str::from_utf8(&body[start..end]).ok().map(ToOwned::to_owned)
}

/// Reads a 32-byte big-endian word as a `u64`, returning `None` if the high
/// bytes would overflow (ABI words larger than `u64` can't be a sane offset
/// or length for a gateway-sized revert message).
fn be_u64(word: &[u8]) -> Option<u64> {
    if word.len() != 32 {
        return None;
    }
    if word[..24].iter().any(|b| *b != 0) {
        return None;
    }
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&word[24..32]);
    Some(u64::from_be_bytes(buf))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_error_string(message: &str) -> Vec<u8> {
        let mut out = ERROR_STRING_SELECTOR.to_vec();
        let mut offset_word = [0u8; 32];
        offset_word[31] = 0x20;
        out.extend_from_slice(&offset_word);

        let mut len_word = [0u8; 32];
        let len = message.len() as u64;
        len_word[24..].copy_from_slice(&len.to_be_bytes());
        out.extend_from_slice(&len_word);

        out.extend_from_slice(message.as_bytes());
        let pad = (32 - (message.len() % 32)) % 32;
        out.extend(std::iter::repeat(0u8).take(pad));
        out
    }

    #[test]
    fn decodes_standard_error_string() {
        let payload = encode_error_string("insufficient funds");
        assert_eq!(decode_revert(&payload), Some("insufficient funds".to_string()));
    }

    #[test]
    fn round_trips_through_encode_decode() {
        for message in ["", "short", "a longer revert reason that spans words"] {
            let payload = encode_error_string(message);
            assert_eq!(decode_revert(&payload), Some(message.to_string()));
        }
    }

    #[test]
    fn passes_through_unrecognized_payload() {
        let payload = vec![0xde, 0xad, 0xbe, 0xef, 0x01, 0x02];
        assert_eq!(decode_revert(&payload), None);
    }

    #[test]
    fn too_short_payload_is_none() {
        assert_eq!(decode_revert(&[0x08, 0xc3, 0x79]), None);
    }
}
