//! Dependency-free client-IP extraction (§6 "Client-IP extraction").
//!
//! Trusts proxy headers only when the caller says to. `X-Forwarded-For`
//! takes precedence; otherwise the first `for=` parameter of the RFC 7239
//! `Forwarded` header is parsed, accepting unquoted, quoted, and
//! bracketed-IPv6 forms. Bounded to 1000 input bytes / 45 result bytes and
//! deliberately non-regex on the critical path.

const MAX_INPUT: usize = 1000;
const MAX_RESULT: usize = 45;

/// Resolves the client IP for one request.
pub fn extract(
    trust_proxy_headers: bool,
    x_forwarded_for: Option<&str>,
    forwarded: Option<&str>,
    peer_addr: &str,
) -> String {
    if trust_proxy_headers {
        if let Some(ip) = x_forwarded_for.and_then(from_x_forwarded_for) {
            return ip;
        }
        if let Some(ip) = forwarded.and_then(from_forwarded) {
            return ip;
        }
    }
    truncate(peer_addr)
}

fn from_x_forwarded_for(raw: &str) -> Option<String> {
    let bounded = bound(raw);
    let first = bounded.split(',').next()?.trim();
    if first.is_empty() {
        None
    } else {
        Some(truncate(strip_port(first)))
    }
}

fn from_forwarded(raw: &str) -> Option<String> {
    let bounded = bound(raw);
    let first_hop = bounded.split(',').next()?;
    for param in first_hop.split(';') {
        let param = param.trim();
        if param.len() < 4 || !param.as_bytes()[..4].eq_ignore_ascii_case(b"for=") {
            continue;
        }
        let value = param[4..].trim();
        let unquoted = unquote(value);
        if unquoted.is_empty() {
            return None;
        }
        return Some(truncate(strip_port(unquoted)));
    }
    None
}

fn bound(raw: &str) -> &str {
    match raw.char_indices().nth(MAX_INPUT) {
        Some((idx, _)) => &raw[..idx],
        None => raw,
    }
}

fn unquote(value: &str) -> &str {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

/// Strips a bracketed-IPv6 wrapper (`[::1]` or `[::1]:8080`) or a trailing
/// `:port` from an IPv4 literal. Bare IPv6 without brackets has no port to
/// strip (ambiguous with the address's own colons), so it passes through.
fn strip_port(value: &str) -> &str {
    if let Some(rest) = value.strip_prefix('[') {
        if let Some(end) = rest.find(']') {
            return &rest[..end];
        }
        return rest;
    }
    if value.matches(':').count() == 1 {
        if let Some(idx) = value.find(':') {
            return &value[..idx];
        }
    }
    value
}

fn truncate(value: &str) -> String {
    match value.char_indices().nth(MAX_RESULT) {
        Some((idx, _)) => value[..idx].to_string(),
        None => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untrusted_falls_back_to_peer_addr() {
        assert_eq!(extract(false, Some("1.2.3.4"), None, "9.9.9.9"), "9.9.9.9");
    }

    #[test]
    fn x_forwarded_for_takes_first_entry() {
        assert_eq!(extract(true, Some("1.2.3.4, 5.6.7.8"), None, "9.9.9.9"), "1.2.3.4");
    }

    #[test]
    fn x_forwarded_for_takes_precedence_over_forwarded() {
        assert_eq!(
            extract(true, Some("1.2.3.4"), Some("for=5.6.7.8"), "9.9.9.9"),
            "1.2.3.4"
        );
    }

    #[test]
    fn forwarded_unquoted() {
        assert_eq!(extract(true, None, Some("for=5.6.7.8;proto=https"), "9.9.9.9"), "5.6.7.8");
    }

    #[test]
    fn forwarded_quoted() {
        assert_eq!(extract(true, None, Some("for=\"5.6.7.8:1234\""), "9.9.9.9"), "5.6.7.8");
    }

    #[test]
    fn forwarded_bracketed_ipv6() {
        assert_eq!(
            extract(true, None, Some("for=\"[2001:db8::1]:443\""), "9.9.9.9"),
            "2001:db8::1"
        );
    }

    #[test]
    fn result_is_length_bounded() {
        let long = "a".repeat(200);
        assert!(extract(true, Some(long.as_str()), None, "9.9.9.9").len() <= MAX_RESULT);
    }

    #[test]
    fn no_usable_header_falls_back_to_peer_addr() {
        assert_eq!(extract(true, Some(""), Some(""), "9.9.9.9"), "9.9.9.9");
    }
}
