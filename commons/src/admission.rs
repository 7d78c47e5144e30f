//! API-key-or-CIDR admission checks (spec §4.9).

use ipnet::IpNet;
use std::net::IpAddr;

/// Header carrying the client-supplied API key.
pub static API_KEY_HEADER: &str = "X-API-Key";

/// Constant-time comparison of the presented key against the configured one.
///
/// Bails out early only on length mismatch (which is not secret), then
/// compares every byte regardless of where the first difference occurs, so
/// response timing does not leak how many leading bytes matched.
pub fn compare_keys(expected: &str, presented: &str) -> bool {
    let expected = expected.as_bytes();
    let presented = presented.as_bytes();
    if expected.len() != presented.len() {
        return false;
    }
    let mut diff = 0u8;
    for (a, b) in expected.iter().zip(presented.iter()) {
        diff |= a ^ b;
    }
    diff == 0
}

/// Parse a comma-separated list of CIDR ranges, e.g. `ALLOWED_IP_RANGES`.
pub fn parse_allowed_ranges<S: AsRef<str>>(ranges: S) -> Vec<IpNet> {
    ranges
        .as_ref()
        .split(',')
        .filter_map(|entry| {
            let trimmed = entry.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<IpNet>().ok()
        })
        .collect()
}

/// Whether `addr` falls within any of the configured allow-listed ranges.
pub fn addr_allowed(addr: IpAddr, ranges: &[IpNet]) -> bool {
    ranges.iter().any(|net| net.contains(&addr))
}

/// Decide whether a request is admitted: either its presented key matches
/// exactly, or its source address is within the allow-list.
pub fn is_admitted(
    expected_key: &str,
    presented_key: Option<&str>,
    addr: Option<IpAddr>,
    allowed_ranges: &[IpNet],
) -> bool {
    if let Some(key) = presented_key {
        if compare_keys(expected_key, key) {
            return true;
        }
    }
    if let Some(addr) = addr {
        if addr_allowed(addr, allowed_ranges) {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compare_keys_matches_exact() {
        assert!(compare_keys("secret", "secret"));
        assert!(!compare_keys("secret", "secre"));
        assert!(!compare_keys("secret", "SECRET"));
        assert!(!compare_keys("secret", "secrets"));
    }

    #[test]
    fn parses_multiple_ranges() {
        let ranges = parse_allowed_ranges("127.0.0.1/32, 10.0.0.0/8 ,not-a-cidr");
        assert_eq!(ranges.len(), 2);
    }

    #[test]
    fn addr_within_allow_list() {
        let ranges = parse_allowed_ranges("127.0.0.1/32,10.0.0.0/8");
        assert!(addr_allowed("127.0.0.1".parse().unwrap(), &ranges));
        assert!(addr_allowed("10.1.2.3".parse().unwrap(), &ranges));
        assert!(!addr_allowed("8.8.8.8".parse().unwrap(), &ranges));
    }

    #[test]
    fn admission_bypass_without_key() {
        let ranges = parse_allowed_ranges("127.0.0.1/32");
        assert!(is_admitted(
            "s3cr3t",
            None,
            Some("127.0.0.1".parse().unwrap()),
            &ranges
        ));
        assert!(!is_admitted(
            "s3cr3t",
            None,
            Some("8.8.8.8".parse().unwrap()),
            &ranges
        ));
    }

    #[test]
    fn admission_via_key_regardless_of_address() {
        let ranges: Vec<IpNet> = Vec::new();
        assert!(is_admitted(
            "s3cr3t",
            Some("s3cr3t"),
            Some("8.8.8.8".parse().unwrap()),
            &ranges
        ));
        assert!(!is_admitted(
            "s3cr3t",
            Some("wrong"),
            Some("8.8.8.8".parse().unwrap()),
            &ranges
        ));
    }
}
