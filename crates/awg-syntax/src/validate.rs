//! Value predicates.
//!
//! Every function takes the raw bytes of one value, already trimmed of
//! surrounding whitespace, and never reads outside that slice.

use std::ops::Range;

/// Base64 characters allowed in the 43rd position of a clamped 32-byte key.
const CLAMPED_KEY_TAIL: &[u8] = b"AEIMQUYcgkosw480";

/// `PrivateKey`, `PublicKey` and `PresharedKey`: 44 chars of base64 encoding
/// 32 bytes, where the low bits of the last byte are always zero.
pub fn is_valid_key(s: &[u8]) -> bool {
    if s.len() != 44 || s[43] != b'=' {
        return false;
    }
    if !s[..42]
        .iter()
        .all(|&c| c.is_ascii_alphanumeric() || c == b'/' || c == b'+')
    {
        return false;
    }
    CLAMPED_KEY_TAIL.contains(&s[42])
}

/// Parse an unsigned integer of at most 10 characters.
///
/// With `allow_hex`, a `0x` prefix switches to case-insensitive hex digits.
pub fn parse_uint(s: &[u8], allow_hex: bool) -> Option<u64> {
    // Ten digits keep the value well inside u64, so no overflow checks.
    if s.is_empty() || s.len() > 10 {
        return None;
    }
    let mut val = 0u64;
    if allow_hex && s.len() > 2 && s[0] == b'0' && s[1] == b'x' {
        for &c in &s[2..] {
            let digit = (c as char).to_digit(16)?;
            val = 16 * val + u64::from(digit);
        }
    } else {
        for &c in s {
            if !c.is_ascii_digit() {
                return None;
            }
            val = 10 * val + u64::from(c - b'0');
        }
    }
    Some(val)
}

/// Decimal integer within `min..=max`.
pub fn is_valid_uint(s: &[u8], min: u64, max: u64) -> bool {
    parse_uint(s, false).is_some_and(|v| (min..=max).contains(&v))
}

pub fn is_valid_port(s: &[u8]) -> bool {
    is_valid_uint(s, 0, 65_535)
}

pub fn is_valid_mtu(s: &[u8]) -> bool {
    is_valid_uint(s, 576, 65_535)
}

pub fn is_valid_table(s: &[u8]) -> bool {
    matches!(s, b"off" | b"auto" | b"main") || is_valid_uint(s, 0, u64::from(u32::MAX))
}

pub fn is_valid_keepalive(s: &[u8]) -> bool {
    s == b"off" || is_valid_uint(s, 0, 65_535)
}

/// Shell commands are not inspected beyond being present.
pub fn is_valid_command(s: &[u8]) -> bool {
    !s.is_empty()
}

/// A DNS name that is not made of digits alone.
pub fn is_valid_hostname(s: &[u8]) -> bool {
    if s.is_empty() || s.len() > 63 {
        return false;
    }
    let (first, last) = (s[0], s[s.len() - 1]);
    if first == b'-' || last == b'-' || first == b'.' || last == b'.' {
        return false;
    }

    let mut digits = 0;
    // Characters other than dots.
    let mut entities = s.len();
    for (i, &c) in s.iter().enumerate() {
        if c.is_ascii_digit() {
            digits += 1;
            continue;
        }
        if c == b'.' {
            if i != 0 && s[i - 1] == b'.' {
                return false;
            }
            entities -= 1;
            continue;
        }
        if !c.is_ascii_alphabetic() && c != b'-' {
            return false;
        }
    }
    digits != entities
}

/// Dotted quad, no leading zeros.
pub fn is_valid_ipv4(s: &[u8]) -> bool {
    let mut pos = 0;
    for group in 0..4 {
        if pos >= s.len() {
            return false;
        }
        let mut val = 0u32;
        let mut j = 0;
        while j < 3 && pos + j < s.len() && s[pos + j].is_ascii_digit() {
            val = 10 * val + u32::from(s[pos + j] - b'0');
            j += 1;
        }
        if j == 0 || (j > 1 && s[pos] == b'0') || val > 255 {
            return false;
        }
        if pos + j == s.len() {
            return group == 3;
        }
        if s[pos + j] != b'.' {
            return false;
        }
        pos += j + 1;
    }
    false
}

/// Up to eight hextets with at most one `::`, optionally ending in a dotted quad.
pub fn is_valid_ipv6(s: &[u8]) -> bool {
    let len = s.len();
    if len < 2 {
        return false;
    }
    let mut pos = 0;
    if s[0] == b':' {
        if s[1] != b':' {
            return false;
        }
        pos = 1;
    }
    if s[len - 1] == b':' && s[len - 2] != b':' {
        return false;
    }

    let mut seen_compression = false;
    let mut group = 0;
    while pos < len {
        if s[pos] == b':' && !seen_compression {
            seen_compression = true;
            pos += 1;
            if pos == len {
                break;
            }
            if group == 7 {
                return false;
            }
            group += 1;
            continue;
        }

        let mut j = 0;
        while j < 4 && pos + j < len && s[pos + j].is_ascii_hexdigit() {
            j += 1;
        }
        if j == 0 {
            return false;
        }
        if pos + j == len && (seen_compression || group == 7) {
            break;
        }
        if group == 7 || pos + j == len {
            return false;
        }
        if s[pos + j] != b':' {
            if s[pos + j] != b'.' || (group < 6 && !seen_compression) {
                return false;
            }
            return is_valid_ipv4(&s[pos..]);
        }
        pos += j + 1;
        group += 1;
    }
    true
}

/// IPv6 zone id: `[A-Za-z0-9_=+.-]{1,64}`.
pub fn is_valid_scope(s: &[u8]) -> bool {
    !s.is_empty()
        && s.len() <= 64
        && s.iter()
            .all(|&c| c.is_ascii_alphanumeric() || matches!(c, b'_' | b'=' | b'+' | b'.' | b'-'))
}

/// The pieces of a well-formed `Endpoint` value, as offsets into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointParts {
    /// The host, without brackets; includes `%scope` when present.
    pub host: Range<usize>,
    /// Whether the host was written as `[...]`.
    pub bracketed: bool,
    /// Whether the host is an IP literal rather than a DNS name.
    pub host_is_ip: bool,
    /// Offset of the `:` before the port.
    pub colon: usize,
}

/// Split `host:port` or `[ipv6%scope]:port`, validating each piece.
pub fn parse_endpoint(s: &[u8]) -> Option<EndpointParts> {
    if s.first() == Some(&b'[') {
        return parse_bracketed_endpoint(s);
    }
    let colon = s.iter().position(|&c| c == b':')?;
    let (host, port) = (&s[..colon], &s[colon + 1..]);
    if !is_valid_port(port) {
        return None;
    }
    let host_is_ip = is_valid_ipv4(host);
    if !host_is_ip && !is_valid_hostname(host) {
        return None;
    }
    Some(EndpointParts {
        host: 0..colon,
        bracketed: false,
        host_is_ip,
        colon,
    })
}

fn parse_bracketed_endpoint(s: &[u8]) -> Option<EndpointParts> {
    let mut seen_scope = false;
    let mut part_start = 1;
    for i in 1..s.len() {
        match s[i] {
            b'%' => {
                if seen_scope || !is_valid_ipv6(&s[part_start..i]) {
                    return None;
                }
                seen_scope = true;
                part_start = i + 1;
            }
            b']' => {
                let part = &s[part_start..i];
                let valid = if seen_scope {
                    is_valid_scope(part)
                } else {
                    is_valid_ipv6(part)
                };
                if !valid || s.get(i + 1) != Some(&b':') || !is_valid_port(&s[i + 2..]) {
                    return None;
                }
                return Some(EndpointParts {
                    host: 1..i,
                    bracketed: true,
                    host_is_ip: true,
                    colon: i + 1,
                });
            }
            _ => {}
        }
    }
    None
}

pub fn is_valid_endpoint(s: &[u8]) -> bool {
    parse_endpoint(s).is_some()
}

/// `ip` or `ip/cidr`, with the prefix bounded by the address family.
pub fn is_valid_network(s: &[u8]) -> bool {
    let Some(slash) = s.iter().position(|&c| c == b'/') else {
        return is_valid_ipv4(s) || is_valid_ipv6(s);
    };
    let (ip, cidr) = (&s[..slash], &s[slash + 1..]);
    if cidr.is_empty() || cidr.len() > 3 || !cidr.iter().all(u8::is_ascii_digit) {
        return false;
    }
    let prefix = cidr
        .iter()
        .fold(0u16, |acc, &c| 10 * acc + u16::from(c - b'0'));
    if is_valid_ipv4(ip) {
        prefix <= 32
    } else if is_valid_ipv6(ip) {
        prefix <= 128
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facet_testhelpers::test;

    const KEY: &str = "yAnz5TF+lXXJte14tji3zlMNq+hd2rYUIgJBgB3fBmk=";

    #[test]
    fn test_key_shape() {
        assert!(is_valid_key(KEY.as_bytes()));
        assert!(!is_valid_key(&KEY.as_bytes()[..43]));
        assert!(!is_valid_key(KEY.replace('=', "A").as_bytes()));
        assert!(!is_valid_key(KEY.replacen('y', "-", 1).as_bytes()));
    }

    #[test]
    fn test_key_clamp_character() {
        let mut key = KEY.as_bytes().to_vec();
        for &c in CLAMPED_KEY_TAIL {
            key[42] = c;
            assert!(is_valid_key(&key), "{} should be accepted", c as char);
        }
        for &c in b"BDFZbdz1239+/" {
            key[42] = c;
            assert!(!is_valid_key(&key), "{} should be rejected", c as char);
        }
    }

    #[test]
    fn test_uint() {
        assert_eq!(parse_uint(b"0", false), Some(0));
        assert_eq!(parse_uint(b"4294967295", false), Some(4_294_967_295));
        assert_eq!(parse_uint(b"99999999999", false), None);
        assert_eq!(parse_uint(b"", false), None);
        assert_eq!(parse_uint(b"12a", false), None);
        assert_eq!(parse_uint(b"-1", false), None);
        assert_eq!(parse_uint(b"0x1F", true), Some(31));
        assert_eq!(parse_uint(b"0xff", true), Some(255));
        assert_eq!(parse_uint(b"0x1F", false), None);
        assert_eq!(parse_uint(b"0X1F", true), None);
        assert_eq!(parse_uint(b"0x", true), None);
        assert_eq!(parse_uint(b"0xg", true), None);
    }

    #[test]
    fn test_numeric_fields() {
        assert!(is_valid_port(b"51820"));
        assert!(is_valid_port(b"0"));
        assert!(!is_valid_port(b"65536"));
        assert!(is_valid_mtu(b"576"));
        assert!(!is_valid_mtu(b"575"));
        assert!(is_valid_mtu(b"1420"));
        assert!(is_valid_table(b"off"));
        assert!(is_valid_table(b"auto"));
        assert!(is_valid_table(b"main"));
        assert!(is_valid_table(b"4294967295"));
        assert!(!is_valid_table(b"4294967296"));
        assert!(!is_valid_table(b"Main"));
        assert!(is_valid_keepalive(b"off"));
        assert!(is_valid_keepalive(b"25"));
        assert!(!is_valid_keepalive(b"auto"));
        assert!(!is_valid_keepalive(b"65536"));
        assert!(is_valid_command(b"iptables -A FORWARD"));
        assert!(!is_valid_command(b""));
    }

    #[test]
    fn test_hostname() {
        assert!(is_valid_hostname(b"example.com"));
        assert!(is_valid_hostname(b"vpn-1.example.org"));
        assert!(is_valid_hostname(b"localhost"));
        assert!(is_valid_hostname(b"1a"));
        assert!(!is_valid_hostname(b""));
        assert!(!is_valid_hostname(b"-example.com"));
        assert!(!is_valid_hostname(b"example.com-"));
        assert!(!is_valid_hostname(b".example.com"));
        assert!(!is_valid_hostname(b"example.com."));
        assert!(!is_valid_hostname(b"exa..mple"));
        assert!(!is_valid_hostname(b"exa_mple.com"));
        assert!(!is_valid_hostname("bücher.de".as_bytes()));
        assert!(!is_valid_hostname(&[b'a'; 64]));
        assert!(is_valid_hostname(&[b'a'; 63]));
    }

    #[test]
    fn test_hostname_rejects_all_digit_names() {
        assert!(!is_valid_hostname(b"1"));
        assert!(!is_valid_hostname(b"123"));
        assert!(!is_valid_hostname(b"1.2.3.4"));
        assert!(!is_valid_hostname(b"300.300.300.300"));
        // A single non-digit is enough.
        assert!(is_valid_hostname(b"1.2.3.a"));
        assert!(is_valid_hostname(b"1-2"));
    }

    #[test]
    fn test_ipv4() {
        assert!(is_valid_ipv4(b"0.0.0.0"));
        assert!(is_valid_ipv4(b"10.0.0.1"));
        assert!(is_valid_ipv4(b"255.255.255.255"));
        assert!(!is_valid_ipv4(b"256.0.0.1"));
        assert!(!is_valid_ipv4(b"01.0.0.1"));
        assert!(!is_valid_ipv4(b"1.2.3"));
        assert!(!is_valid_ipv4(b"1.2.3."));
        assert!(!is_valid_ipv4(b"1.2.3.4.5"));
        assert!(!is_valid_ipv4(b"1.2.3.4 "));
        assert!(!is_valid_ipv4(b"1..3.4"));
        assert!(!is_valid_ipv4(b"1234.1.1.1"));
        assert!(!is_valid_ipv4(b""));
    }

    #[test]
    fn test_ipv6() {
        assert!(is_valid_ipv6(b"::"));
        assert!(is_valid_ipv6(b"::1"));
        assert!(is_valid_ipv6(b"fe80::"));
        assert!(is_valid_ipv6(b"fd00::1"));
        assert!(is_valid_ipv6(b"2001:db8:0:0:0:0:0:1"));
        assert!(is_valid_ipv6(b"2001:DB8::8:800:200C:417A"));
        assert!(is_valid_ipv6(b"::ffff:192.168.1.1"));
        assert!(is_valid_ipv6(b"0:0:0:0:0:ffff:10.0.0.1"));
        assert!(is_valid_ipv6(b"1:2:3:4:5:6:7::"));
        assert!(!is_valid_ipv6(b":"));
        assert!(!is_valid_ipv6(b":1"));
        assert!(!is_valid_ipv6(b"1:"));
        assert!(!is_valid_ipv6(b"1::2::3"));
        assert!(!is_valid_ipv6(b":::"));
        assert!(!is_valid_ipv6(b"12345::"));
        assert!(!is_valid_ipv6(b"1:2:3:4:5:6:7"));
        assert!(!is_valid_ipv6(b"1:2:3:4:5:6:7:8:9"));
        assert!(!is_valid_ipv6(b"1:2:3:4:192.168.1.1"));
        assert!(!is_valid_ipv6(b"::ffff:192.168.1"));
        assert!(!is_valid_ipv6(b"g::1"));
    }

    #[test]
    fn test_scope() {
        assert!(is_valid_scope(b"eth0"));
        assert!(is_valid_scope(b"a_b=c+d.e-f"));
        assert!(!is_valid_scope(b""));
        assert!(!is_valid_scope(b"eth 0"));
        assert!(!is_valid_scope(b"eth%0"));
        assert!(!is_valid_scope(&[b'a'; 65]));
    }

    #[test]
    fn test_endpoint() {
        let parts = parse_endpoint(b"example.com:51820").unwrap();
        assert_eq!(parts.host, 0..11);
        assert_eq!(parts.colon, 11);
        assert!(!parts.host_is_ip);
        assert!(!parts.bracketed);

        let parts = parse_endpoint(b"1.2.3.4:51820").unwrap();
        assert!(parts.host_is_ip);

        let parts = parse_endpoint(b"[fe80::1%eth0]:51820").unwrap();
        assert_eq!(parts.host, 1..13);
        assert_eq!(parts.colon, 14);
        assert!(parts.bracketed);

        assert!(is_valid_endpoint(b"[::1]:0"));
        assert!(!is_valid_endpoint(b""));
        assert!(!is_valid_endpoint(b"1.2.3.4"));
        assert!(!is_valid_endpoint(b"1.2.3.4:"));
        assert!(!is_valid_endpoint(b"1.2.3.4:65536"));
        assert!(!is_valid_endpoint(b"::1:51820"));
        assert!(!is_valid_endpoint(b"[::1]"));
        assert!(!is_valid_endpoint(b"[::1]51820"));
        assert!(!is_valid_endpoint(b"[::1:51820"));
        assert!(!is_valid_endpoint(b"[1.2.3.4]:51820"));
        assert!(!is_valid_endpoint(b"[fe80::1%]:51820"));
        assert!(!is_valid_endpoint(b"[fe80::1%a%b]:51820"));
        assert!(!is_valid_endpoint(b"[zz%eth0]:51820"));
        assert!(!is_valid_endpoint(b"bad_host:51820"));
    }

    #[test]
    fn test_network() {
        assert!(is_valid_network(b"10.0.0.1"));
        assert!(is_valid_network(b"10.0.0.1/32"));
        assert!(is_valid_network(b"0.0.0.0/0"));
        assert!(!is_valid_network(b"10.0.0.1/33"));
        assert!(!is_valid_network(b"10.0.0.1/"));
        assert!(!is_valid_network(b"10.0.0.1/1a"));
        assert!(!is_valid_network(b"10.0.0.1/0032"));
        assert!(is_valid_network(b"::/0"));
        assert!(is_valid_network(b"fd00::1/128"));
        assert!(!is_valid_network(b"fd00::1/129"));
        assert!(!is_valid_network(b"example.com/24"));
        assert!(!is_valid_network(b"example.com"));
    }
}
