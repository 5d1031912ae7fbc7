//! Address parsing and family classification
//!
//! Annotation values are comma-separated lists of textual IP addresses.
//! This module turns one raw annotation string into validated, typed
//! addresses tagged by family. Malformed tokens are skipped with a
//! warning; they must never abort a sync cycle.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use tracing::warn;

/// IP address family of a validated address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressFamily {
    /// IPv4 (A records)
    V4,
    /// IPv6 (AAAA records)
    V6,
}

impl AddressFamily {
    /// The DNS record type this family maps to
    pub fn record_type(&self) -> &'static str {
        match self {
            AddressFamily::V4 => "A",
            AddressFamily::V6 => "AAAA",
        }
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressFamily::V4 => write!(f, "IPv4"),
            AddressFamily::V6 => write!(f, "IPv6"),
        }
    }
}

/// One validated network address from an annotation token
///
/// The textual form is the token exactly as written (after trimming) and
/// serves as the dedup and sort key. The family is fixed at parse time
/// from the parsed representation and never re-derived from the text.
///
/// ## Classification rule
///
/// Only canonical dotted-decimal literals classify as IPv4. Every other
/// valid literal classifies as IPv6, including embedded-IPv4 forms such
/// as `::ffff:192.0.2.1`. This matches the standard parser's variant
/// selection and is relied upon by the record type mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    text: String,
    ip: IpAddr,
}

impl Address {
    /// Parse a single trimmed token into an address, if valid
    fn parse(token: &str) -> Option<Self> {
        let ip: IpAddr = token.parse().ok()?;
        Some(Self {
            text: token.to_string(),
            ip,
        })
    }

    /// The validated textual form (dedup/sort key)
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The parsed binary form
    pub fn ip(&self) -> IpAddr {
        self.ip
    }

    /// The address family, derived from the parsed form
    pub fn family(&self) -> AddressFamily {
        match self.ip {
            IpAddr::V4(_) => AddressFamily::V4,
            IpAddr::V6(_) => AddressFamily::V6,
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.text, self.family())
    }
}

/// Parse a comma-separated annotation value into validated addresses
///
/// - Tokens are trimmed of surrounding whitespace.
/// - Empty tokens are silently skipped.
/// - Invalid tokens are skipped with a warning; parsing never fails.
/// - An empty or absent value yields an empty vector.
pub fn parse_address_list(raw: &str) -> Vec<Address> {
    if raw.is_empty() {
        return Vec::new();
    }

    let mut addresses = Vec::new();
    for token in raw.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }

        match Address::parse(token) {
            Some(address) => addresses.push(address),
            None => {
                warn!(token, "skipping invalid IP address in annotation");
            }
        }
    }

    addresses
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mixed_family_list() {
        let addrs =
            parse_address_list("152.67.73.95,2603:c022:5:1e00:a452:9f75:7f83:3a88");

        assert_eq!(addrs.len(), 2);
        assert_eq!(addrs[0].text(), "152.67.73.95");
        assert_eq!(addrs[0].family(), AddressFamily::V4);
        assert_eq!(
            addrs[1].text(),
            "2603:c022:5:1e00:a452:9f75:7f83:3a88"
        );
        assert_eq!(addrs[1].family(), AddressFamily::V6);
    }

    #[test]
    fn trims_whitespace_around_tokens() {
        let addrs = parse_address_list("192.168.1.1, 10.0.0.1");

        assert_eq!(addrs.len(), 2);
        assert_eq!(addrs[0].text(), "192.168.1.1");
        assert_eq!(addrs[1].text(), "10.0.0.1");
    }

    #[test]
    fn empty_input_yields_no_addresses() {
        assert!(parse_address_list("").is_empty());
        assert!(parse_address_list("   ").is_empty());
        assert!(parse_address_list(",,,").is_empty());
    }

    #[test]
    fn invalid_tokens_are_skipped() {
        let addrs = parse_address_list("invalid-ip");
        assert!(addrs.is_empty());

        let addrs = parse_address_list("10.0.0.1,not-an-ip,10.0.0.2");
        assert_eq!(addrs.len(), 2);
        assert_eq!(addrs[0].text(), "10.0.0.1");
        assert_eq!(addrs[1].text(), "10.0.0.2");
    }

    #[test]
    fn only_dotted_decimal_classifies_as_v4() {
        let v4 = parse_address_list("203.0.113.7");
        assert_eq!(v4[0].family(), AddressFamily::V4);

        let v6 = parse_address_list("2001:db8::1");
        assert_eq!(v6[0].family(), AddressFamily::V6);

        // Embedded-IPv4 literals classify as IPv6: only the canonical
        // 4-octet form counts as IPv4.
        let mapped = parse_address_list("::ffff:192.0.2.1");
        assert_eq!(mapped[0].family(), AddressFamily::V6);
        assert_eq!(mapped[0].text(), "::ffff:192.0.2.1");
    }

    #[test]
    fn text_preserves_original_form() {
        // Non-canonical but valid IPv6 spellings keep their textual form.
        let addrs = parse_address_list("2001:DB8::1");
        assert_eq!(addrs[0].text(), "2001:DB8::1");
    }

    #[test]
    fn record_type_mapping() {
        assert_eq!(AddressFamily::V4.record_type(), "A");
        assert_eq!(AddressFamily::V6.record_type(), "AAAA");
    }
}
