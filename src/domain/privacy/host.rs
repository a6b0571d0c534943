//! Host classification for anonymized identifiers.
//!
//! A host is reduced to a coarse class that is useful for grouping
//! (`localhost`, `private-ip`, `public-ip`, `domain-<suffix>`) and says nothing
//! about which machine it was.

use std::net::{IpAddr, Ipv6Addr};

/// Public suffixes kept whole when reducing a domain to its suffix.
const TWO_PART_SUFFIXES: &[&str] = &[
    "co.uk", "co.nz", "co.za", "co.jp", "gov.uk", "gov.au", "gov.ca", "ac.uk", "edu.au",
    "org.uk", "net.au", "com.au",
];

/// Coarse classification of a host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostClass {
    Localhost,
    PrivateIp,
    PublicIp,
    /// Domain name, reduced to its public suffix
    Domain(String),
    Unknown,
}

impl HostClass {
    /// Label used in anonymized identifiers.
    pub fn label(&self) -> String {
        match self {
            HostClass::Localhost => "localhost".to_string(),
            HostClass::PrivateIp => "private-ip".to_string(),
            HostClass::PublicIp => "public-ip".to_string(),
            HostClass::Domain(suffix) => format!("domain-{}", suffix),
            HostClass::Unknown => "unknown-host".to_string(),
        }
    }
}

/// Parse a host string as an IP address, accepting bracketed IPv6 literals.
pub fn parse_ip(host: &str) -> Option<IpAddr> {
    let trimmed = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    trimmed.parse().ok()
}

fn is_internal_v6(ip: &Ipv6Addr) -> bool {
    let first = ip.segments()[0];
    ip.is_loopback()
        || ip.is_multicast()
        // fc00::/7 unique local
        || (first & 0xfe00) == 0xfc00
        // fe80::/10 link local
        || (first & 0xffc0) == 0xfe80
}

/// Whether an address belongs to a private, loopback or link-local range.
pub fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => v4.is_private() || v4.is_loopback() || v4.is_link_local(),
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => v4.is_private() || v4.is_loopback() || v4.is_link_local(),
            None => is_internal_v6(v6),
        },
    }
}

/// Classify a host name or address literal.
pub fn categorize_host(host: &str) -> HostClass {
    if host.eq_ignore_ascii_case("localhost") {
        return HostClass::Localhost;
    }

    if let Some(ip) = parse_ip(host) {
        return categorize_ip(&ip);
    }

    categorize_domain(host)
}

/// Classify an already parsed address.
pub fn categorize_ip(ip: &IpAddr) -> HostClass {
    if ip.is_loopback() {
        HostClass::Localhost
    } else if is_private_ip(ip) {
        HostClass::PrivateIp
    } else {
        HostClass::PublicIp
    }
}

fn categorize_domain(host: &str) -> HostClass {
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    let parts: Vec<&str> = host.split('.').collect();
    if parts.len() < 2 || parts.iter().any(|p| p.is_empty()) {
        return HostClass::Unknown;
    }

    if parts.len() >= 3 {
        let two_part = format!("{}.{}", parts[parts.len() - 2], parts[parts.len() - 1]);
        if TWO_PART_SUFFIXES.contains(&two_part.as_str()) {
            return HostClass::Domain(two_part);
        }
    }

    HostClass::Domain(parts[parts.len() - 1].to_string())
}
