//! URL and address anonymization.
//!
//! A URL is reduced to its structure (scheme, host class, port, shape of the
//! path) and that structure is hashed into a short token. The same URL always
//! yields the same token, while host names, credentials, queries and opaque
//! path segments never appear in the output.

use super::host::{categorize_host, categorize_ip};
use sha2::{Digest, Sha256};
use std::net::IpAddr;
use url::Url;

/// Prefix of anonymized URL tokens.
pub const URL_TOKEN_PREFIX: &str = "url-";

/// Bytes of SHA-256 kept for URL tokens (24 hex chars).
const URL_HASH_BYTES: usize = 12;
/// Bytes kept for anonymized addresses (16 hex chars).
const IP_HASH_BYTES: usize = 8;
/// Bytes kept for hashed path segments (8 hex chars).
const SEGMENT_HASH_BYTES: usize = 4;

/// Path segments that name a stream rather than identify anything.
const STREAM_KEYWORDS: &[&str] = &[
    "stream", "live", "rtsp", "video", "audio", "feed", "cam", "camera",
];

fn truncated_sha256(input: &str, bytes: usize) -> String {
    let digest = Sha256::digest(input.as_bytes());
    hex::encode(&digest[..bytes])
}

fn is_stream_keyword(segment: &str) -> bool {
    let lower = segment.to_ascii_lowercase();
    STREAM_KEYWORDS.iter().any(|k| lower.contains(k))
}

fn is_numeric(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

/// Shape of a URL path with opaque segments hashed.
///
/// `/live/42/backyard` becomes `path-stream/path-numeric/path-seg-xxxxxxxx`.
pub fn anonymize_path(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        return "path-root".to_string();
    }

    trimmed
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            if is_stream_keyword(segment) {
                "path-stream".to_string()
            } else if is_numeric(segment) {
                "path-numeric".to_string()
            } else {
                format!(
                    "path-seg-{}",
                    truncated_sha256(segment, SEGMENT_HASH_BYTES)
                )
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Replace a URL with a stable `url-<hex>` token.
///
/// Unparseable input is hashed as-is so it still maps to a stable token.
pub fn anonymize_url(raw: &str) -> String {
    let parsed = match Url::parse(raw) {
        Ok(parsed) => parsed,
        Err(_) => {
            return format!(
                "{}{}",
                URL_TOKEN_PREFIX,
                truncated_sha256(raw, URL_HASH_BYTES)
            )
        }
    };

    let mut parts: Vec<String> = Vec::with_capacity(4);
    parts.push(parsed.scheme().to_string());

    if let Some(host) = parsed.host_str().filter(|h| !h.is_empty()) {
        parts.push(categorize_host(host).label());
    }

    if let Some(port) = parsed.port() {
        parts.push(format!("port-{}", port));
    }

    let path = parsed.path();
    if !path.is_empty() && path != "/" {
        parts.push(anonymize_path(path));
    }

    format!(
        "{}{}",
        URL_TOKEN_PREFIX,
        truncated_sha256(&parts.join(":"), URL_HASH_BYTES)
    )
}

/// Replace an address with `<class>-<hex>`, keeping only its class.
pub fn anonymize_ip(ip: &IpAddr) -> String {
    format!(
        "{}-{}",
        categorize_ip(ip).label(),
        truncated_sha256(&ip.to_string(), IP_HASH_BYTES)
    )
}
