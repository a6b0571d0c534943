//! Compiled patterns for sensitive substrings.

use regex::Regex;
use std::sync::LazyLock;

macro_rules! scrub_pattern {
    ($name:ident, $regex_str:expr) => {
        pub static $name: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new($regex_str).ok());
    };
}

// URL-like substrings: a known scheme, in any case, followed by any
// non-whitespace. Unanchored, so identifier prefixes like `endpoint_` don't hide it.
scrub_pattern!(RE_URL, r"(?i)(?:https?|rtsp|rtmp)://\S+");

scrub_pattern!(
    RE_EMAIL,
    r"\b[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}\b"
);

scrub_pattern!(
    RE_UUID,
    r"\b[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}\b"
);

scrub_pattern!(
    RE_IPV4,
    r"\b(?:(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.){3}(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\b"
);

// Candidate IPv6 runs. A candidate is replaced only when it parses as an
// address and is not glued to surrounding word characters.
scrub_pattern!(RE_IPV6, r"(?:[0-9a-fA-F]{0,4}:){2,7}[0-9a-fA-F]{0,4}");

// Keyword-tagged coordinate pairs such as `lat=60.17 lon=24.94`.
scrub_pattern!(
    RE_COORDINATES,
    r"(?i)\b(?:lat|latitude)\s*[:=]\s*-?\d{1,3}(?:\.\d+)?[,;\s]+(?:lon|lng|longitude)\s*[:=]\s*-?\d{1,3}(?:\.\d+)?"
);

// Credentials following a keyword; group 1 keeps the keyword and separator.
scrub_pattern!(
    RE_API_TOKEN,
    r"(?i)\b((?:api[_\-]?key|access[_\-]?token|token|secret|password|auth)\s*[:=]\s*|bearer\s+)[A-Za-z0-9+/_\-]{8,}=*"
);
