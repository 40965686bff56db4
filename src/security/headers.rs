//! Header normalization and sanitization.
//!
//! # Responsibilities
//! - Normalize `HeaderMap` into an ordered string map once at the boundary
//! - Strip hop-by-hop and client-identifying headers before forwarding
//! - Optionally strip the same set from upstream responses
//!
//! # Design Decisions
//! - Matching is case-insensitive regardless of how keys were produced
//! - Sanitization is a pure function over the normalized map
//! - Framing headers are handled separately: the proxy re-frames bodies itself

use std::collections::BTreeMap;

use axum::http::{HeaderMap, HeaderName, HeaderValue};

/// Normalized header representation: lowercase name → single value.
pub type HeaderMapping = BTreeMap<String, String>;

/// Exact header names never forwarded.
const DENIED_HEADERS: &[&str] = &[
    "host",
    "connection",
    "cookie",
    "pragma",
    "referer",
    "user-agent",
];

/// Header name prefixes never forwarded.
const DENIED_PREFIXES: &[&str] = &["x-forwarded-", "sec-fetch-", "sec-ch-ua"];

/// Message-framing headers owned by the connection, never copied across legs.
const FRAMING_HEADERS: &[&str] = &[
    "content-length",
    "transfer-encoding",
    "keep-alive",
    "te",
    "trailer",
    "upgrade",
    "proxy-connection",
];

/// Returns true if `name` is on the forwarding denylist.
pub fn is_denied(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    DENIED_HEADERS.contains(&name.as_str())
        || DENIED_PREFIXES.iter().any(|prefix| name.starts_with(prefix))
}

/// Returns true if `name` frames the message on a single connection leg.
pub fn is_framing(name: &str) -> bool {
    FRAMING_HEADERS
        .iter()
        .any(|framing| framing.eq_ignore_ascii_case(name))
}

/// Remove every denylisted header.
pub fn sanitize(headers: &HeaderMapping) -> HeaderMapping {
    headers
        .iter()
        .filter(|(name, _)| !is_denied(name))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

/// Normalize a `HeaderMap`, joining repeated values with `", "`.
pub fn headers_to_map(headers: &HeaderMap) -> HeaderMapping {
    let mut map = HeaderMapping::new();
    for name in headers.keys() {
        let joined = headers
            .get_all(name)
            .iter()
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
            .collect::<Vec<_>>()
            .join(", ");
        map.insert(name.as_str().to_ascii_lowercase(), joined);
    }
    map
}

/// Convert a normalized map back into a `HeaderMap`.
///
/// Framing headers and entries that are not valid HTTP are dropped.
pub fn map_to_headers(map: &HeaderMapping) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(map.len());
    for (name, value) in map {
        if is_framing(name) {
            continue;
        }
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => tracing::debug!(header = %name, "Dropping header that is not valid HTTP"),
        }
    }
    headers
}
