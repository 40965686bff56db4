//! Backend origin abstraction.
//!
//! # Responsibilities
//! - Represent a single backend origin (scheme + host + port, optional base path)
//! - Build outbound URLs for rewritten paths

use std::fmt;

use url::Url;

/// Error produced when an origin URL cannot be used as a target.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TargetError {
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("unsupported scheme '{scheme}' in '{url}' (only http origins are supported)")]
    UnsupportedScheme { url: String, scheme: String },

    #[error("URL '{0}' has no host")]
    MissingHost(String),
}

/// A single backend origin. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Where this target was configured (e.g. `BACKEND_2`).
    source: String,
    /// Parsed base URL.
    base_url: Url,
    /// Base URL without trailing slash; used as the diagnostic identifier.
    id: String,
}

impl Target {
    /// Parse an origin base URL.
    pub fn parse(source: impl Into<String>, raw: &str) -> Result<Self, TargetError> {
        let raw = raw.trim();
        let base_url = Url::parse(raw).map_err(|e| TargetError::InvalidUrl {
            url: raw.to_string(),
            reason: e.to_string(),
        })?;

        if base_url.scheme() != "http" {
            return Err(TargetError::UnsupportedScheme {
                url: raw.to_string(),
                scheme: base_url.scheme().to_string(),
            });
        }
        if base_url.host_str().is_none() {
            return Err(TargetError::MissingHost(raw.to_string()));
        }

        let id = base_url.as_str().trim_end_matches('/').to_string();
        Ok(Self {
            source: source.into(),
            base_url,
            id,
        })
    }

    /// Identifier reported in diagnostic headers and error bodies.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Configuration source of this target.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Absolute outbound URL for a backend path and optional query string.
    pub fn url_for(&self, path: &str, query: Option<&str>) -> String {
        let mut url = String::with_capacity(self.id.len() + path.len() + 16);
        url.push_str(&self.id);
        if !path.starts_with('/') {
            url.push('/');
        }
        url.push_str(path);
        if let Some(query) = query.filter(|q| !q.is_empty()) {
            url.push('?');
            url.push_str(query);
        }
        url
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_trimmed_from_id() {
        let target = Target::parse("BACKEND_1", "http://127.0.0.1:8000/").unwrap();
        assert_eq!(target.id(), "http://127.0.0.1:8000");
        assert_eq!(target.source(), "BACKEND_1");
    }

    #[test]
    fn url_for_joins_path_and_query() {
        let target = Target::parse("t", "http://api.internal:3000").unwrap();
        assert_eq!(
            target.url_for("/api/posts", Some("page=2")),
            "http://api.internal:3000/api/posts?page=2"
        );
        assert_eq!(target.url_for("/api/posts", Some("")), "http://api.internal:3000/api/posts");
        assert_eq!(target.url_for("health", None), "http://api.internal:3000/health");
    }

    #[test]
    fn base_path_is_preserved() {
        let target = Target::parse("t", "http://api.internal:3000/v1/").unwrap();
        assert_eq!(target.url_for("/api/posts", None), "http://api.internal:3000/v1/api/posts");
    }

    #[test]
    fn rejects_non_http_origins() {
        assert!(matches!(
            Target::parse("t", "https://example.com"),
            Err(TargetError::UnsupportedScheme { .. })
        ));
        assert!(matches!(
            Target::parse("t", "not a url"),
            Err(TargetError::InvalidUrl { .. })
        ));
    }
}
