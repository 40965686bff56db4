//! Path prefix matching and rewriting.
//!
//! # Design Decisions
//! - Matching is segment-aware: `/api/proxy` matches `/api/proxy/x`, never `/api/proxyx`
//! - Path matching is case-sensitive
//! - No regex to guarantee O(n) matching

/// Matches and rewrites a public path prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    /// Create a new path prefix matcher. A trailing slash is ignored
    /// (except for the root prefix `/`).
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        let trimmed = prefix.trim_end_matches('/');
        Self {
            prefix: if trimmed.is_empty() { "/".to_string() } else { trimmed.to_string() },
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns the remainder of `path` after the prefix, if it matches.
    /// The remainder is empty or starts with `/`.
    pub fn strip<'a>(&self, path: &'a str) -> Option<&'a str> {
        if self.prefix == "/" {
            return path.starts_with('/').then_some(path);
        }
        let rest = path.strip_prefix(self.prefix.as_str())?;
        (rest.is_empty() || rest.starts_with('/')).then_some(rest)
    }

    pub fn matches(&self, path: &str) -> bool {
        self.strip(path).is_some()
    }
}

/// Join a backend prefix with the remainder of a matched public path.
pub fn rewrite_path(backend_prefix: &str, rest: &str) -> String {
    let base = backend_prefix.trim_end_matches('/');
    let joined = format!("{base}{rest}");
    if joined.is_empty() {
        "/".to_string()
    } else {
        joined
    }
}
