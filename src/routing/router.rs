//! Route lookup.
//!
//! # Responsibilities
//! - Store compiled routes
//! - Look up the route for a request path
//! - Return the matched route or an explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Longest public prefix wins, so specific routes can override a catch-all
//! - O(n) prefix scan (acceptable for typical route counts)

use std::time::Duration;

use axum::http::{HeaderMap, HeaderName, HeaderValue};

use crate::config::RouteConfig;
use crate::routing::matcher::{rewrite_path, PathPrefixMatcher};
use crate::security::headers::{is_denied, is_framing};

/// A compiled route.
#[derive(Debug, Clone)]
pub struct Route {
    pub name: String,
    matcher: PathPrefixMatcher,
    backend_prefix: String,
    /// Per-attempt timeout for requests on this route.
    pub timeout: Duration,
    /// Headers merged into every forwarded request.
    pub headers: HeaderMap,
}

impl Route {
    /// Backend path for an inbound path this route matched.
    pub fn rewrite(&self, path: &str) -> Option<String> {
        self.matcher
            .strip(path)
            .map(|rest| rewrite_path(&self.backend_prefix, rest))
    }

    pub fn public_prefix(&self) -> &str {
        self.matcher.prefix()
    }
}

/// A route match with the rewritten backend path.
#[derive(Debug, Clone)]
pub struct RouteMatch<'a> {
    pub route: &'a Route,
    pub backend_path: String,
}

/// Immutable route table.
#[derive(Debug, Clone, Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    /// Compile routes from configuration. `default_timeout` applies to routes
    /// without their own `timeout_ms`.
    pub fn from_config(configs: Vec<RouteConfig>, default_timeout: Duration) -> Self {
        let mut routes: Vec<Route> = configs
            .into_iter()
            .map(|config| {
                let mut headers = HeaderMap::new();
                for (name, value) in &config.headers {
                    if is_framing(name) || is_denied(name) {
                        tracing::warn!(route = %config.name, header = %name, "Ignoring reserved route header");
                        continue;
                    }
                    match (
                        HeaderName::from_bytes(name.as_bytes()),
                        HeaderValue::from_str(value),
                    ) {
                        (Ok(name), Ok(value)) => {
                            headers.insert(name, value);
                        }
                        _ => tracing::warn!(route = %config.name, header = %name, "Ignoring invalid route header"),
                    }
                }
                Route {
                    matcher: PathPrefixMatcher::new(config.public_prefix),
                    backend_prefix: config.backend_prefix,
                    timeout: config
                        .timeout_ms
                        .map(Duration::from_millis)
                        .unwrap_or(default_timeout),
                    headers,
                    name: config.name,
                }
            })
            .collect();

        // Longest prefix first; stable sort keeps config order for ties.
        routes.sort_by(|a, b| b.public_prefix().len().cmp(&a.public_prefix().len()));

        for route in &routes {
            tracing::debug!(
                route = %route.name,
                public_prefix = %route.public_prefix(),
                backend_prefix = %route.backend_prefix,
                timeout = ?route.timeout,
                "Route compiled"
            );
        }
        Self { routes }
    }

    /// Find the route for `path` and rewrite it.
    pub fn match_path(&self, path: &str) -> Option<RouteMatch<'_>> {
        self.routes.iter().find_map(|route| {
            route.rewrite(path).map(|backend_path| RouteMatch {
                route,
                backend_path,
            })
        })
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }
}
