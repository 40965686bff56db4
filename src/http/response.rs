//! Response translation.
//!
//! # Responsibilities
//! - Map a successful upstream response back to the client
//! - Attach diagnostic headers (selected backend, total elapsed time)
//! - Map terminal failures to fixed statuses with a JSON error body
//!
//! # Design Decisions
//! - Upstream headers pass through the same normalization as request headers
//! - Bodies are returned exactly as received; the proxy never interprets them

use std::time::Duration;

use axum::body::Body;
use axum::http::{header::CONTENT_LENGTH, HeaderName, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::http::forwarder::{FailureClass, UpstreamResponse};
use crate::resilience::TerminalFailure;
use crate::security::headers::{headers_to_map, map_to_headers, sanitize};

/// Identifies the origin that served the request.
pub const X_PROXY_BACKEND: HeaderName = HeaderName::from_static("x-proxy-backend");

/// Total wall-clock time spent in the proxy, e.g. `123ms`.
pub const X_RESPONSE_TIME: HeaderName = HeaderName::from_static("x-response-time");

/// Proxy provenance attached to a successful response.
#[derive(Debug, Clone, Copy)]
pub struct Diagnostics<'a> {
    pub backend: &'a str,
    pub elapsed: Duration,
}

/// Human-readable elapsed time.
pub fn format_elapsed(elapsed: Duration) -> String {
    format!("{}ms", elapsed.as_millis())
}

/// Build the client response from a successful upstream response.
///
/// Framing is recomputed from the buffered body, except for `HEAD`, where
/// the body is empty and the upstream `content-length` is the metadata the
/// client asked for.
pub fn translate_success(
    method: &Method,
    upstream: UpstreamResponse,
    diagnostics: &Diagnostics<'_>,
    sanitize_headers: bool,
) -> Response {
    let mut map = headers_to_map(&upstream.headers);
    if sanitize_headers {
        map = sanitize(&map);
    }
    let mut headers = map_to_headers(&map);
    if *method == Method::HEAD {
        if let Some(length) = upstream.headers.get(CONTENT_LENGTH) {
            headers.insert(CONTENT_LENGTH, length.clone());
        }
    }

    match HeaderValue::from_str(diagnostics.backend) {
        Ok(value) => {
            headers.insert(X_PROXY_BACKEND, value);
        }
        Err(_) => tracing::debug!(backend = %diagnostics.backend, "Backend id is not a valid header value"),
    }
    if let Ok(value) = HeaderValue::from_str(&format_elapsed(diagnostics.elapsed)) {
        headers.insert(X_RESPONSE_TIME, value);
    }

    let mut response = Response::new(Body::from(upstream.body));
    *response.status_mut() = upstream.status;
    *response.headers_mut() = headers;
    response
}

/// JSON body of every proxy-generated error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
}

/// Failures the proxy reports itself, scoped to one request.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("No backend targets configured")]
    NoTargets,

    #[error("No matching route for {0}")]
    NoRoute(String),

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("upstream {backend} failed: {failure}")]
    Upstream {
        backend: String,
        failure: TerminalFailure,
    },
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::NoTargets => StatusCode::INTERNAL_SERVER_ERROR,
            ProxyError::NoRoute(_) => StatusCode::NOT_FOUND,
            ProxyError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            ProxyError::Upstream { failure, .. } => match failure.class {
                FailureClass::Timeout => StatusCode::REQUEST_TIMEOUT,
                FailureClass::ConnectionRefused | FailureClass::DnsNotFound => {
                    StatusCode::SERVICE_UNAVAILABLE
                }
                FailureClass::ConnectionReset
                | FailureClass::Network
                | FailureClass::UpstreamStatus(_)
                | FailureClass::InvalidRequest => StatusCode::BAD_GATEWAY,
            },
        }
    }

    /// Value of the `error` field.
    pub fn error_label(&self) -> &'static str {
        match self {
            ProxyError::NoTargets => "No backend targets configured",
            ProxyError::NoRoute(_) => "No matching route",
            ProxyError::InvalidBody(_) => "Invalid request body",
            ProxyError::Upstream { failure, .. } => match failure.class {
                FailureClass::Timeout => "Request timeout",
                FailureClass::ConnectionRefused | FailureClass::DnsNotFound => "Backend unavailable",
                FailureClass::ConnectionReset | FailureClass::Network => "Network error",
                FailureClass::UpstreamStatus(_) => "Backend error",
                FailureClass::InvalidRequest => "Proxy error",
            },
        }
    }

    /// Backend that was selected, when one was.
    pub fn backend(&self) -> Option<&str> {
        match self {
            ProxyError::Upstream { backend, .. } => Some(backend),
            _ => None,
        }
    }

    pub fn body(&self) -> ErrorBody {
        let message = match self {
            ProxyError::NoTargets => None,
            ProxyError::NoRoute(path) => Some(format!("No route configured for {path}")),
            ProxyError::InvalidBody(reason) => Some(reason.clone()),
            ProxyError::Upstream { failure, .. } => Some(upstream_message(failure)),
        };
        ErrorBody {
            error: self.error_label().to_string(),
            message,
            backend: self.backend().map(str::to_string),
        }
    }
}

fn upstream_message(failure: &TerminalFailure) -> String {
    let detail = match failure.class {
        FailureClass::Timeout => "Backend did not respond before the attempt timeout".to_string(),
        FailureClass::ConnectionRefused => "Backend refused the connection".to_string(),
        FailureClass::DnsNotFound => "Backend host could not be resolved".to_string(),
        FailureClass::ConnectionReset => "Connection to backend was reset".to_string(),
        FailureClass::Network => "Network error while contacting backend".to_string(),
        FailureClass::UpstreamStatus(status) => format!("Backend responded with status {status}"),
        FailureClass::InvalidRequest => "Upstream request could not be built".to_string(),
    };
    format!("{detail} (after {} attempt(s))", failure.attempts)
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}
