//! Request forwarding to a backend origin.
//!
//! # Responsibilities
//! - Build the outbound request (method, rewritten path, query, headers, body)
//! - Issue it on the shared connection pool with a per-attempt deadline
//! - Classify the result: success, retryable failure, or terminal failure
//!
//! # Design Decisions
//! - The body arrives pre-buffered as `Bytes`; every attempt sends the same bytes
//! - The deadline covers sending and reading the full response body
//! - 4xx responses are successes: backend business errors pass through untouched

use std::error::Error as StdError;
use std::fmt;
use std::future::Future;
use std::io;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode};
use bytes::Bytes;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::load_balancer::Target;
use crate::resilience::retries::is_retryable;

/// Why an attempt did not produce a usable response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureClass {
    /// The attempt deadline expired.
    Timeout,
    /// The origin actively refused the TCP connection.
    ConnectionRefused,
    /// The connection dropped before a complete response arrived.
    ConnectionReset,
    /// The origin host name could not be resolved.
    DnsNotFound,
    /// Any other transport-level failure.
    Network,
    /// The origin answered with a 5xx status.
    UpstreamStatus(u16),
    /// The outbound request could not be constructed.
    InvalidRequest,
}

impl FailureClass {
    /// Stable label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureClass::Timeout => "timeout",
            FailureClass::ConnectionRefused => "connection_refused",
            FailureClass::ConnectionReset => "connection_reset",
            FailureClass::DnsNotFound => "dns_not_found",
            FailureClass::Network => "network",
            FailureClass::UpstreamStatus(_) => "upstream_status",
            FailureClass::InvalidRequest => "invalid_request",
        }
    }
}

impl fmt::Display for FailureClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureClass::UpstreamStatus(code) => write!(f, "upstream_status({code})"),
            other => f.write_str(other.as_str()),
        }
    }
}

/// One outbound request, reused unchanged for every attempt.
#[derive(Debug, Clone)]
pub struct ForwardRequest {
    pub method: Method,
    /// Backend path after route rewriting.
    pub path: String,
    pub query: Option<String>,
    /// Sanitized headers with route overrides merged in.
    pub headers: HeaderMap,
    pub body: Bytes,
    /// Deadline for a single attempt.
    pub timeout: Duration,
}

/// A complete response read from the origin.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub elapsed: Duration,
}

/// Result of a single attempt.
#[derive(Debug)]
pub enum AttemptOutcome {
    Success(UpstreamResponse),
    Retryable {
        class: FailureClass,
        elapsed: Duration,
    },
    Terminal(FailureClass),
}

impl AttemptOutcome {
    /// Wrap a failure, deciding between retryable and terminal.
    pub fn failure(class: FailureClass, elapsed: Duration) -> Self {
        if is_retryable(class) {
            AttemptOutcome::Retryable { class, elapsed }
        } else {
            AttemptOutcome::Terminal(class)
        }
    }

    /// Classify a complete upstream response by status.
    pub fn from_response(response: UpstreamResponse) -> Self {
        if response.status.is_server_error() {
            Self::failure(
                FailureClass::UpstreamStatus(response.status.as_u16()),
                response.elapsed,
            )
        } else {
            AttemptOutcome::Success(response)
        }
    }
}

/// Sends a single attempt to a target.
pub trait Forward: Send + Sync {
    fn forward(
        &self,
        target: &Target,
        request: &ForwardRequest,
    ) -> impl Future<Output = AttemptOutcome> + Send;
}

/// Forwarder backed by one pooled hyper client shared by all requests.
#[derive(Clone)]
pub struct HttpForwarder {
    client: Client<HttpConnector, Body>,
}

impl HttpForwarder {
    pub fn new() -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self { client }
    }

    async fn send(&self, outbound: Request<Body>) -> Result<(StatusCode, HeaderMap, Bytes), FailureClass> {
        let response = self
            .client
            .request(outbound)
            .await
            .map_err(|e| classify_transport_error(&e))?;

        let (parts, body) = response.into_parts();
        let body = axum::body::to_bytes(Body::new(body), usize::MAX)
            .await
            .map_err(|e| classify_transport_error(&e))?;

        Ok((parts.status, parts.headers, body))
    }
}

impl Default for HttpForwarder {
    fn default() -> Self {
        Self::new()
    }
}

impl Forward for HttpForwarder {
    async fn forward(&self, target: &Target, request: &ForwardRequest) -> AttemptOutcome {
        let start = Instant::now();
        let url = target.url_for(&request.path, request.query.as_deref());

        let outbound = match build_request(&url, request) {
            Ok(req) => req,
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Failed to build upstream request");
                return AttemptOutcome::Terminal(FailureClass::InvalidRequest);
            }
        };

        tracing::debug!(method = %request.method, url = %url, "Forwarding attempt");

        let outcome = match tokio::time::timeout(request.timeout, self.send(outbound)).await {
            Ok(Ok((status, headers, body))) => AttemptOutcome::from_response(UpstreamResponse {
                status,
                headers,
                body,
                elapsed: start.elapsed(),
            }),
            Ok(Err(class)) => AttemptOutcome::failure(class, start.elapsed()),
            Err(_) => AttemptOutcome::failure(FailureClass::Timeout, start.elapsed()),
        };

        match &outcome {
            AttemptOutcome::Success(response) => tracing::debug!(
                url = %url,
                status = %response.status,
                elapsed_ms = response.elapsed.as_millis() as u64,
                "Upstream responded"
            ),
            AttemptOutcome::Retryable { class, elapsed } => tracing::warn!(
                url = %url,
                class = %class,
                elapsed_ms = elapsed.as_millis() as u64,
                "Upstream attempt failed"
            ),
            AttemptOutcome::Terminal(class) => {
                tracing::warn!(url = %url, class = %class, "Upstream attempt failed terminally")
            }
        }
        outcome
    }
}

fn build_request(url: &str, request: &ForwardRequest) -> Result<Request<Body>, axum::http::Error> {
    let mut builder = Request::builder().method(request.method.clone()).uri(url);
    if let Some(headers) = builder.headers_mut() {
        headers.extend(request.headers.clone());
    }
    builder.body(Body::from(request.body.clone()))
}

/// Walk the error source chain and map the first recognizable cause.
pub fn classify_transport_error(err: &(dyn StdError + 'static)) -> FailureClass {
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(e) = current {
        if let Some(io_err) = e.downcast_ref::<io::Error>() {
            match io_err.kind() {
                io::ErrorKind::ConnectionRefused => return FailureClass::ConnectionRefused,
                io::ErrorKind::ConnectionReset
                | io::ErrorKind::ConnectionAborted
                | io::ErrorKind::BrokenPipe
                | io::ErrorKind::UnexpectedEof => return FailureClass::ConnectionReset,
                io::ErrorKind::TimedOut => return FailureClass::Timeout,
                _ => {}
            }
        }
        if let Some(hyper_err) = e.downcast_ref::<hyper::Error>() {
            if hyper_err.is_timeout() {
                return FailureClass::Timeout;
            }
            if hyper_err.is_incomplete_message() || hyper_err.is_closed() || hyper_err.is_canceled() {
                return FailureClass::ConnectionReset;
            }
        }
        // hyper-util's connector reports resolver failures with this message.
        if e.to_string().starts_with("dns error") {
            return FailureClass::DnsNotFound;
        }
        current = e.source();
    }
    FailureClass::Network
}
