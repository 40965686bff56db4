//! HTTP server setup and request dispatch.
//!
//! # Responsibilities
//! - Create the Axum router with the proxy handler
//! - Wire up middleware (request ID, tracing)
//! - Serve on a listener until shutdown
//! - Dispatch each request: route → buffer body → select target →
//!   sanitize headers → forward with retries → translate response

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::{ProxyConfig, SecurityConfig};
use crate::http::forwarder::{ForwardRequest, HttpForwarder};
use crate::http::request::{buffer_body, request_id, UuidRequestId};
use crate::http::response::{translate_success, Diagnostics, ProxyError};
use crate::load_balancer::{load_targets, LoadBalancer, RoundRobin, Target};
use crate::observability::metrics;
use crate::resilience::{RetryController, RetryPolicy};
use crate::routing::Router as ProxyRouter;
use crate::security::headers::{headers_to_map, map_to_headers, sanitize};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub targets: Arc<Vec<Arc<Target>>>,
    pub balancer: Arc<RoundRobin>,
    pub router: Arc<ProxyRouter>,
    pub retry: Arc<RetryController<HttpForwarder>>,
    pub security: SecurityConfig,
    pub started_at: Instant,
}

impl AppState {
    /// Build state from configuration and an already-resolved target list.
    pub fn new(config: &ProxyConfig, targets: Vec<Arc<Target>>) -> Self {
        let default_timeout = std::time::Duration::from_millis(config.timeouts.attempt_ms);
        Self {
            targets: Arc::new(targets),
            balancer: Arc::new(RoundRobin::new()),
            router: Arc::new(ProxyRouter::from_config(config.effective_routes(), default_timeout)),
            retry: Arc::new(RetryController::new(
                HttpForwarder::new(),
                RetryPolicy::from(&config.retries),
            )),
            security: config.security.clone(),
            started_at: Instant::now(),
        }
    }
}

/// HTTP server for the edge proxy.
pub struct HttpServer {
    router: Router,
    state: AppState,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a server, reading targets from the environment.
    pub fn new(config: ProxyConfig) -> Self {
        let targets = load_targets(&config.targets);
        Self::with_targets(config, targets)
    }

    /// Create a server with an explicit target list.
    pub fn with_targets(config: ProxyConfig, targets: Vec<Arc<Target>>) -> Self {
        let state = AppState::new(&config, targets);
        let router = Self::build_router(state.clone());
        Self {
            router,
            state,
            config,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
                    .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                        tracing::info_span!(
                            "request",
                            method = %request.method(),
                            uri = %request.uri(),
                            request_id = %request_id(request),
                        )
                    }))
                    .layer(PropagateRequestIdLayer::x_request_id()),
            )
    }

    /// Router for in-process use (tests, embedding).
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// Run the server, accepting connections until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            targets = self.state.targets.len(),
            routes = self.state.router.routes().len(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Main proxy handler.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let request_id = request_id(&request).to_string();

    match dispatch(&state, request, start).await {
        Ok((response, backend)) => {
            metrics::record_request(method.as_str(), response.status().as_u16(), &backend, start);
            response
        }
        Err(err) => {
            let backend = err.backend().unwrap_or("none").to_string();
            match &err {
                ProxyError::Upstream { .. } | ProxyError::NoTargets => {
                    tracing::error!(request_id = %request_id, error = %err, "Proxy request failed")
                }
                _ => tracing::warn!(request_id = %request_id, error = %err, "Proxy request rejected"),
            }
            let response = err.into_response();
            metrics::record_request(method.as_str(), response.status().as_u16(), &backend, start);
            response
        }
    }
}

/// Forward one request, returning the response and the backend that served it.
async fn dispatch(
    state: &AppState,
    request: Request<Body>,
    start: Instant,
) -> Result<(Response, String), ProxyError> {
    // Fail closed before touching the body or the network.
    if state.targets.is_empty() {
        return Err(ProxyError::NoTargets);
    }

    let path = request.uri().path().to_string();
    let query = request.uri().query().map(str::to_string);
    let matched = state
        .router
        .match_path(&path)
        .ok_or_else(|| ProxyError::NoRoute(path.clone()))?;

    let (parts, body) = request.into_parts();
    let body = buffer_body(body, state.security.max_body_size)
        .await
        .map_err(|e| ProxyError::InvalidBody(e.to_string()))?;

    let target = state
        .balancer
        .next_target(&state.targets)
        .ok_or(ProxyError::NoTargets)?;

    let mut headers = map_to_headers(&sanitize(&headers_to_map(&parts.headers)));
    for (name, value) in &matched.route.headers {
        headers.insert(name.clone(), value.clone());
    }

    tracing::debug!(
        route = %matched.route.name,
        backend = %target,
        path = %path,
        backend_path = %matched.backend_path,
        body_bytes = body.len(),
        "Dispatching request"
    );

    let forward = ForwardRequest {
        method: parts.method,
        path: matched.backend_path,
        query,
        headers,
        body,
        timeout: matched.route.timeout,
    };

    match state.retry.execute(&target, &forward).await {
        Ok(upstream) => {
            let diagnostics = Diagnostics {
                backend: target.id(),
                elapsed: start.elapsed(),
            };
            let response = translate_success(
                &forward.method,
                upstream,
                &diagnostics,
                state.security.sanitize_response_headers,
            );
            Ok((response, target.id().to_string()))
        }
        Err(failure) => {
            metrics::record_upstream_failure(target.id(), failure.class);
            Err(ProxyError::Upstream {
                backend: target.id().to_string(),
                failure,
            })
        }
    }
}
