//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, dispatch)
//!     → request.rs (request ID, body buffered once)
//!     → [routing picks route + rewritten path]
//!     → [load balancer picks target]
//!     → forwarder.rs (outbound call, outcome classification)
//!     → [resilience retries retryable outcomes]
//!     → response.rs (diagnostic headers or JSON error)
//!     → Send to client
//! ```

pub mod forwarder;
pub mod request;
pub mod response;
pub mod server;

pub use forwarder::{AttemptOutcome, FailureClass, Forward, ForwardRequest, HttpForwarder, UpstreamResponse};
pub use request::{UuidRequestId, X_REQUEST_ID};
pub use response::{ErrorBody, ProxyError, X_PROXY_BACKEND, X_RESPONSE_TIME};
pub use server::{AppState, HttpServer};
