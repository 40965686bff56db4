//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request headers:
//!     → headers.rs (normalize, strip denylist)
//!     → route overrides merged
//!     → forwarded to backend
//!
//! Upstream response headers:
//!     → headers.rs (normalize, optionally strip denylist)
//!     → returned to client
//! ```
//!
//! # Design Decisions
//! - No trust in client-supplied framing or identity headers
//! - The proxy never authenticates requests; that is the backend's concern

pub mod headers;

pub use headers::{headers_to_map, is_denied, map_to_headers, sanitize, HeaderMapping};
