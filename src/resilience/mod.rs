//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to backend:
//!     → http::forwarder (per-attempt deadline, outcome classification)
//!     → On retryable failure: retries.rs (bounded attempts)
//!     → backoff.rs (exponential delay before the next attempt)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every attempt has a deadline
//! - Retries stay pinned to the target selected for the request
//! - No circuit breaking: the target list is static and retry is best-effort

pub mod backoff;
pub mod retries;

pub use retries::{is_retryable, RetryController, RetryPolicy, TerminalFailure};
