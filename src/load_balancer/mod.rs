//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     BACKEND_1..BACKEND_3 (+ static urls)
//!     → registry.rs (parse, drop unset entries, keep order)
//!     → Vec<Arc<Target>> (immutable for process lifetime)
//!
//! Per request:
//!     → round_robin.rs (atomic counter mod len)
//!     → Selected target, pinned for every retry of the request
//! ```
//!
//! # Design Decisions
//! - Selector owns its counter; shared through Arc, never a global
//! - One selection per logical request, not per attempt

pub mod registry;
pub mod round_robin;
pub mod target;

use std::sync::Arc;

pub use registry::{load_targets, load_targets_from};
pub use round_robin::RoundRobin;
pub use target::{Target, TargetError};

/// Strategy for choosing a target for a request.
pub trait LoadBalancer: Send + Sync + std::fmt::Debug {
    /// Pick the next target, or `None` when the list is empty.
    fn next_target(&self, targets: &[Arc<Target>]) -> Option<Arc<Target>>;
}
