//! Round-robin load balancing strategy.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::load_balancer::{target::Target, LoadBalancer};

/// Round-robin selector.
/// Stores an internal counter to rotate through targets.
#[derive(Debug, Default)]
pub struct RoundRobin {
    counter: AtomicUsize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of selections made so far.
    pub fn dispatched(&self) -> usize {
        self.counter.load(Ordering::Relaxed)
    }
}

impl LoadBalancer for RoundRobin {
    fn next_target(&self, targets: &[Arc<Target>]) -> Option<Arc<Target>> {
        if targets.is_empty() {
            return None;
        }

        // Single read-modify-write: concurrent callers never observe the same value.
        let count = self.counter.fetch_add(1, Ordering::Relaxed);
        Some(targets[count % targets.len()].clone())
    }
}
