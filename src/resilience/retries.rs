//! Retry logic.
//!
//! # Responsibilities
//! - Determine if a failed attempt is retryable
//! - Execute retries with exponential backoff against the pinned target
//! - Surface only a success or a terminal failure to the caller
//!
//! # Design Decisions
//! - Connection errors, timeouts and 5xx are retryable; 4xx pass through
//! - The same buffered request is resent on every attempt
//! - Attempts are strictly sequential

use std::fmt;
use std::time::Duration;

use crate::config::RetryConfig;
use crate::http::forwarder::{AttemptOutcome, FailureClass, Forward, ForwardRequest, UpstreamResponse};
use crate::load_balancer::Target;
use crate::observability::metrics;
use crate::resilience::backoff::backoff_delay;

/// Returns true if a failure of this class is worth another attempt.
pub fn is_retryable(class: FailureClass) -> bool {
    match class {
        FailureClass::Timeout
        | FailureClass::ConnectionRefused
        | FailureClass::ConnectionReset
        | FailureClass::DnsNotFound
        | FailureClass::Network => true,
        FailureClass::UpstreamStatus(status) => status >= 500,
        FailureClass::InvalidRequest => false,
    }
}

/// Retry parameters derived from configuration.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub jitter: bool,
    pub idempotent_only: bool,
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
            jitter: config.jitter,
            idempotent_only: config.idempotent_only,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

/// The failure that ended a request after all permitted attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalFailure {
    pub class: FailureClass,
    pub attempts: u32,
}

impl fmt::Display for TerminalFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} after {} attempt(s)", self.class, self.attempts)
    }
}

/// Wraps a forwarder with bounded retries.
#[derive(Debug)]
pub struct RetryController<F> {
    forwarder: F,
    policy: RetryPolicy,
}

impl<F: Forward> RetryController<F> {
    pub fn new(forwarder: F, policy: RetryPolicy) -> Self {
        Self { forwarder, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Retries permitted for `request`.
    fn retries_for(&self, request: &ForwardRequest) -> u32 {
        if self.policy.idempotent_only && !request.method.is_idempotent() {
            0
        } else {
            self.policy.max_retries
        }
    }

    /// Run attempts against `target` until success, a terminal failure,
    /// or the retry budget is spent.
    pub async fn execute(
        &self,
        target: &Target,
        request: &ForwardRequest,
    ) -> Result<UpstreamResponse, TerminalFailure> {
        let max_retries = self.retries_for(request);
        let mut attempts = 0;

        loop {
            attempts += 1;
            match self.forwarder.forward(target, request).await {
                AttemptOutcome::Success(response) => return Ok(response),
                AttemptOutcome::Terminal(class) => {
                    return Err(TerminalFailure { class, attempts });
                }
                AttemptOutcome::Retryable { class, elapsed } => {
                    let retry_index = attempts - 1;
                    if retry_index >= max_retries {
                        tracing::warn!(
                            backend = %target,
                            attempts,
                            class = %class,
                            "Retries exhausted"
                        );
                        return Err(TerminalFailure { class, attempts });
                    }

                    let delay = backoff_delay(
                        retry_index,
                        self.policy.base_delay,
                        self.policy.max_delay,
                        self.policy.jitter,
                    );
                    tracing::info!(
                        backend = %target,
                        attempt = attempts,
                        class = %class,
                        attempt_ms = elapsed.as_millis() as u64,
                        delay = ?delay,
                        "Retrying request"
                    );
                    metrics::record_retry(target.id(), class);
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
