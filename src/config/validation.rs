//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, bounded retries)
//! - Detect conflicting routes
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use crate::config::schema::ProxyConfig;
use crate::security::headers::{is_denied, is_framing};

/// Upper bound on configurable retries.
pub const MAX_RETRIES_LIMIT: u32 = 10;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid {field} address '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field} must be greater than zero")]
    Zero { field: String },

    #[error("retries.max_retries must be at most {limit} (got {got})")]
    TooManyRetries { got: u32, limit: u32 },

    #[error("retries.max_delay_ms ({max}) is lower than retries.base_delay_ms ({base})")]
    DelayBounds { base: u64, max: u64 },

    #[error("route '{route}': {field} must start with '/' (got '{value}')")]
    RelativePrefix {
        route: String,
        field: &'static str,
        value: String,
    },

    #[error("duplicate route {kind} '{value}'")]
    DuplicateRoute { kind: &'static str, value: String },

    #[error("route '{route}': invalid header '{header}'")]
    InvalidRouteHeader { route: String, header: String },

    #[error("route '{route}': header '{header}' is managed by the proxy and cannot be set")]
    ReservedRouteHeader { route: String, header: String },

    #[error("admin.api_key must not be empty when the admin API is enabled")]
    EmptyApiKey,
}

/// Validate a parsed configuration, collecting every problem found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }
    if config.admin.enabled {
        check_address(&mut errors, "admin.bind_address", &config.admin.bind_address);
        if config.admin.api_key.trim().is_empty() {
            errors.push(ValidationError::EmptyApiKey);
        }
    }

    if config.timeouts.attempt_ms == 0 {
        errors.push(ValidationError::Zero {
            field: "timeouts.attempt_ms".to_string(),
        });
    }
    if config.security.max_body_size == 0 {
        errors.push(ValidationError::Zero {
            field: "security.max_body_size".to_string(),
        });
    }

    let retries = &config.retries;
    if retries.max_retries > MAX_RETRIES_LIMIT {
        errors.push(ValidationError::TooManyRetries {
            got: retries.max_retries,
            limit: MAX_RETRIES_LIMIT,
        });
    }
    if retries.max_retries > 0 && retries.base_delay_ms == 0 {
        errors.push(ValidationError::Zero {
            field: "retries.base_delay_ms".to_string(),
        });
    }
    if retries.max_delay_ms < retries.base_delay_ms {
        errors.push(ValidationError::DelayBounds {
            base: retries.base_delay_ms,
            max: retries.max_delay_ms,
        });
    }

    let mut names = HashSet::new();
    let mut prefixes = HashSet::new();
    for route in &config.routes {
        if !names.insert(route.name.as_str()) {
            errors.push(ValidationError::DuplicateRoute {
                kind: "name",
                value: route.name.clone(),
            });
        }
        if !prefixes.insert(route.public_prefix.as_str()) {
            errors.push(ValidationError::DuplicateRoute {
                kind: "public_prefix",
                value: route.public_prefix.clone(),
            });
        }
        for (field, value) in [
            ("public_prefix", &route.public_prefix),
            ("backend_prefix", &route.backend_prefix),
        ] {
            if !value.starts_with('/') {
                errors.push(ValidationError::RelativePrefix {
                    route: route.name.clone(),
                    field,
                    value: value.clone(),
                });
            }
        }
        if route.timeout_ms == Some(0) {
            errors.push(ValidationError::Zero {
                field: format!("routes.{}.timeout_ms", route.name),
            });
        }
        for (name, value) in &route.headers {
            let valid = axum::http::HeaderName::from_bytes(name.as_bytes()).is_ok()
                && axum::http::HeaderValue::from_str(value).is_ok();
            if !valid {
                errors.push(ValidationError::InvalidRouteHeader {
                    route: route.name.clone(),
                    header: name.clone(),
                });
            } else if is_framing(name) || is_denied(name) {
                errors.push(ValidationError::ReservedRouteHeader {
                    route: route.name.clone(),
                    header: name.clone(),
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}
