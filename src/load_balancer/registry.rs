//! Target registry.
//!
//! Resolves the ordered list of backend origins once at startup. Unset or
//! blank entries are dropped without disturbing the relative order of the
//! rest; entries that cannot be parsed are skipped with a warning.

use std::sync::Arc;

use crate::config::TargetsConfig;
use crate::load_balancer::target::Target;

/// Load targets from the process environment and the static config list.
pub fn load_targets(config: &TargetsConfig) -> Vec<Arc<Target>> {
    load_targets_from(config, |key| std::env::var(key).ok())
}

/// Load targets using `lookup` in place of the process environment.
pub fn load_targets_from<F>(config: &TargetsConfig, lookup: F) -> Vec<Arc<Target>>
where
    F: Fn(&str) -> Option<String>,
{
    let from_env = config
        .env_vars
        .iter()
        .filter_map(|key| lookup(key).map(|value| (key.clone(), value)));
    let from_config = config
        .urls
        .iter()
        .enumerate()
        .map(|(i, url)| (format!("config[{i}]"), url.clone()));

    let mut targets = Vec::new();
    for (source, raw) in from_env.chain(from_config) {
        if raw.trim().is_empty() {
            continue;
        }
        match Target::parse(source.as_str(), &raw) {
            Ok(target) => {
                tracing::debug!(source = %source, target = %target, "Backend target registered");
                targets.push(Arc::new(target));
            }
            Err(e) => {
                tracing::warn!(source = %source, error = %e, "Skipping invalid backend target");
            }
        }
    }

    if targets.is_empty() {
        tracing::warn!(
            env_vars = ?config.env_vars,
            "No backend targets configured; every proxied request will fail with 500"
        );
    }
    targets
}
