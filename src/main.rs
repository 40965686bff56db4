//! Edge proxy binary.
//!
//! ```text
//!     Client ──▶ route match ──▶ round-robin target ──▶ forward (+retries) ──▶ Backend
//!            ◀── diagnostic headers / JSON error ◀──────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use edge_proxy::config::{self, validation::validate_config, ConfigError};
use edge_proxy::lifecycle;
use edge_proxy::observability::logging::init_logging;

#[derive(Parser, Debug)]
#[command(name = "edge-proxy", version, about = "Round-robin HTTP edge proxy with retries")]
struct Args {
    /// Path to a TOML config file. Defaults are used when omitted.
    #[arg(short, long, env = "PROXY_CONFIG")]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long, env = "PROXY_BIND")]
    bind: Option<String>,
}

fn load(args: &Args) -> Result<config::ProxyConfig, ConfigError> {
    let mut config = config::load_or_default(args.config.as_deref())?;
    if let Some(bind) = &args.bind {
        config.listener.bind_address = bind.clone();
        validate_config(&config).map_err(ConfigError::Validation)?;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load(&args)?;

    init_logging(&config.observability);
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = ?args.config,
        bind_address = %config.listener.bind_address,
        max_retries = config.retries.max_retries,
        attempt_timeout_ms = config.timeouts.attempt_ms,
        "edge-proxy starting"
    );

    lifecycle::run(config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
