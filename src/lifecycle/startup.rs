//! Startup orchestration.
//!
//! # Responsibilities
//! - Resolve backend targets from the environment
//! - Start the metrics exporter and admin listener when enabled
//! - Bind the proxy listener and serve until shutdown
//!
//! # Design Decisions
//! - Fail fast: a bind error is fatal
//! - An empty target list is not fatal; requests fail closed with 500

use std::net::SocketAddr;

use tokio::net::TcpListener;

use crate::admin::setup_admin_router;
use crate::config::ProxyConfig;
use crate::http::HttpServer;
use crate::lifecycle::{wait_for_signal, Shutdown};
use crate::observability::metrics;

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid {field} address {value:?}")]
    Address { field: &'static str, value: String },

    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

async fn bind(address: &str) -> Result<TcpListener, StartupError> {
    TcpListener::bind(address).await.map_err(|source| StartupError::Bind {
        address: address.to_string(),
        source,
    })
}

/// Start every subsystem and block until a shutdown signal arrives and
/// in-flight requests drain.
pub async fn run(config: ProxyConfig) -> Result<(), StartupError> {
    if config.observability.metrics_enabled {
        let addr: SocketAddr = config
            .observability
            .metrics_address
            .parse()
            .map_err(|_| StartupError::Address {
                field: "observability.metrics_address",
                value: config.observability.metrics_address.clone(),
            })?;
        metrics::init_metrics(addr);
    }

    let listener = bind(&config.listener.bind_address).await?;
    let admin = config.admin.clone();
    let server = HttpServer::new(config);
    let shutdown = Shutdown::new();

    let admin_task = if admin.enabled {
        let admin_listener = bind(&admin.bind_address).await?;
        let router = setup_admin_router(server.state().clone(), admin.api_key.clone());
        let mut rx = shutdown.subscribe();
        tracing::info!(address = %admin.bind_address, "Admin API listening");
        Some(tokio::spawn(async move {
            let result = axum::serve(admin_listener, router)
                .with_graceful_shutdown(async move {
                    let _ = rx.recv().await;
                })
                .await;
            if let Err(e) = result {
                tracing::error!(error = %e, "Admin API server failed");
            }
        }))
    } else {
        None
    };

    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        tracing::info!("Shutdown signal received, draining");
        signal_shutdown.trigger();
    });

    let result = server.run(listener, shutdown.subscribe()).await;
    shutdown.trigger();

    if let Some(task) = admin_task {
        let _ = task.await;
    }
    result.map_err(StartupError::from)
}
