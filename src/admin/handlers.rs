use axum::{extract::State, Json};
use serde::Serialize;

use crate::http::server::AppState;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub uptime_secs: u64,
    pub targets: usize,
    pub routes: usize,
    /// Requests handed to the balancer since startup.
    pub dispatched: usize,
}

#[derive(Serialize)]
pub struct TargetStatus {
    pub id: String,
    pub source: String,
    pub url: String,
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        uptime_secs: state.started_at.elapsed().as_secs(),
        targets: state.targets.len(),
        routes: state.router.routes().len(),
        dispatched: state.balancer.dispatched(),
    })
}

pub async fn get_targets(State(state): State<AppState>) -> Json<Vec<TargetStatus>> {
    let statuses = state
        .targets
        .iter()
        .map(|t| TargetStatus {
            id: t.id().to_string(),
            source: t.source().to_string(),
            url: t.base_url().to_string(),
        })
        .collect();
    Json(statuses)
}
