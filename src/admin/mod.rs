//! Read-only admin API, served on its own listener.

pub mod auth;
pub mod handlers;

use std::sync::Arc;

use axum::{middleware, routing::get, Router};

use self::auth::{admin_auth_middleware, AdminKey};
use self::handlers::{get_status, get_targets};
use crate::http::server::AppState;

pub fn setup_admin_router(state: AppState, api_key: String) -> Router {
    let key = AdminKey(Arc::from(api_key));
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/targets", get(get_targets))
        .layer(middleware::from_fn_with_state(key, admin_auth_middleware))
        .with_state(state)
}
