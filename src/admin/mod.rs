//! Admin API, served on its own listener.
//!
//! - `GET /admin/status`: version, status, route count
//! - `GET /admin/routes`: live route table in priority order

pub mod auth;
pub mod handlers;

use std::sync::Arc;

use axum::{middleware, routing::get, Router};

use self::auth::admin_auth_middleware;
use self::handlers::{get_routes, get_status};
use crate::config::AdminConfig;
use crate::routing::SharedRouter;

pub fn setup_admin_router(router: Arc<SharedRouter>, config: &AdminConfig) -> Router {
    let api_key: Arc<str> = Arc::from(config.api_key.as_str());
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/routes", get(get_routes))
        .layer(middleware::from_fn_with_state(api_key, admin_auth_middleware))
        .with_state(router)
}
