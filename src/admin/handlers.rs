use std::sync::Arc;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::routing::SharedRouter;

#[derive(Debug, Serialize, Deserialize)]
pub struct SystemStatus {
    pub version: String,
    pub status: String,
    pub routes: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RouteStatus {
    pub method: String,
    pub pattern: String,
    pub handler: String,
}

pub async fn get_status(State(router): State<Arc<SharedRouter>>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: "operational".to_string(),
        routes: router.len(),
    })
}

/// Routes in priority order, as of one snapshot.
pub async fn get_routes(State(router): State<Arc<SharedRouter>>) -> Json<Vec<RouteStatus>> {
    let table = router.snapshot();
    Json(
        table
            .routes()
            .iter()
            .map(|route| RouteStatus {
                method: route.method().to_string(),
                pattern: route.pattern().to_string(),
                handler: route.handler_kind().to_string(),
            })
            .collect(),
    )
}
