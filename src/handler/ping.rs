//! Liveness ping: `{"pong": true, "time": <now>}`.

use axum::http::StatusCode;
use serde::Serialize;

use super::json::now_rfc3339;
use super::{Handler, HandlerFuture};
use crate::http::{Request, Response};

#[derive(Debug, Clone, Copy, Default)]
pub struct PingHandler;

#[derive(Serialize)]
struct Pong {
    pong: bool,
    time: String,
}

impl Handler for PingHandler {
    fn call(&self, _req: Request) -> HandlerFuture {
        Box::pin(async move {
            Response::json(
                StatusCode::OK,
                &Pong {
                    pong: true,
                    time: now_rfc3339(),
                },
            )
        })
    }

    fn kind(&self) -> &'static str {
        "ping"
    }
}
