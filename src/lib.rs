//! Minimal HTTP dispatch core.
//!
//! A route table maps `(method, pattern)` to handlers. Dispatch picks the first
//! registered route that structurally matches, invokes its handler, and always
//! produces a response: a JSON 404 on a miss, a JSON 500 when the handler
//! fails or panics.
//!
//! ```ignore
//! use edge_dispatch::{handler::PingHandler, http::Request, routing::{Method, Router}};
//!
//! let mut router = Router::new();
//! router.register(Method::Get, "/ping", PingHandler)?;
//! let res = router.dispatch(Request::new(axum::http::Method::GET, "/ping")).await;
//! assert_eq!(res.status(), 200);
//! ```

// Core
pub mod error;
pub mod handler;
pub mod http;
pub mod routing;

// Cross-cutting concerns
pub mod admin;
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use config::schema::DispatchConfig;
pub use error::{HandlerError, RouteError};
pub use http::{HttpServer, Request, Response};
pub use lifecycle::Shutdown;
pub use routing::{Method, Router, SharedRouter};
