//! Request handlers.
//!
//! # Data Flow
//! ```text
//! Router (matched route)
//!     → Handler::call(Request with captured params)
//!     → Result<Response, HandlerError>
//!     → Router normalizes Err/panic into a 500
//! ```
//!
//! # Built-in handlers
//! - json.rs: parametrized static JSON responder (health, test, status stubs)
//! - ping.rs: `{"pong": true, "time": ...}`
//! - redirect.rs: 301/302/307/308 with a `Location` header
//! - mount.rs: nested dispatch into another router
//! - forward.rs: pass-through to an upstream HTTP server
//!
//! # Design Decisions
//! - Handlers are async trait objects shared via `Arc`
//! - Configuration is injected at construction; handlers never see router state

pub mod forward;
pub mod json;
pub mod mount;
pub mod ping;
pub mod redirect;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{EnvironmentConfig, RouteAction};
use crate::error::HandlerError;
use crate::http::{Request, Response};

pub use forward::ForwardHandler;
pub use json::JsonHandler;
pub use mount::Mount;
pub use ping::PingHandler;
pub use redirect::RedirectHandler;

/// Boxed future returned by every handler.
pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<Response, HandlerError>> + Send>>;

/// A handler as stored in the route table.
pub type SharedHandler = Arc<dyn Handler>;

/// Produces a response for a matched request.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, req: Request) -> HandlerFuture;

    /// Short label for route listings.
    fn kind(&self) -> &'static str {
        "custom"
    }
}

/// Adapter turning an async closure into a [`Handler`].
pub struct FnHandler<F> {
    f: F,
}

impl<F, Fut> Handler for FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, HandlerError>> + Send + 'static,
{
    fn call(&self, req: Request) -> HandlerFuture {
        Box::pin((self.f)(req))
    }

    fn kind(&self) -> &'static str {
        "fn"
    }
}

/// Wrap an async closure as a handler.
///
/// ```ignore
/// router.register(Method::Get, "/hello", handler_fn(|_req| async {
///     Ok::<_, HandlerError>(Response::new(StatusCode::NO_CONTENT))
/// }))?;
/// ```
pub fn handler_fn<F, Fut>(f: F) -> FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, HandlerError>> + Send + 'static,
{
    FnHandler { f }
}

/// Settings shared by handlers built from configuration.
#[derive(Debug, Clone)]
pub struct HandlerContext {
    pub environment: EnvironmentConfig,
    pub upstream_timeout: Duration,
    pub max_body_bytes: usize,
}

/// Build the handler described by a configured route action.
pub fn from_action(action: &RouteAction, ctx: &HandlerContext) -> Result<SharedHandler, String> {
    let handler: SharedHandler = match action {
        RouteAction::Json {
            status,
            body,
            timestamp,
            environment,
        } => {
            let mut handler = JsonHandler::from_code(*status)
                .ok_or_else(|| format!("status {status} is outside 100-599"))?
                .with_fields(body.clone());
            if *timestamp {
                handler = handler.with_timestamp();
            }
            if *environment {
                handler = handler.with_environment(ctx.environment.clone());
            }
            Arc::new(handler)
        }
        RouteAction::Ping => Arc::new(PingHandler),
        RouteAction::Redirect { location, status } => Arc::new(
            RedirectHandler::try_new(*status, location)
                .ok_or_else(|| format!("invalid redirect {status} -> {location:?}"))?,
        ),
        RouteAction::Forward { upstream, strip } => {
            let mut handler = ForwardHandler::new(upstream, ctx.upstream_timeout)
                .map_err(|e| e.to_string())?
                .with_body_limit(ctx.max_body_bytes);
            if let Some(param) = strip {
                handler = handler.strip_to(param.clone());
            }
            Arc::new(handler)
        }
    };
    Ok(handler)
}
