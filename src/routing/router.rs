//! Route table and dispatch.
//!
//! # Responsibilities
//! - Store routes in registration order
//! - Reject duplicate `(method, pattern)` registrations
//! - Resolve a request to exactly one route, or none
//! - Invoke the handler and normalize every outcome into a `Response`
//!
//! # Design Decisions
//! - First match in registration order wins; there is no specificity ranking
//! - Misses become a JSON 404, handler errors and panics a JSON 500
//! - `dispatch` never fails; the original error goes to the log, not the client
//! - Cloning a `Router` is cheap (handlers are `Arc`ed), which is what the
//!   snapshot swap in `shared.rs` relies on

use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures_util::FutureExt;

use crate::config::{DispatchConfig, RouteAction};
use crate::error::{HandlerError, RouteError};
use crate::handler::{self, Handler, HandlerContext, SharedHandler};
use crate::http::{Request, Response};
use crate::observability::metrics;
use crate::routing::{Method, Params, Pattern};

/// A registered `(method, pattern, handler)` binding.
#[derive(Clone)]
pub struct Route {
    method: Method,
    pattern: Pattern,
    handler: SharedHandler,
}

impl Route {
    pub fn method(&self) -> Method {
        self.method
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn handler_kind(&self) -> &'static str {
        self.handler.kind()
    }

    fn matches(&self, method: Method, path: &str) -> Option<Params> {
        if method != self.method {
            return None;
        }
        self.pattern.matches(path)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.pattern)
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("pattern", &self.pattern.to_string())
            .field("handler", &self.handler.kind())
            .finish()
    }
}

#[derive(Clone, Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the table described by the configured routes, in file order.
    pub fn from_config(config: &DispatchConfig) -> Result<Self, RouteError> {
        let ctx = HandlerContext {
            environment: config.environment.clone(),
            upstream_timeout: config.timeouts.upstream(),
            max_body_bytes: config.limits.max_body_bytes,
        };

        let mut router = Self::new();
        for route in &config.routes {
            let method: Method = route.method.parse()?;
            if let RouteAction::Forward { strip: Some(name), .. } = &route.action {
                if !Pattern::parse(&route.pattern)?.has_capture(name) {
                    return Err(RouteError::InvalidAction {
                        pattern: route.pattern.clone(),
                        reason: format!("strip {name:?} is not captured by the pattern"),
                    });
                }
            }
            let handler = handler::from_action(&route.action, &ctx).map_err(|reason| {
                RouteError::InvalidAction {
                    pattern: route.pattern.clone(),
                    reason,
                }
            })?;
            router.register_shared(method, &route.pattern, handler)?;
        }
        Ok(router)
    }

    pub fn register<H: Handler>(
        &mut self,
        method: Method,
        pattern: &str,
        handler: H,
    ) -> Result<(), RouteError> {
        self.register_shared(method, pattern, Arc::new(handler))
    }

    pub fn register_shared(
        &mut self,
        method: Method,
        pattern: &str,
        handler: SharedHandler,
    ) -> Result<(), RouteError> {
        let pattern = Pattern::parse(pattern)?;
        if self.position(method, &pattern).is_some() {
            return Err(RouteError::Duplicate {
                method,
                pattern: pattern.to_string(),
            });
        }

        tracing::debug!(method = %method, pattern = %pattern, handler = handler.kind(), "Route registered");
        self.routes.push(Route {
            method,
            pattern,
            handler,
        });
        Ok(())
    }

    /// Remove a route. Returns whether anything was removed; an absent or
    /// unparsable pattern is not an error.
    pub fn unregister(&mut self, method: Method, pattern: &str) -> bool {
        let Ok(pattern) = Pattern::parse(pattern) else {
            return false;
        };
        match self.position(method, &pattern) {
            Some(index) => {
                let removed = self.routes.remove(index);
                tracing::debug!(route = %removed, "Route unregistered");
                true
            }
            None => false,
        }
    }

    fn position(&self, method: Method, pattern: &Pattern) -> Option<usize> {
        self.routes
            .iter()
            .position(|r| r.method == method && r.pattern.same_shape(pattern))
    }

    /// The first route, in registration order, matching the method and path.
    pub fn resolve(&self, method: &axum::http::Method, path: &str) -> Option<(&Route, Params)> {
        let method = Method::from_http(method)?;
        self.routes
            .iter()
            .find_map(|route| route.matches(method, path).map(|params| (route, params)))
    }

    pub async fn dispatch(&self, req: Request) -> Response {
        let start = Instant::now();
        let request_id = req.request_id().to_string();
        let method = req.method().clone();
        let path = req.path().to_string();

        let Some((route, params)) = self.resolve(&method, &path) else {
            tracing::warn!(request_id = %request_id, method = %method, path = %path, "No route matched");
            metrics::record_dispatch(method.as_str(), 404, "none", start);
            return Response::not_found(&path);
        };

        tracing::debug!(
            request_id = %request_id,
            method = %method,
            path = %path,
            route = %route,
            "Dispatching request"
        );

        let handler = route.handler.clone();
        let req = req.with_params(params);
        let outcome = AssertUnwindSafe(async move { handler.call(req).await })
            .catch_unwind()
            .await;

        let route_label = route.to_string();
        let failure = match outcome {
            Ok(Ok(response)) if response.status().as_u16() <= 599 => {
                metrics::record_dispatch(method.as_str(), response.status().as_u16(), &route_label, start);
                return response;
            }
            Ok(Ok(response)) => HandlerError::InvalidStatus(response.status().as_u16()),
            Ok(Err(e)) => e,
            Err(panic) => HandlerError::Panicked(panic_message(panic)),
        };

        tracing::error!(
            request_id = %request_id,
            route = %route_label,
            path = %path,
            error = %failure,
            "Handler failed"
        );
        metrics::record_handler_failure(&route_label);
        metrics::record_dispatch(method.as_str(), 500, &route_label, start);
        Response::internal_error(&path)
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.routes.iter()).finish()
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
