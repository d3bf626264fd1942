//! Concurrently readable route table.
//!
//! # Design Decisions
//! - Readers load an `Arc<Router>` snapshot and never block
//! - Writers serialize on a mutex, clone the current table, mutate the clone
//!   and swap it in atomically
//! - A dispatch already in flight finishes against the snapshot it loaded

use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwap;

use crate::error::RouteError;
use crate::handler::{Handler, SharedHandler};
use crate::http::{Request, Response};
use crate::observability::metrics;
use crate::routing::{Method, Router};

pub struct SharedRouter {
    current: ArcSwap<Router>,
    writer: Mutex<()>,
}

impl SharedRouter {
    pub fn new(router: Router) -> Self {
        metrics::set_routes_registered(router.len());
        Self {
            current: ArcSwap::from_pointee(router),
            writer: Mutex::new(()),
        }
    }

    /// The table as of now. Later mutations do not affect the returned value.
    pub fn snapshot(&self) -> Arc<Router> {
        self.current.load_full()
    }

    pub async fn dispatch(&self, req: Request) -> Response {
        let table = self.snapshot();
        table.dispatch(req).await
    }

    pub fn register<H: Handler>(
        &self,
        method: Method,
        pattern: &str,
        handler: H,
    ) -> Result<(), RouteError> {
        self.register_shared(method, pattern, Arc::new(handler))
    }

    pub fn register_shared(
        &self,
        method: Method,
        pattern: &str,
        handler: SharedHandler,
    ) -> Result<(), RouteError> {
        self.update(|table| table.register_shared(method, pattern, handler))
    }

    pub fn unregister(&self, method: Method, pattern: &str) -> bool {
        self.update(|table| Ok::<_, RouteError>(table.unregister(method, pattern)))
            .unwrap_or(false)
    }

    /// Swap in a whole new table, e.g. after a config reload.
    pub fn replace(&self, router: Router) {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        tracing::info!(routes = router.len(), "Route table replaced");
        metrics::set_routes_registered(router.len());
        self.current.store(Arc::new(router));
    }

    fn update<T>(
        &self,
        mutate: impl FnOnce(&mut Router) -> Result<T, RouteError>,
    ) -> Result<T, RouteError> {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let mut next = Router::clone(&self.current.load());
        let out = mutate(&mut next)?;
        metrics::set_routes_registered(next.len());
        self.current.store(Arc::new(next));
        Ok(out)
    }

    pub fn len(&self) -> usize {
        self.current.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.load().is_empty()
    }
}

impl From<Router> for SharedRouter {
    fn from(router: Router) -> Self {
        Self::new(router)
    }
}

impl Default for SharedRouter {
    fn default() -> Self {
        Self::new(Router::new())
    }
}
