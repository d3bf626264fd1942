//! Delegation to a nested router.
//!
//! A mount is an ordinary handler whose body is another `dispatch`. Registered
//! under a rest pattern such as `/api/*rest`, it can rewrite the path to the
//! captured remainder so the nested table sees `/health` instead of
//! `/api/health`.

use std::sync::Arc;

use super::{Handler, HandlerFuture};
use crate::http::Request;
use crate::routing::SharedRouter;

pub struct Mount {
    target: Arc<SharedRouter>,
    rest_param: Option<String>,
}

impl Mount {
    /// Forward the request unchanged.
    pub fn new(target: Arc<SharedRouter>) -> Self {
        Self {
            target,
            rest_param: None,
        }
    }

    /// Rewrite the path to `/` + the value captured under `param`.
    pub fn strip_to(mut self, param: impl Into<String>) -> Self {
        self.rest_param = Some(param.into());
        self
    }

    fn nested_path(&self, req: &Request) -> Option<String> {
        let param = self.rest_param.as_deref()?;
        let rest = req.param(param)?;
        Some(format!("/{rest}"))
    }
}

impl Handler for Mount {
    fn call(&self, req: Request) -> HandlerFuture {
        let target = self.target.clone();
        let req = match self.nested_path(&req) {
            Some(path) => req.with_path(path),
            None => req,
        };
        Box::pin(async move { Ok(target.dispatch(req).await) })
    }

    fn kind(&self) -> &'static str {
        "mount"
    }
}
