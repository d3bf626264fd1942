//! Error types shared across the dispatch core.
//!
//! Only `RouteError` ever reaches a caller. Handler failures and misses are
//! converted into responses by the router and stay internal.

use thiserror::Error;

use crate::routing::Method;

/// Errors raised while mutating the route table.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    /// The `(method, pattern)` pair is already registered.
    #[error("route {method} {pattern} is already registered")]
    Duplicate { method: Method, pattern: String },

    #[error("invalid pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: &'static str },

    #[error("invalid action for {pattern:?}: {reason}")]
    InvalidAction { pattern: String, reason: String },

    #[error("unsupported method {0:?}")]
    UnsupportedMethod(String),
}

/// Errors a handler can fail with.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("{0}")]
    Failed(String),

    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("status code {0} is outside 100-599")]
    InvalidStatus(u16),

    #[error("handler panicked: {0}")]
    Panicked(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl HandlerError {
    pub fn failed(msg: impl Into<String>) -> Self {
        HandlerError::Failed(msg.into())
    }
}
