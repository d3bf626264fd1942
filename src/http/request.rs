//! The request envelope handed to handlers.
//!
//! # Responsibilities
//! - Carry method, path, headers, query and body in transport-neutral form
//! - Expose route parameters captured by the matcher
//! - Surface the request ID set by the transport layer
//!
//! # Design Decisions
//! - Immutable once built; builder methods consume `self`
//! - Headers use `http::HeaderMap`, so lookups are case-insensitive
//! - Query values keep their order of appearance per key

use std::collections::BTreeMap;

use axum::body::Bytes;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, Uri};

use crate::routing::Params;

/// Header carrying the per-request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Query parameters: key to every value supplied for it, in order.
pub type Query = BTreeMap<String, Vec<String>>;

#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    path: String,
    headers: HeaderMap,
    query: Query,
    /// Query string exactly as received, for pass-through.
    raw_query: Option<String>,
    body: Option<Bytes>,
    params: Params,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            query: Query::new(),
            raw_query: None,
            body: None,
            params: Params::default(),
        }
    }

    /// Build from transport-level parts. An empty body is treated as absent.
    pub fn from_parts(method: Method, uri: &Uri, headers: HeaderMap, body: Bytes) -> Self {
        let mut request = Self::new(method, uri.path());
        request.headers = headers;
        if let Some(raw) = uri.query() {
            request = request.with_query(raw);
        }
        if !body.is_empty() {
            request.body = Some(body);
        }
        request
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Parse a raw `a=1&b=2&a=3` query string and merge it in.
    pub fn with_query(mut self, raw: &str) -> Self {
        self.raw_query = match self.raw_query.take() {
            Some(existing) if !existing.is_empty() => Some(format!("{existing}&{raw}")),
            _ => Some(raw.to_string()),
        };
        for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
            self.query
                .entry(key.into_owned())
                .or_default()
                .push(value.into_owned());
        }
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub(crate) fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    /// Same request, different path. Used when delegating to a nested router.
    pub(crate) fn with_path(mut self, path: String) -> Self {
        self.path = path;
        self.params = Params::default();
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// First value of a header, if it is valid visible ASCII.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    /// The undecoded query string, without the leading `?`.
    pub fn raw_query(&self) -> Option<&str> {
        self.raw_query.as_deref()
    }

    /// First value supplied for a query key.
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// A value captured by the matched route's pattern.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn request_id(&self) -> &str {
        self.header(X_REQUEST_ID).unwrap_or("unknown")
    }
}
