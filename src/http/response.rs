//! The response envelope produced by handlers and the router.
//!
//! # Responsibilities
//! - Hold status, headers and an optional body
//! - Build JSON and redirect responses with the right headers
//! - Synthesize the router's 404 and 500 bodies
//! - Convert into an axum response at the transport boundary
//!
//! # Design Decisions
//! - JSON bodies are always UTF-8 with `Content-Type: application/json`
//! - Error bodies carry the request path but never internal details
//! - Redirects are ordinary responses; nothing downstream special-cases them

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use serde::Serialize;
use serde_json::json;

use crate::error::HandlerError;

fn application_json() -> HeaderValue {
    HeaderValue::from_static("application/json")
}

#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Option<Bytes>,
}

impl Response {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Build from a raw status code, rejecting anything outside 100-599.
    pub fn from_code(code: u16) -> Result<Self, HandlerError> {
        if !(100..=599).contains(&code) {
            return Err(HandlerError::InvalidStatus(code));
        }
        StatusCode::from_u16(code)
            .map(Self::new)
            .map_err(|_| HandlerError::InvalidStatus(code))
    }

    /// Serialize `value` as the JSON body.
    pub fn json<T: Serialize>(status: StatusCode, value: &T) -> Result<Self, HandlerError> {
        let body = serde_json::to_vec(value)?;
        Ok(Self::new(status)
            .with_header(header::CONTENT_TYPE, application_json())
            .with_body(body))
    }

    /// JSON body from an already-built value; cannot fail.
    pub fn json_value(status: StatusCode, value: serde_json::Value) -> Self {
        Self::new(status)
            .with_header(header::CONTENT_TYPE, application_json())
            .with_body(value.to_string())
    }

    /// A bodiless redirect.
    pub fn redirect(status: StatusCode, location: HeaderValue) -> Self {
        Self::new(status).with_header(header::LOCATION, location)
    }

    pub fn not_found(path: &str) -> Self {
        Self::json_value(
            StatusCode::NOT_FOUND,
            json!({ "error": "not_found", "path": path }),
        )
    }

    pub fn internal_error(path: &str) -> Self {
        Self::json_value(
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "error": "internal_error", "path": path }),
        )
    }

    /// Set a header, replacing any existing values.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Add a header value, keeping existing ones (e.g. repeated `set-cookie`).
    pub fn append_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Decode the body as JSON. Mostly useful in tests and tooling.
    pub fn json_body(&self) -> Option<serde_json::Value> {
        self.body
            .as_ref()
            .and_then(|b| serde_json::from_slice(b).ok())
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self.status.as_u16(), 301 | 302 | 307 | 308)
            && self.headers.contains_key(header::LOCATION)
    }
}

impl IntoResponse for Response {
    fn into_response(self) -> axum::response::Response {
        let body = self.body.map(Body::from).unwrap_or_else(Body::empty);
        let mut response = axum::response::Response::new(body);
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}
