//! Redirect responder.

use axum::http::{HeaderValue, StatusCode};

use super::{Handler, HandlerFuture};
use crate::http::{Request, Response};

/// Status codes accepted for redirects.
pub const REDIRECT_CODES: [u16; 4] = [301, 302, 307, 308];

#[derive(Debug, Clone)]
pub struct RedirectHandler {
    status: StatusCode,
    location: HeaderValue,
}

impl RedirectHandler {
    /// 302 Found to a fixed location.
    pub fn found(location: &'static str) -> Self {
        Self {
            status: StatusCode::FOUND,
            location: HeaderValue::from_static(location),
        }
    }

    /// `None` for non-redirect codes or a location that is not a valid header value.
    pub fn try_new(code: u16, location: &str) -> Option<Self> {
        if !REDIRECT_CODES.contains(&code) || location.is_empty() {
            return None;
        }
        Some(Self {
            status: StatusCode::from_u16(code).ok()?,
            location: HeaderValue::from_str(location).ok()?,
        })
    }
}

impl Handler for RedirectHandler {
    fn call(&self, _req: Request) -> HandlerFuture {
        let response = Response::redirect(self.status, self.location.clone());
        Box::pin(async move { Ok(response) })
    }

    fn kind(&self) -> &'static str {
        "redirect"
    }
}
