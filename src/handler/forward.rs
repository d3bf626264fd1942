//! Pass-through to an upstream HTTP server.
//!
//! # Responsibilities
//! - Rebuild the request against the upstream base URL
//! - Strip hop-by-hop headers in both directions
//! - Map connect failures to 502 and timeouts to 504
//!
//! # Design Decisions
//! - One attempt per request; retries belong to the client
//! - Upstream bodies are buffered up to the configured limit
//! - A body that cannot be read is a handler failure (500 via the router)

use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::{header, HeaderName, StatusCode, Uri};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use serde_json::json;

use super::{Handler, HandlerFuture};
use crate::error::HandlerError;
use crate::http::{Request, Response};

const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

pub struct ForwardHandler {
    /// `http://authority[/base]` without a trailing slash.
    base: String,
    client: Client<HttpConnector, Body>,
    timeout: Duration,
    body_limit: usize,
    rest_param: Option<String>,
}

impl ForwardHandler {
    pub fn new(upstream: &str, timeout: Duration) -> Result<Self, HandlerError> {
        let uri: Uri = upstream
            .parse()
            .map_err(|_| HandlerError::Upstream(format!("invalid upstream url {upstream:?}")))?;

        let authority = match (uri.scheme_str(), uri.authority()) {
            (Some("http"), Some(authority)) => authority.clone(),
            _ => {
                return Err(HandlerError::Upstream(format!(
                    "upstream must be an http:// url, got {upstream:?}"
                )))
            }
        };

        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        Ok(Self {
            base: format!("http://{}{}", authority, uri.path().trim_end_matches('/')),
            client,
            timeout,
            body_limit: DEFAULT_BODY_LIMIT,
            rest_param: None,
        })
    }

    pub fn with_body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }

    /// Send only the value captured under `param` as the upstream path.
    pub fn strip_to(mut self, param: impl Into<String>) -> Self {
        self.rest_param = Some(param.into());
        self
    }

    fn target_uri(&self, req: &Request) -> String {
        let path = match self.rest_param.as_deref().and_then(|p| req.param(p)) {
            Some(rest) => format!("/{rest}"),
            None => req.path().to_string(),
        };

        let mut target = format!("{}{}", self.base, path);
        if let Some(query) = req.raw_query().filter(|q| !q.is_empty()) {
            target.push('?');
            target.push_str(query);
        }
        target
    }
}

impl Handler for ForwardHandler {
    fn call(&self, req: Request) -> HandlerFuture {
        let client = self.client.clone();
        let timeout = self.timeout;
        let body_limit = self.body_limit;
        let target = self.target_uri(&req);

        Box::pin(async move {
            let uri: Uri = target
                .parse()
                .map_err(|_| HandlerError::Upstream(format!("invalid target uri {target:?}")))?;

            let mut builder = axum::http::Request::builder()
                .method(req.method().clone())
                .uri(uri);
            for (name, value) in req.headers() {
                if !is_hop_by_hop(name) {
                    builder = builder.header(name, value);
                }
            }
            let body = req.body().cloned().map(Body::from).unwrap_or_else(Body::empty);
            let upstream_req = builder
                .body(body)
                .map_err(|e| HandlerError::Upstream(e.to_string()))?;

            let started = Instant::now();
            let exchange = async {
                let upstream_res: hyper::Response<hyper::body::Incoming> = client
                    .request(upstream_req)
                    .await
                    .map_err(ExchangeError::Connect)?;
                let (parts, body) = upstream_res.into_parts();
                let bytes = axum::body::to_bytes(Body::new(body), body_limit)
                    .await
                    .map_err(ExchangeError::Body)?;
                Ok::<_, ExchangeError>((parts, bytes))
            };

            // The deadline covers the response head and the whole body.
            let (parts, bytes) = match tokio::time::timeout(timeout, exchange).await {
                Ok(Ok(exchanged)) => exchanged,
                Ok(Err(ExchangeError::Connect(e))) => {
                    tracing::warn!(
                        request_id = %req.request_id(),
                        upstream = %target,
                        error = %e,
                        "Upstream request failed"
                    );
                    return Ok(gateway_error(StatusCode::BAD_GATEWAY, "bad_gateway", req.path()));
                }
                Ok(Err(ExchangeError::Body(e))) => {
                    return Err(HandlerError::Upstream(e.to_string()));
                }
                Err(_) => {
                    tracing::warn!(
                        request_id = %req.request_id(),
                        upstream = %target,
                        timeout = ?timeout,
                        "Upstream request timed out"
                    );
                    return Ok(gateway_error(
                        StatusCode::GATEWAY_TIMEOUT,
                        "gateway_timeout",
                        req.path(),
                    ));
                }
            };

            tracing::debug!(
                request_id = %req.request_id(),
                upstream = %target,
                status = %parts.status,
                elapsed = ?started.elapsed(),
                "Upstream responded"
            );

            let mut response = Response::new(parts.status);
            for (name, value) in parts.headers.iter() {
                if !is_hop_by_hop(name) {
                    response = response.append_header(name.clone(), value.clone());
                }
            }
            if !bytes.is_empty() {
                response = response.with_body(bytes);
            }
            Ok(response)
        })
    }

    fn kind(&self) -> &'static str {
        "forward"
    }
}

enum ExchangeError {
    Connect(hyper_util::client::legacy::Error),
    Body(axum::Error),
}

fn gateway_error(status: StatusCode, error: &str, path: &str) -> Response {
    Response::json_value(status, json!({ "error": error, "path": path }))
}

/// Headers that describe a single connection and must not be relayed.
/// `content-length` is recomputed from the buffered body.
fn is_hop_by_hop(name: &HeaderName) -> bool {
    name == header::CONNECTION
        || name == header::TE
        || name == header::TRAILER
        || name == header::TRANSFER_ENCODING
        || name == header::UPGRADE
        || name == header::HOST
        || name == header::CONTENT_LENGTH
        || name.as_str() == "keep-alive"
        || name.as_str() == "proxy-connection"
}
