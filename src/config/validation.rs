//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check methods, patterns and route actions
//! - Detect duplicate routes
//! - Validate value ranges (timeouts > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Pure function: DispatchConfig → Result<(), Vec<ValidationError>>
//! - Runs before a config is accepted, at startup and on every reload

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::{DispatchConfig, RouteAction};
use crate::handler::redirect::REDIRECT_CODES;
use crate::routing::{Method, Pattern};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

pub fn validate_config(config: &DispatchConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_addr(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if config.observability.metrics_enabled {
        check_addr(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }
    if config.admin.enabled {
        check_addr(&mut errors, "admin.bind_address", &config.admin.bind_address);
        if config.admin.api_key.is_empty() {
            errors.push(ValidationError::new("admin.api_key", "must be set when admin is enabled"));
        }
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }
    if config.timeouts.upstream_secs == 0 {
        errors.push(ValidationError::new("timeouts.upstream_secs", "must be greater than 0"));
    }
    if config.limits.max_body_bytes == 0 {
        errors.push(ValidationError::new("limits.max_body_bytes", "must be greater than 0"));
    }

    let mut seen: Vec<(Method, Pattern)> = Vec::new();
    for (i, route) in config.routes.iter().enumerate() {
        let field = format!("routes[{i}]");

        let method = match route.method.parse::<Method>() {
            Ok(m) => Some(m),
            Err(e) => {
                errors.push(ValidationError::new(&field, e.to_string()));
                None
            }
        };
        let pattern = match Pattern::parse(&route.pattern) {
            Ok(p) => Some(p),
            Err(e) => {
                errors.push(ValidationError::new(&field, e.to_string()));
                None
            }
        };

        if let (Some(pattern), RouteAction::Forward { strip: Some(name), .. }) =
            (&pattern, &route.action)
        {
            if !pattern.has_capture(name) {
                errors.push(ValidationError::new(
                    format!("{field}.action.strip"),
                    format!("{name:?} is not captured by pattern {pattern}"),
                ));
            }
        }

        if let (Some(method), Some(pattern)) = (method, pattern) {
            if seen.iter().any(|(m, p)| *m == method && p.same_shape(&pattern)) {
                errors.push(ValidationError::new(
                    &field,
                    format!("duplicate route {method} {pattern}"),
                ));
            } else {
                seen.push((method, pattern));
            }
        }

        check_action(&mut errors, &field, &route.action);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_addr(errors: &mut Vec<ValidationError>, field: &str, addr: &str) {
    if addr.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(field, format!("invalid socket address {addr:?}")));
    }
}

fn check_action(errors: &mut Vec<ValidationError>, field: &str, action: &RouteAction) {
    match action {
        RouteAction::Json { status, .. } => {
            if !(100..=599).contains(status) {
                errors.push(ValidationError::new(
                    format!("{field}.action.status"),
                    format!("{status} is outside 100-599"),
                ));
            }
        }
        RouteAction::Ping => {}
        RouteAction::Redirect { location, status } => {
            if !REDIRECT_CODES.contains(status) {
                errors.push(ValidationError::new(
                    format!("{field}.action.status"),
                    format!("{status} is not a redirect status (301, 302, 307, 308)"),
                ));
            }
            if location.is_empty() || axum::http::HeaderValue::from_str(location).is_err() {
                errors.push(ValidationError::new(
                    format!("{field}.action.location"),
                    "must be a non-empty header value",
                ));
            }
        }
        RouteAction::Forward { upstream, .. } => {
            let ok = upstream
                .parse::<axum::http::Uri>()
                .map(|u| u.scheme_str() == Some("http") && u.authority().is_some())
                .unwrap_or(false);
            if !ok {
                errors.push(ValidationError::new(
                    format!("{field}.action.upstream"),
                    format!("{upstream:?} is not an http:// url"),
                ));
            }
        }
    }
}
