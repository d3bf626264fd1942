//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the dispatcher.
//! All types derive Serde traits for deserialization from config files.
//!
//! ```toml
//! [environment]
//! name = "production"
//!
//! [[routes]]
//! method = "GET"
//! pattern = "/api/health"
//! action = { type = "json", body = { status = "ok" }, timestamp = true, environment = true }
//!
//! [[routes]]
//! method = "GET"
//! pattern = "/redirect"
//! action = { type = "redirect", location = "/index.html" }
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct DispatchConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Request size limits.
    pub limits: LimitsConfig,

    /// Read-only values injected into handlers.
    pub environment: EnvironmentConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    pub admin: AdminConfig,

    /// Route table, highest priority first.
    pub routes: Vec<RouteConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Total time for a request/response cycle, in seconds.
    pub request_secs: u64,

    /// Upstream exchange timeout for forwarding routes, in seconds.
    pub upstream_secs: u64,
}

impl TimeoutConfig {
    pub fn request(&self) -> Duration {
        Duration::from_secs(self.request_secs)
    }

    pub fn upstream(&self) -> Duration {
        Duration::from_secs(self.upstream_secs)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            upstream_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum buffered body size in bytes, inbound and from upstreams.
    pub max_body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Process-wide values handlers may report (`env`, `version`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    pub name: String,
    pub version: String,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            name: "development".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    pub log_level: String,

    /// Enable the Prometheus endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    pub enabled: bool,

    /// Bearer token required on every admin request.
    pub api_key: String,

    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: String::new(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}

/// One entry of the route table.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// One of GET, POST, PUT, PATCH, DELETE, HEAD, OPTIONS.
    pub method: String,

    /// Path pattern, e.g. `/users/:id` or `/static/*path`.
    pub pattern: String,

    pub action: RouteAction,
}

/// What a configured route does.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RouteAction {
    /// Fixed JSON body.
    Json {
        #[serde(default = "default_json_status")]
        status: u16,
        #[serde(default)]
        body: Map<String, Value>,
        /// Stamp an ISO-8601 `timestamp` per request.
        #[serde(default)]
        timestamp: bool,
        /// Add `env` and `version` from [`EnvironmentConfig`].
        #[serde(default)]
        environment: bool,
    },

    /// `{"pong": true, "time": ...}`.
    Ping,

    Redirect {
        location: String,
        #[serde(default = "default_redirect_status")]
        status: u16,
    },

    /// Pass the request through to an upstream `http://` server.
    Forward {
        upstream: String,
        /// Rest parameter whose value replaces the forwarded path.
        #[serde(default)]
        strip: Option<String>,
    },
}

fn default_json_status() -> u16 {
    200
}

fn default_redirect_status() -> u16 {
    302
}
