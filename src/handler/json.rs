//! Static JSON responder.
//!
//! One parametrized handler covers the health, test and status stubs:
//! a fixed status and field set, optionally stamped per request with
//! `timestamp`, `env` and `version`.

use axum::http::StatusCode;
use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};

use super::{Handler, HandlerFuture};
use crate::config::EnvironmentConfig;
use crate::http::{Request, Response};

#[derive(Debug, Clone)]
pub struct JsonHandler {
    status: StatusCode,
    fields: Map<String, Value>,
    timestamp: bool,
    environment: Option<EnvironmentConfig>,
}

impl JsonHandler {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            fields: Map::new(),
            timestamp: false,
            environment: None,
        }
    }

    pub fn ok() -> Self {
        Self::new(StatusCode::OK)
    }

    /// `None` when `code` is outside 100-599.
    pub fn from_code(code: u16) -> Option<Self> {
        if !(100..=599).contains(&code) {
            return None;
        }
        StatusCode::from_u16(code).ok().map(Self::new)
    }

    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn with_fields(mut self, fields: Map<String, Value>) -> Self {
        self.fields.extend(fields);
        self
    }

    /// Add an ISO-8601 `timestamp` taken when each request is served.
    pub fn with_timestamp(mut self) -> Self {
        self.timestamp = true;
        self
    }

    /// Add `env` and `version` from the injected environment.
    pub fn with_environment(mut self, environment: EnvironmentConfig) -> Self {
        self.environment = Some(environment);
        self
    }

    fn render(&self) -> Value {
        let mut body = self.fields.clone();
        if self.timestamp {
            body.insert("timestamp".into(), Value::String(now_rfc3339()));
        }
        if let Some(env) = &self.environment {
            body.insert("env".into(), Value::String(env.name.clone()));
            body.insert("version".into(), Value::String(env.version.clone()));
        }
        Value::Object(body)
    }
}

impl Handler for JsonHandler {
    fn call(&self, _req: Request) -> HandlerFuture {
        let response = Response::json_value(self.status, self.render());
        Box::pin(async move { Ok(response) })
    }

    fn kind(&self) -> &'static str {
        "json"
    }
}

pub(crate) fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Method;

    #[tokio::test]
    async fn test_health_stub() {
        let env = EnvironmentConfig {
            name: "staging".into(),
            version: "1.2.3".into(),
        };
        let handler = JsonHandler::ok()
            .field("status", "ok")
            .with_timestamp()
            .with_environment(env);

        let res = handler.call(Request::new(Method::GET, "/api/health")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let body = res.json_body().unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["env"], "staging");
        assert_eq!(body["version"], "1.2.3");
        let ts = body["timestamp"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(ts).is_ok());
    }

    #[tokio::test]
    async fn test_plain_fields_only() {
        let handler = JsonHandler::from_code(201)
            .unwrap()
            .field("status", "success")
            .field("message", "created");
        let res = handler.call(Request::new(Method::POST, "/")).await.unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        assert_eq!(
            res.json_body().unwrap(),
            serde_json::json!({ "status": "success", "message": "created" })
        );
    }

    #[test]
    fn test_from_code_bounds() {
        assert!(JsonHandler::from_code(600).is_none());
        assert!(JsonHandler::from_code(99).is_none());
    }
}
