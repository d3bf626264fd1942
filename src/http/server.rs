//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Adapt the shared route table to a network listener
//! - Wire up middleware (request ID, tracing, timeout)
//! - Convert axum requests into dispatch requests and back
//! - Apply config reloads by swapping the route table
//! - Run the admin API on its own listener when enabled

use std::sync::Arc;

use axum::{
    extract::{Request as AxumRequest, State},
    http::StatusCode,
    response::IntoResponse,
    Router as AxumRouter,
};
use http_body_util::LengthLimitError;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admin;
use crate::config::{ConfigError, DispatchConfig};
use crate::http::{Request, Response};
use crate::lifecycle::ShutdownSignal;
use crate::routing::{Router, SharedRouter};

/// Application state injected into the dispatch fallback.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<SharedRouter>,
    pub max_body_bytes: usize,
}

/// HTTP front end for a [`SharedRouter`].
pub struct HttpServer {
    app: AxumRouter,
    router: Arc<SharedRouter>,
    config: DispatchConfig,
}

impl HttpServer {
    /// Build the route table from `config` and wrap it in a server.
    pub fn new(config: DispatchConfig) -> Result<Self, ConfigError> {
        let table = Router::from_config(&config)?;
        Ok(Self::with_router(config, Arc::new(SharedRouter::new(table))))
    }

    /// Serve an existing route table, e.g. one with programmatic handlers.
    pub fn with_router(config: DispatchConfig, router: Arc<SharedRouter>) -> Self {
        let state = AppState {
            router: router.clone(),
            max_body_bytes: config.limits.max_body_bytes,
        };
        let app = Self::build_app(&config, state);
        Self {
            app,
            router,
            config,
        }
    }

    #[allow(deprecated)]
    fn build_app(config: &DispatchConfig, state: AppState) -> AxumRouter {
        AxumRouter::new()
            .fallback(dispatch_handler)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(TimeoutLayer::new(config.timeouts.request())),
            )
    }

    pub fn router(&self) -> Arc<SharedRouter> {
        self.router.clone()
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Serve until `shutdown` fires. Every config received on `config_updates`
    /// replaces the route table; a config whose table cannot be built is
    /// logged and ignored.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<DispatchConfig>,
        mut shutdown: ShutdownSignal,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, routes = self.router.len(), "HTTP server starting");

        let reload_router = self.router.clone();
        let reloader = tokio::spawn(async move {
            while let Some(new_config) = config_updates.recv().await {
                match Router::from_config(&new_config) {
                    Ok(table) => reload_router.replace(table),
                    Err(e) => {
                        tracing::error!(error = %e, "Rejected reloaded routes; keeping current table")
                    }
                }
            }
        });

        let admin_task = if self.config.admin.enabled {
            let admin_listener = TcpListener::bind(&self.config.admin.bind_address).await?;
            let admin_app = admin::setup_admin_router(self.router.clone(), &self.config.admin);
            let mut admin_shutdown = shutdown.clone();
            tracing::info!(address = %admin_listener.local_addr()?, "Admin API listening");
            Some(tokio::spawn(async move {
                let served = axum::serve(admin_listener, admin_app)
                    .with_graceful_shutdown(async move { admin_shutdown.recv().await })
                    .await;
                if let Err(e) = served {
                    tracing::error!(error = %e, "Admin API stopped with error");
                }
            }))
        } else {
            None
        };

        axum::serve(listener, self.app)
            .with_graceful_shutdown(async move { shutdown.recv().await })
            .await?;

        reloader.abort();
        if let Some(task) = admin_task {
            let _ = task.await;
        }
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Fallback for every path: buffer the body, dispatch, convert back.
async fn dispatch_handler(
    State(state): State<AppState>,
    request: AxumRequest,
) -> axum::response::Response {
    let (parts, body) = request.into_parts();

    let bytes = match axum::body::to_bytes(body, state.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => return rejected_body(e, parts.uri.path()).into_response(),
    };

    let request = Request::from_parts(parts.method, &parts.uri, parts.headers, bytes);
    state.router.dispatch(request).await.into_response()
}

/// 413 when the body exceeded the limit, 400 for any other read failure
/// (client disconnect, malformed chunking).
fn rejected_body(error: axum::Error, path: &str) -> Response {
    let cause = error.into_inner();
    if cause.is::<LengthLimitError>() {
        tracing::warn!(path = %path, error = %cause, "Request body over limit");
        return Response::json_value(
            StatusCode::PAYLOAD_TOO_LARGE,
            json!({ "error": "payload_too_large", "path": path }),
        );
    }
    tracing::warn!(path = %path, error = %cause, "Failed to read request body");
    Response::json_value(
        StatusCode::BAD_REQUEST,
        json!({ "error": "bad_request", "path": path }),
    )
}
