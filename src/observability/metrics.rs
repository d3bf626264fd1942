//! Metrics collection and exposition.
//!
//! # Metrics
//! - `dispatch_requests_total` (counter): requests by method, status, route
//! - `dispatch_request_duration_seconds` (histogram): dispatch latency
//! - `dispatch_handler_failures_total` (counter): errors and panics by route
//! - `dispatch_routes_registered` (gauge): size of the live route table
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed, so library users and
//!   tests pay nothing
//! - Route label is `METHOD pattern`, never the raw path, to bound cardinality

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_dispatch(method: &str, status: u16, route: &str, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("status", status.to_string()),
        ("route", route.to_string()),
    ];
    metrics::counter!("dispatch_requests_total", &labels).increment(1);
    metrics::histogram!("dispatch_request_duration_seconds", &labels)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_handler_failure(route: &str) {
    metrics::counter!("dispatch_handler_failures_total", "route" => route.to_string()).increment(1);
}

pub fn set_routes_registered(count: usize) {
    metrics::gauge!("dispatch_routes_registered").set(count as f64);
}

#[cfg(test)]
mod tests {
    use axum::http::Method as HttpMethod;
    use metrics_exporter_prometheus::PrometheusBuilder;

    use crate::error::HandlerError;
    use crate::handler::{handler_fn, PingHandler};
    use crate::http::{Request, Response};
    use crate::routing::{Method, Router, SharedRouter};

    #[test]
    fn test_dispatch_records_named_metrics() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            runtime.block_on(async {
                let shared = SharedRouter::default();
                shared.register(Method::Get, "/ping", PingHandler).unwrap();
                shared
                    .register(
                        Method::Get,
                        "/fails",
                        handler_fn(|_req| async { Err::<Response, _>(HandlerError::failed("down")) }),
                    )
                    .unwrap();

                shared.dispatch(Request::new(HttpMethod::GET, "/ping")).await;
                shared.dispatch(Request::new(HttpMethod::GET, "/fails")).await;
                shared.dispatch(Request::new(HttpMethod::GET, "/missing")).await;
            });
        });

        let rendered = handle.render();
        for name in [
            "dispatch_requests_total",
            "dispatch_request_duration_seconds",
            "dispatch_handler_failures_total",
            "dispatch_routes_registered",
        ] {
            assert!(rendered.contains(name), "{name} missing from:\n{rendered}");
        }
        assert!(rendered.contains(r#"route="GET /fails""#));
        assert!(rendered.contains(r#"status="404""#));
        assert!(rendered.contains(r#"status="500""#));
    }

    #[test]
    fn test_routes_gauge_tracks_table_size() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            let mut router = Router::new();
            router.register(Method::Get, "/a", PingHandler).unwrap();
            router.register(Method::Get, "/b", PingHandler).unwrap();
            let shared = SharedRouter::new(router);
            assert!(shared.unregister(Method::Get, "/a"));
        });

        let rendered = handle.render();
        assert!(
            rendered.contains("dispatch_routes_registered 1"),
            "unexpected gauge in:\n{rendered}"
        );
    }
}
