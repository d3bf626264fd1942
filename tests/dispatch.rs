//! In-process dispatch behavior: precedence, error normalization, built-in
//! handlers and concurrent table updates.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::http::{Method as HttpMethod, StatusCode};
use serde_json::json;

use edge_dispatch::config::parse_config;
use edge_dispatch::error::{HandlerError, RouteError};
use edge_dispatch::handler::{handler_fn, JsonHandler, Mount, PingHandler, RedirectHandler};
use edge_dispatch::http::{Request, Response};
use edge_dispatch::routing::{Method, Router, SharedRouter};

fn tagged(tag: &'static str) -> JsonHandler {
    JsonHandler::ok().field("handler", tag)
}

fn handler_tag(res: &Response) -> String {
    res.json_body().unwrap()["handler"]
        .as_str()
        .unwrap_or_default()
        .to_string()
}

#[tokio::test]
async fn test_each_request_reaches_only_its_handler() {
    let hits = Arc::new([AtomicUsize::new(0), AtomicUsize::new(0)]);
    let mut router = Router::new();

    for (index, path) in ["/one", "/two"].into_iter().enumerate() {
        let hits = hits.clone();
        router
            .register(
                Method::Get,
                path,
                handler_fn(move |_req| {
                    hits[index].fetch_add(1, Ordering::SeqCst);
                    async { Ok::<_, HandlerError>(Response::new(StatusCode::OK)) }
                }),
            )
            .unwrap();
    }

    router.dispatch(Request::new(HttpMethod::GET, "/one")).await;
    router.dispatch(Request::new(HttpMethod::GET, "/one")).await;
    router.dispatch(Request::new(HttpMethod::GET, "/two")).await;
    router.dispatch(Request::new(HttpMethod::GET, "/three")).await;

    assert_eq!(hits[0].load(Ordering::SeqCst), 2);
    assert_eq!(hits[1].load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_miss_returns_json_404_with_path() {
    let router = Router::new();
    let res = router
        .dispatch(Request::new(HttpMethod::GET, "/nonexistent"))
        .await;

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.header("content-type"), Some("application/json"));
    assert_eq!(
        res.json_body().unwrap(),
        json!({"error": "not_found", "path": "/nonexistent"})
    );
}

#[tokio::test]
async fn test_registration_order_decides_precedence() {
    let mut param_first = Router::new();
    param_first.register(Method::Get, "/a/:id", tagged("param")).unwrap();
    param_first.register(Method::Get, "/a/static", tagged("static")).unwrap();

    let res = param_first
        .dispatch(Request::new(HttpMethod::GET, "/a/static"))
        .await;
    assert_eq!(handler_tag(&res), "param");

    let mut static_first = Router::new();
    static_first.register(Method::Get, "/a/static", tagged("static")).unwrap();
    static_first.register(Method::Get, "/a/:id", tagged("param")).unwrap();

    let res = static_first
        .dispatch(Request::new(HttpMethod::GET, "/a/static"))
        .await;
    assert_eq!(handler_tag(&res), "static");

    let res = static_first
        .dispatch(Request::new(HttpMethod::GET, "/a/other"))
        .await;
    assert_eq!(handler_tag(&res), "param");
}

#[tokio::test]
async fn test_duplicate_keeps_first_registration() {
    let mut router = Router::new();
    router.register(Method::Get, "/dup", tagged("first")).unwrap();

    let err = router
        .register(Method::Get, "/dup", tagged("second"))
        .unwrap_err();
    assert!(matches!(err, RouteError::Duplicate { .. }));

    // Same method, same shape, different parameter name.
    router.register(Method::Get, "/users/:id", tagged("id")).unwrap();
    assert!(router
        .register(Method::Get, "/users/:name", tagged("name"))
        .is_err());

    // A different method is a different route.
    router.register(Method::Post, "/dup", tagged("post")).unwrap();

    let res = router.dispatch(Request::new(HttpMethod::GET, "/dup")).await;
    assert_eq!(handler_tag(&res), "first");
    assert_eq!(router.len(), 3);
}

#[tokio::test]
async fn test_failures_become_500_and_router_keeps_serving() {
    let mut router = Router::new();
    router
        .register(
            Method::Get,
            "/fails",
            handler_fn(|_req| async { Err::<Response, _>(HandlerError::failed("database offline")) }),
        )
        .unwrap();
    router
        .register(
            Method::Get,
            "/panics",
            handler_fn(|_req| async {
                if true {
                    panic!("handler blew up");
                }
                Ok::<_, HandlerError>(Response::new(StatusCode::OK))
            }),
        )
        .unwrap();
    router.register(Method::Get, "/ping", PingHandler).unwrap();

    for path in ["/fails", "/panics"] {
        let res = router.dispatch(Request::new(HttpMethod::GET, path)).await;
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = res.json_body().unwrap();
        assert_eq!(body["error"], "internal_error");
        assert!(!body.to_string().contains("database offline"));
        assert!(!body.to_string().contains("blew up"));

        let res = router.dispatch(Request::new(HttpMethod::GET, "/ping")).await;
        assert_eq!(res.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn test_ping_responds_with_pong_and_time() {
    let mut router = Router::new();
    router.register(Method::Get, "/ping", PingHandler).unwrap();

    let res = router.dispatch(Request::new(HttpMethod::GET, "/ping")).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json_body().unwrap();
    assert_eq!(body["pong"], true);
    assert!(chrono::DateTime::parse_from_rfc3339(body["time"].as_str().unwrap()).is_ok());
}

#[tokio::test]
async fn test_method_mismatch_is_404() {
    let mut router = Router::new();
    router
        .register(Method::Get, "/api/test", tagged("test"))
        .unwrap();

    let res = router
        .dispatch(Request::new(HttpMethod::POST, "/api/test"))
        .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.json_body().unwrap()["path"], "/api/test");
}

#[tokio::test]
async fn test_redirect_sets_location() {
    let mut router = Router::new();
    router
        .register(Method::Get, "/redirect", RedirectHandler::found("/index.html"))
        .unwrap();

    let res = router
        .dispatch(Request::new(HttpMethod::GET, "/redirect"))
        .await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(res.header("location"), Some("/index.html"));
    assert!(res.is_redirect());
}

#[tokio::test]
async fn test_params_and_rest_wildcard_reach_handler() {
    let mut router = Router::new();
    router
        .register(
            Method::Get,
            "/files/:bucket/*path",
            handler_fn(|req: Request| async move {
                let body = json!({
                    "bucket": req.param("bucket"),
                    "path": req.param("path"),
                });
                Ok::<_, HandlerError>(Response::json_value(StatusCode::OK, body))
            }),
        )
        .unwrap();

    let res = router
        .dispatch(Request::new(HttpMethod::GET, "/files/media/a/b/c.png"))
        .await;
    assert_eq!(
        res.json_body().unwrap(),
        json!({"bucket": "media", "path": "a/b/c.png"})
    );

    let res = router
        .dispatch(Request::new(HttpMethod::GET, "/files/media"))
        .await;
    assert_eq!(
        res.json_body().unwrap(),
        json!({"bucket": "media", "path": ""})
    );

    // A parameter never matches an empty segment.
    let res = router
        .dispatch(Request::new(HttpMethod::GET, "/files//x"))
        .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_mount_delegates_to_nested_table() {
    let api = Arc::new(SharedRouter::default());
    api.register(Method::Get, "/health", tagged("api-health")).unwrap();

    let mut root = Router::new();
    root.register(Method::Get, "/health", tagged("root-health")).unwrap();
    root.register(Method::Get, "/api/*rest", Mount::new(api.clone()).strip_to("rest"))
        .unwrap();

    let res = root
        .dispatch(Request::new(HttpMethod::GET, "/api/health"))
        .await;
    assert_eq!(handler_tag(&res), "api-health");

    // The nested 404 reports the rewritten path.
    let res = root
        .dispatch(Request::new(HttpMethod::GET, "/api/missing"))
        .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.json_body().unwrap()["path"], "/missing");

    // Routes added to the nested table later are visible through the mount.
    api.register(Method::Get, "/late", tagged("late")).unwrap();
    let res = root.dispatch(Request::new(HttpMethod::GET, "/api/late")).await;
    assert_eq!(handler_tag(&res), "late");
}

#[tokio::test]
async fn test_router_from_config_preserves_file_order() {
    let config = parse_config(
        r#"
[[routes]]
method = "GET"
pattern = "/items/:id"
action = { type = "json", body = { kind = "item" } }

[[routes]]
method = "GET"
pattern = "/items/new"
action = { type = "json", body = { kind = "form" } }

[[routes]]
method = "GET"
pattern = "/ping"
action = { type = "ping" }
"#,
    )
    .unwrap();

    let router = Router::from_config(&config).unwrap();
    assert_eq!(router.len(), 3);

    let res = router
        .dispatch(Request::new(HttpMethod::GET, "/items/new"))
        .await;
    assert_eq!(res.json_body().unwrap()["kind"], "item");

    let kinds: Vec<_> = router.routes().iter().map(|r| r.handler_kind()).collect();
    assert_eq!(kinds, ["json", "json", "ping"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_dispatch_during_registration() {
    let shared = Arc::new(SharedRouter::default());
    shared.register(Method::Get, "/stable", tagged("stable")).unwrap();

    let writer = {
        let shared = shared.clone();
        tokio::spawn(async move {
            for i in 0..100 {
                shared
                    .register(Method::Get, &format!("/dyn/{i}"), tagged("dyn"))
                    .unwrap();
                tokio::task::yield_now().await;
            }
        })
    };

    let mut readers = Vec::new();
    for _ in 0..8 {
        let shared = shared.clone();
        readers.push(tokio::spawn(async move {
            for _ in 0..200 {
                let res = shared
                    .dispatch(Request::new(HttpMethod::GET, "/stable"))
                    .await;
                assert_eq!(res.status(), StatusCode::OK);
                assert_eq!(handler_tag(&res), "stable");
            }
        }));
    }

    writer.await.unwrap();
    for reader in readers {
        reader.await.unwrap();
    }

    assert_eq!(shared.len(), 101);
    let res = shared
        .dispatch(Request::new(HttpMethod::GET, "/dyn/99"))
        .await;
    assert_eq!(handler_tag(&res), "dyn");
}

#[tokio::test]
async fn test_sample_config_routes() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("config/dispatch.toml");
    let config = edge_dispatch::config::load_config(&path).unwrap();
    let router = Router::from_config(&config).unwrap();

    let res = router
        .dispatch(Request::new(HttpMethod::GET, "/api/health"))
        .await;
    let body = res.json_body().unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["env"], "development");
    assert!(body["timestamp"].is_string());

    let res = router
        .dispatch(Request::new(HttpMethod::GET, "/api/test"))
        .await;
    assert_eq!(res.json_body().unwrap()["message"], "test endpoint");

    let res = router
        .dispatch(Request::new(HttpMethod::POST, "/api/test"))
        .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
