//! End-to-end tests through the compiled axum router.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::body::Body;
use http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use gantry_rs_core::{AppError, CorsConfig, Settings, ThrottleConfig};
use gantry_rs_http::{codes, Response, ResponseMapper};
use gantry_rs_pipeline::{App, Handler, HandlerFuture, RequestContext};

fn quiet_settings() -> Settings {
    Settings {
        cors: CorsConfig {
            enabled: false,
            ..CorsConfig::default()
        },
        ..Settings::default()
    }
}

fn app() -> App {
    App::new(quiet_settings(), ResponseMapper::standard()).expect("app boots")
}

async fn send(router: axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.oneshot(request).await.expect("infallible");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, body)
}

fn get(path: &str) -> Request<Body> {
    Request::builder()
        .uri(path)
        .body(Body::empty())
        .expect("request")
}

fn greet(ctx: &mut RequestContext) -> HandlerFuture<'_> {
    let name = ctx
        .request()
        .param("name")
        .unwrap_or("anonymous")
        .to_owned();
    Box::pin(async move { Ok(Some(Response::ok().with_body(json!({ "data": name })))) })
}

fn fail_teapot(_ctx: &mut RequestContext) -> HandlerFuture<'_> {
    Box::pin(async move { Err(AppError::new("418", "short and stout")) })
}

fn fail_uncharted(_ctx: &mut RequestContext) -> HandlerFuture<'_> {
    Box::pin(async move { Err(AppError::new("999", "uncharted")) })
}

fn panics(_ctx: &mut RequestContext) -> HandlerFuture<'_> {
    Box::pin(async move { panic!("wrecked") })
}

fn panics_structured(_ctx: &mut RequestContext) -> HandlerFuture<'_> {
    Box::pin(async move { std::panic::panic_any(AppError::new("403", "thrown, not returned")) })
}

fn noop(_ctx: &mut RequestContext) -> HandlerFuture<'_> {
    Box::pin(async move { Ok(None) })
}

fn slow(_ctx: &mut RequestContext) -> HandlerFuture<'_> {
    Box::pin(async move {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(Some(Response::ok()))
    })
}

#[tokio::test]
async fn routes_resolve_with_path_params() {
    let mut app = app();
    let mut api = app.controller().branch("/api");
    api.handle("GET /greet/:name", Handler::new(greet)).unwrap();
    let router = app.build().unwrap();

    let (status, body) = send(router, get("/api/greet/ada")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], "ada");
    assert_eq!(body["status"]["code"], "200");
}

#[tokio::test]
async fn status_endpoint_reports_meta() {
    let app = app();
    let (status, body) = send(app.build().unwrap(), get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["app_name"], "Core");
}

#[tokio::test]
async fn unmatched_paths_fall_back_to_not_found() {
    let app = app();
    let (status, body) = send(app.build().unwrap(), get("/missing")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"]["code"], "404");
}

#[tokio::test]
async fn unrouted_methods_resolve_to_method_not_allowed() {
    let mut app = app();
    app.controller()
        .handle("GET /only-get", Handler::new(greet))
        .unwrap();
    let request = Request::builder()
        .method(http::Method::DELETE)
        .uri("/only-get")
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(app.build().unwrap(), request).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["status"]["code"], codes::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn errors_resolve_through_the_mapper() {
    let mut mapper = ResponseMapper::standard();
    mapper.load([(
        "418".to_owned(),
        Response::new(StatusCode::IM_A_TEAPOT).with_body(json!({ "status": { "code": "418" } })),
    )]);
    let mut app = App::new(quiet_settings(), mapper).unwrap();
    app.controller()
        .handle("GET /teapot", Handler::new(fail_teapot))
        .unwrap();

    let (status, body) = send(app.build().unwrap(), get("/teapot")).await;
    assert_eq!(status, StatusCode::IM_A_TEAPOT);
    assert_eq!(body["errors"][0]["message"], "short and stout");
}

#[tokio::test]
async fn unmapped_error_codes_fall_back_to_internal_error() {
    let mut app = app();
    app.controller()
        .handle("GET /odd", Handler::new(fail_uncharted))
        .unwrap();

    let (status, body) = send(app.build().unwrap(), get("/odd")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["errors"][0]["message"], "uncharted");
}

#[tokio::test]
async fn panics_become_internal_errors() {
    let mut app = app();
    app.controller()
        .handle("GET /panic", Handler::new(panics))
        .unwrap();

    let (status, body) = send(app.build().unwrap(), get("/panic")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["errors"][0]["message"], "wrecked");
    // debug is off, so no stack lines leak
    assert!(body["errors"][0].get("_stack").is_none());
}

#[tokio::test]
async fn structured_panic_payloads_keep_their_code() {
    let mut app = app();
    app.controller()
        .handle("GET /thrown", Handler::new(panics_structured))
        .unwrap();

    let (status, body) = send(app.build().unwrap(), get("/thrown")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["errors"][0]["message"], "thrown, not returned");
}

#[tokio::test]
async fn overlong_chains_fail_at_boot() {
    let mut app = app();
    let chain: Vec<Handler> = (0..64).map(|_| Handler::new(noop)).collect();
    app.controller().handle("GET /wide", chain).unwrap();

    let error = app.build().expect_err("chain over the ceiling");
    assert!(matches!(
        error,
        gantry_rs_pipeline::BootError::TooManyHandlers { count: 65, .. }
    ));
}

static SHARED_HITS: AtomicUsize = AtomicUsize::new(0);

fn count_shared(ctx: &mut RequestContext) -> HandlerFuture<'_> {
    SHARED_HITS.fetch_add(1, Ordering::SeqCst);
    ctx.next()
}

#[tokio::test]
async fn duplicate_middleware_names_run_once_per_request() {
    let mut app = app();
    {
        let mut api = app.controller().branch("/api");
        api.handle("USE", Handler::named("counter", count_shared))
            .unwrap();
        let mut inner = api.branch("/inner");
        inner
            .handle("USE", Handler::named("counter", count_shared))
            .unwrap();
        inner.handle("GET /ping", Handler::new(greet)).unwrap();
    }

    let (status, _) = send(app.build().unwrap(), get("/api/inner/ping")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(SHARED_HITS.load(Ordering::SeqCst), 1);
}

static SIBLING_HITS: AtomicUsize = AtomicUsize::new(0);

fn count_sibling(ctx: &mut RequestContext) -> HandlerFuture<'_> {
    SIBLING_HITS.fetch_add(1, Ordering::SeqCst);
    ctx.next()
}

#[tokio::test]
async fn branch_middleware_does_not_leak_to_siblings() {
    let mut app = app();
    {
        let mut guarded = app.controller().branch("/guarded");
        guarded
            .handle("USE", Handler::named("sibling-counter", count_sibling))
            .unwrap();
        guarded.handle("GET /a", Handler::new(greet)).unwrap();
    }
    {
        let mut open = app.controller().branch("/open");
        open.handle("GET /b", Handler::new(greet)).unwrap();
    }
    let router = app.build().unwrap();

    let (status, _) = send(router.clone(), get("/open/b")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(SIBLING_HITS.load(Ordering::SeqCst), 0);

    let (status, _) = send(router, get("/guarded/a")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(SIBLING_HITS.load(Ordering::SeqCst), 1);
}

static POST_SEEN_STATUS: AtomicUsize = AtomicUsize::new(0);

fn record_status(ctx: &mut RequestContext) -> HandlerFuture<'_> {
    let status = ctx.response_status().map_or(0, |s| usize::from(s.as_u16()));
    POST_SEEN_STATUS.store(status, Ordering::SeqCst);
    Box::pin(async move { Ok(None) })
}

#[tokio::test]
async fn postware_observes_the_finished_response() {
    let mut app = app();
    app.controller()
        .handle("POSTUSE", Handler::named("audit", record_status))
        .unwrap();
    app.controller()
        .handle("GET /done", Handler::new(greet))
        .unwrap();

    let (status, _) = send(app.build().unwrap(), get("/done")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(POST_SEEN_STATUS.load(Ordering::SeqCst), 200);
}

#[tokio::test]
async fn slow_handlers_hit_the_deadline() {
    let settings = Settings {
        request_timeout_ms: Some(50),
        ..quiet_settings()
    };
    let mut app = App::new(settings, ResponseMapper::standard()).unwrap();
    app.controller()
        .handle("GET /slow", Handler::new(slow))
        .unwrap();

    let (status, body) = send(app.build().unwrap(), get("/slow")).await;
    assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
    assert_eq!(body["status"]["code"], codes::REQUEST_TIMEOUT);
}

#[tokio::test]
async fn deadline_covers_handlers_after_fall_through_middleware() {
    let settings = Settings {
        request_timeout_ms: Some(50),
        ..quiet_settings()
    };
    let mut app = App::new(settings, ResponseMapper::standard()).unwrap();
    app.controller()
        .handle("USE", Handler::named("inspect-only", noop))
        .unwrap();
    app.controller()
        .handle("GET /slow", Handler::new(slow))
        .unwrap();

    let started = std::time::Instant::now();
    let (status, body) = send(app.build().unwrap(), get("/slow")).await;
    assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
    assert_eq!(body["status"]["code"], codes::REQUEST_TIMEOUT);
    // the slow handler ran under the deadline, not after the middleware
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[tokio::test]
async fn throttle_rejects_once_the_burst_is_spent() {
    let settings = Settings {
        throttle: ThrottleConfig {
            enabled: true,
            max_per_sec: 1,
            burst: 1,
        },
        ..quiet_settings()
    };
    let mut app = App::new(settings, ResponseMapper::standard()).unwrap();
    app.controller()
        .handle("GET /limited", Handler::new(greet))
        .unwrap();
    let router = app.build().unwrap();

    let (status, _) = send(router.clone(), get("/limited")).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = send(router, get("/limited")).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["status"]["code"], codes::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn cors_preflight_short_circuits() {
    let mut app = App::new(Settings::default(), ResponseMapper::standard()).unwrap();
    app.controller()
        .handle("GET /data", Handler::new(greet))
        .unwrap();
    let router = app.build().unwrap();

    let preflight = Request::builder()
        .method(http::Method::OPTIONS)
        .uri("/data")
        .header("origin", "https://client.test")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(preflight).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("https://client.test")
    );
    assert!(response
        .headers()
        .contains_key("access-control-allow-methods"));
}

#[tokio::test]
async fn disallowed_origins_are_rejected() {
    let settings = Settings {
        cors: CorsConfig {
            enabled: true,
            allow_origins: Some(vec!["https://friendly.test".to_owned()]),
            ..CorsConfig::default()
        },
        ..Settings::default()
    };
    let mut app = App::new(settings, ResponseMapper::standard()).unwrap();
    app.controller()
        .handle("GET /data", Handler::new(greet))
        .unwrap();

    let request = Request::builder()
        .uri("/data")
        .header("origin", "https://hostile.test")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app.build().unwrap(), request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["status"]["code"], codes::FORBIDDEN);
}
