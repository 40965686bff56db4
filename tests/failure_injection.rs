//! Failure injection tests for the edge proxy.

use std::collections::HashMap;
use std::time::Duration;

use axum::http::StatusCode;
use edge_proxy::config::{ProxyConfig, RouteConfig};
use edge_proxy::http::{ErrorBody, X_PROXY_BACKEND, X_REQUEST_ID, X_RESPONSE_TIME};

mod common;
use common::Reply;

#[tokio::test]
async fn unreachable_target_fails_only_its_share() {
    let a = common::spawn_ok_backend(r#"{"from":"a"}"#).await;
    let b = common::unreachable_addr().await;
    let c = common::spawn_ok_backend(r#"{"from":"c"}"#).await;
    let b_url = format!("http://{b}");

    let (proxy, shutdown) =
        common::start_proxy(common::fast_retry_config(), &[a.url(), b_url.clone(), c.url()]).await;
    let client = common::client();

    let mut tasks = Vec::new();
    for _ in 0..6 {
        let client = client.clone();
        let url = format!("http://{proxy}/api/proxy/posts");
        tasks.push(tokio::spawn(async move { client.get(url).send().await.unwrap() }));
    }

    let mut by_backend: HashMap<String, Vec<StatusCode>> = HashMap::new();
    for task in tasks {
        let res = task.await.unwrap();
        let status = res.status();
        assert!(res.headers().get(X_REQUEST_ID.as_str()).is_some());
        if status == StatusCode::OK {
            let backend = res.headers()[X_PROXY_BACKEND.as_str()].to_str().unwrap().to_string();
            by_backend.entry(backend).or_default().push(status);
        } else {
            let body: ErrorBody = res.json().await.unwrap();
            assert_eq!(body.error, "Backend unavailable");
            by_backend.entry(body.backend.unwrap()).or_default().push(status);
        }
    }

    assert_eq!(by_backend[&a.url()], vec![StatusCode::OK; 2]);
    assert_eq!(by_backend[&c.url()], vec![StatusCode::OK; 2]);
    assert_eq!(by_backend[&b_url], vec![StatusCode::SERVICE_UNAVAILABLE; 2]);
    // Retries never move to another target.
    assert_eq!(a.calls(), 2);
    assert_eq!(c.calls(), 2);

    shutdown.trigger();
}

#[tokio::test]
async fn retries_server_errors_until_success() {
    let backend = common::spawn_backend(|i, _| {
        if i < 2 {
            Reply::Respond { status: 503, body: "{}".into() }
        } else {
            Reply::Respond { status: 200, body: r#"{"ok":true}"#.into() }
        }
    })
    .await;

    let (proxy, shutdown) = common::start_proxy(common::fast_retry_config(), &[backend.url()]).await;
    let res = common::client()
        .get(format!("http://{proxy}/api/proxy/health"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers()[X_RESPONSE_TIME.as_str()].to_str().unwrap().ends_with("ms"));
    assert_eq!(res.text().await.unwrap(), r#"{"ok":true}"#);
    assert_eq!(backend.calls(), 3);
    shutdown.trigger();
}

#[tokio::test]
async fn persistent_server_error_becomes_bad_gateway() {
    let backend = common::spawn_backend(|_, _| Reply::Respond { status: 500, body: "{}".into() }).await;

    let mut config = common::fast_retry_config();
    config.retries.max_retries = 2;
    let (proxy, shutdown) = common::start_proxy(config, &[backend.url()]).await;

    let res = common::client()
        .get(format!("http://{proxy}/api/proxy/posts"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    let body: ErrorBody = res.json().await.unwrap();
    assert_eq!(body.error, "Backend error");
    assert_eq!(body.backend.as_deref(), Some(backend.url().as_str()));
    assert_eq!(backend.calls(), 3);
    shutdown.trigger();
}

#[tokio::test]
async fn client_error_passes_through_after_one_call() {
    let backend = common::spawn_backend(|_, _| Reply::Respond {
        status: 404,
        body: r#"{"detail":"no such post"}"#.into(),
    })
    .await;

    let (proxy, shutdown) = common::start_proxy(common::fast_retry_config(), &[backend.url()]).await;
    let res = common::client()
        .get(format!("http://{proxy}/api/proxy/posts/999"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.headers()[X_PROXY_BACKEND.as_str()], backend.url().as_str());
    assert_eq!(res.text().await.unwrap(), r#"{"detail":"no such post"}"#);
    assert_eq!(backend.calls(), 1);
    shutdown.trigger();
}

#[tokio::test]
async fn body_survives_dropped_connection() {
    let backend = common::spawn_backend(|i, _| {
        if i == 0 {
            Reply::Drop
        } else {
            Reply::Respond { status: 201, body: r#"{"id":7}"#.into() }
        }
    })
    .await;

    let (proxy, shutdown) = common::start_proxy(common::fast_retry_config(), &[backend.url()]).await;
    let payload = r#"{"title":"Hello","body":"first post"}"#;
    let res = common::client()
        .post(format!("http://{proxy}/api/proxy/posts"))
        .header("content-type", "application/json")
        .body(payload)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::CREATED);
    let recorded = backend.recorded();
    assert_eq!(recorded.len(), 2);
    for request in &recorded {
        assert_eq!(request.method, "POST");
        assert_eq!(request.target, "/api/posts");
        assert_eq!(request.body, payload.as_bytes());
    }
    shutdown.trigger();
}

#[tokio::test]
async fn slow_backend_times_out_with_408() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    // Accept and hold connections open without answering.
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    let mut config = common::fast_retry_config();
    config.timeouts.attempt_ms = 100;
    config.retries.max_retries = 1;
    let (proxy, shutdown) = common::start_proxy(config, &[format!("http://{addr}")]).await;

    let res = common::client()
        .get(format!("http://{proxy}/api/proxy/slow"))
        .timeout(Duration::from_secs(10))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::REQUEST_TIMEOUT);
    let body: ErrorBody = res.json().await.unwrap();
    assert_eq!(body.error, "Request timeout");
    shutdown.trigger();
}

#[tokio::test]
async fn route_headers_and_longest_prefix() {
    let backend = common::spawn_ok_backend("{}").await;

    let mut config = ProxyConfig::default();
    let mut bulk = RouteConfig {
        name: "bulk".into(),
        public_prefix: "/api/proxy/bulk".into(),
        backend_prefix: "/internal/bulk".into(),
        timeout_ms: Some(120_000),
        ..RouteConfig::default()
    };
    bulk.headers.insert("x-route".into(), "bulk".into());
    config.routes = vec![RouteConfig::default(), bulk];

    let (proxy, shutdown) = common::start_proxy(config, &[backend.url()]).await;
    let client = common::client();

    let res = client
        .get(format!("http://{proxy}/api/proxy/bulk/export?fmt=csv"))
        .header("cookie", "sid=1")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client.get(format!("http://{proxy}/api/proxy/posts")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let recorded = backend.recorded();
    assert_eq!(recorded[0].target, "/internal/bulk/export?fmt=csv");
    assert_eq!(recorded[0].headers.get("x-route").map(String::as_str), Some("bulk"));
    assert!(!recorded[0].headers.contains_key("cookie"));
    assert_eq!(recorded[1].target, "/api/posts");
    assert!(!recorded[1].headers.contains_key("x-route"));
    shutdown.trigger();
}

#[tokio::test]
async fn oversized_body_is_rejected_before_dispatch() {
    let backend = common::spawn_ok_backend("{}").await;

    let mut config = common::fast_retry_config();
    config.security.max_body_size = 16;
    let (proxy, shutdown) = common::start_proxy(config, &[backend.url()]).await;

    let res = common::client()
        .post(format!("http://{proxy}/api/proxy/posts"))
        .body(vec![b'x'; 1024])
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: ErrorBody = res.json().await.unwrap();
    assert_eq!(body.error, "Invalid request body");
    assert_eq!(backend.calls(), 0);
    shutdown.trigger();
}

#[tokio::test]
async fn head_reports_upstream_content_length() {
    let backend = common::spawn_backend(|_, _| Reply::Respond {
        status: 200,
        body: r#"{"title":"Hello"}"#.into(),
    })
    .await;

    let (proxy, shutdown) = common::start_proxy(common::fast_retry_config(), &[backend.url()]).await;
    let res = common::client()
        .head(format!("http://{proxy}/api/proxy/posts/1"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-length"], "17");
    assert_eq!(res.headers()[X_PROXY_BACKEND.as_str()], backend.url().as_str());
    assert_eq!(backend.recorded()[0].method, "HEAD");
    shutdown.trigger();
}
