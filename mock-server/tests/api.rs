use std::time::Duration;

use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{router, AppState};
use tower::ServiceExt;

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn state() -> AppState {
    AppState {
        delay: Duration::from_millis(10),
        ..AppState::default()
    }
}

fn empty(method: &str, uri: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(String::new())
        .unwrap()
}

// --- fixed responses ---

#[tokio::test]
async fn no_content_for_every_method() {
    for method in ["GET", "PUT", "POST", "DELETE"] {
        let resp = router(state()).oneshot(empty(method, "/204")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT, "{method}");
        assert!(body_bytes(resp).await.is_empty(), "{method}");
    }
}

#[tokio::test]
async fn text_route_returns_plain_text() {
    let resp = router(state()).oneshot(empty("GET", "/200-text")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let content_type = resp.headers()[http::header::CONTENT_TYPE].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/plain"));
    assert_eq!(body_bytes(resp).await, "hello world");
}

#[tokio::test]
async fn json_route_returns_object() {
    let resp = router(state()).oneshot(empty("GET", "/200-json")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, serde_json::json!({ "hello": "world" }));
}

#[tokio::test]
async fn delay_route_answers_after_configured_delay() {
    let resp = router(state()).oneshot(empty("GET", "/200-delay")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_bytes(resp).await, "ok");
}

#[tokio::test]
async fn error_routes_return_json_bodies() {
    let resp = router(state()).oneshot(empty("GET", "/404-json")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(resp).await["error"], "file not found");

    let resp = router(state()).oneshot(empty("GET", "/500-json")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(resp).await["error"], "internal error");
}

#[tokio::test]
async fn unknown_route_is_not_recorded() {
    let state = state();
    let resp = router(state.clone()).oneshot(empty("GET", "/nope")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(state.records.read().await.is_empty());
}

// --- recording ---

#[tokio::test]
async fn records_method_path_headers_and_body() {
    let state = state();
    let req = Request::builder()
        .method("PUT")
        .uri("/204")
        .header(http::header::CONTENT_TYPE, "text/plain;charset=UTF-8")
        .header("Hello", "world")
        .body("hello".to_string())
        .unwrap();

    let resp = router(state.clone()).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let records = state.records.read().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].method, "PUT");
    assert_eq!(records[0].path, "/204");
    assert_eq!(records[0].body, "hello");
    assert_eq!(records[0].header("content-type"), Some("text/plain;charset=UTF-8"));
    assert_eq!(records[0].header("hello"), Some("world"));
}

#[tokio::test]
async fn records_accumulate_in_order() {
    use tower::Service;

    let state = state();
    let mut app = router(state.clone()).into_service();

    for (method, uri) in [("GET", "/200-text"), ("DELETE", "/204"), ("POST", "/404-json")] {
        ServiceExt::ready(&mut app)
            .await
            .unwrap()
            .call(empty(method, uri))
            .await
            .unwrap();
    }

    let records = state.records.read().await;
    let seen: Vec<(&str, &str)> = records
        .iter()
        .map(|r| (r.method.as_str(), r.path.as_str()))
        .collect();
    assert_eq!(
        seen,
        vec![("GET", "/200-text"), ("DELETE", "/204"), ("POST", "/404-json")]
    );
}
