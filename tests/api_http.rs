// tests/api_http.rs
//
// HTTP-level tests for the public API Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value as Json};
use tower::ServiceExt as _; // for `oneshot`

use pakinfo_bot::api::{self, AppState};
use pakinfo_bot::config::AppConfig;
use pakinfo_bot::llm::{MockProvider, RetryingClient};
use pakinfo_bot::session::SessionStore;
use pakinfo_bot::{ChatService, FetchError, PageFetcher, Source, NO_UPDATES_REPLY};

const BODY_LIMIT: usize = 1024 * 1024;

struct OnePageFetcher;

#[async_trait]
impl PageFetcher for OnePageFetcher {
    async fn fetch_page(&self, source: &Source) -> Result<String, FetchError> {
        if source.name == "FBR" {
            Ok("<li>Notification: revised income tax return deadline announced</li>".into())
        } else {
            Err(FetchError::Transport {
                url: source.url.clone(),
                message: "connection refused".into(),
            })
        }
    }
    fn name(&self) -> &'static str {
        "one-page"
    }
}

fn test_router(sources: Vec<Source>) -> Router {
    let chat = ChatService::new(
        &AppConfig::default(),
        Arc::new(OnePageFetcher),
        Arc::new(RetryingClient::new(MockProvider::new("Mock answer."), 0)),
        sources,
        Arc::new(SessionStore::new()),
    );
    api::create_router(AppState::new(chat))
}

fn default_sources() -> Vec<Source> {
    vec![
        Source::new("PID", "http://pid.gov.pk/"),
        Source::new("FBR", "https://fbr.gov.pk/"),
    ]
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
    let resp = app.clone().oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    (status, bytes)
}

fn post_json(uri: &str, v: Json) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(v.to_string()))
        .expect("build request")
}

#[tokio::test]
async fn api_health_returns_200_and_ok_body() {
    let app = test_router(default_sources());
    let req = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .expect("build GET /health");
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(String::from_utf8(body).unwrap().trim(), "OK");
}

#[tokio::test]
async fn chat_creates_session_and_records_history() {
    let app = test_router(default_sources());

    let (status, body) = send(
        &app,
        post_json("/api/chat", json!({"message": "tax deadline?", "language": "اردو"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let v: Json = serde_json::from_slice(&body).unwrap();
    assert_eq!(v["reply"], "Mock answer.");
    assert_eq!(v["kind"], "answer");
    assert_eq!(v["updates_used"], 1);
    assert_eq!(v["language"], "Urdu");
    let sid = v["session_id"].as_str().unwrap().to_string();

    let req = Request::builder()
        .uri(format!("/api/sessions/{sid}/history"))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    let h: Json = serde_json::from_slice(&body).unwrap();
    assert_eq!(
        h,
        json!([
            {"role": "user", "content": "tax deadline?"},
            {"role": "assistant", "content": "Mock answer."}
        ])
    );

    // language persists for the session when omitted
    let (_, body) = send(
        &app,
        post_json("/api/chat", json!({"session_id": sid, "message": "again"})),
    )
    .await;
    let v: Json = serde_json::from_slice(&body).unwrap();
    assert_eq!(v["language"], "Urdu");
}

#[tokio::test]
async fn chat_without_updates_returns_fallback() {
    let app = test_router(vec![Source::new("PID", "http://pid.gov.pk/")]);
    let (status, body) = send(&app, post_json("/api/chat", json!({"message": "hello"}))).await;
    assert_eq!(status, StatusCode::OK);
    let v: Json = serde_json::from_slice(&body).unwrap();
    assert_eq!(v["reply"], NO_UPDATES_REPLY);
    assert_eq!(v["kind"], "no_updates");
}

#[tokio::test]
async fn chat_rejects_empty_message_and_unknown_language() {
    let app = test_router(default_sources());
    let (status, _) = send(&app, post_json("/api/chat", json!({"message": "  "}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        post_json("/api/chat", json!({"message": "hi", "language": "French"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_session_history_is_404() {
    let app = test_router(default_sources());
    let req = Request::builder()
        .uri("/api/sessions/nope/history")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

fn put_language(id: &str, body: &'static str) -> Request<Body> {
    Request::builder()
        .method("PUT")
        .uri(format!("/api/sessions/{id}/language"))
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn language_can_be_switched() {
    let app = test_router(default_sources());
    let (_, body) = send(&app, post_json("/api/chat", json!({"session_id": "s1", "message": "news"}))).await;
    let v: Json = serde_json::from_slice(&body).unwrap();
    assert_eq!(v["language"], "English");

    let (status, body) = send(&app, put_language("s1", r#"{"language":"urdu"}"#)).await;
    assert_eq!(status, StatusCode::OK);
    let v: Json = serde_json::from_slice(&body).unwrap();
    assert_eq!(v["language"], "Urdu");

    let (_, body) = send(
        &app,
        post_json("/api/chat", json!({"session_id": "s1", "message": "news"})),
    )
    .await;
    let v: Json = serde_json::from_slice(&body).unwrap();
    assert_eq!(v["language"], "Urdu");
}

#[tokio::test]
async fn language_switch_on_unknown_session_is_404() {
    let app = test_router(default_sources());
    let (status, _) = send(&app, put_language("nobody", r#"{"language":"Urdu"}"#)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let req = Request::builder()
        .uri("/api/sessions/nobody/history")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn languages_sources_and_updates_are_listed() {
    let app = test_router(default_sources());

    let (_, body) = send(&app, Request::builder().uri("/api/languages").body(Body::empty()).unwrap()).await;
    let v: Json = serde_json::from_slice(&body).unwrap();
    assert_eq!(
        v,
        json!([{"name": "English", "label": "English"}, {"name": "Urdu", "label": "اردو"}])
    );

    let (_, body) = send(&app, Request::builder().uri("/api/sources").body(Body::empty()).unwrap()).await;
    let v: Json = serde_json::from_slice(&body).unwrap();
    assert_eq!(v[1]["name"], "FBR");

    let (_, body) = send(&app, Request::builder().uri("/api/updates").body(Body::empty()).unwrap()).await;
    let v: Json = serde_json::from_slice(&body).unwrap();
    assert_eq!(v["sources"], 2);
    assert_eq!(v["failed"], 1);
    assert_eq!(v["updates"][0]["source"], "FBR");
}
