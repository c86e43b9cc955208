//! Router tests that need no database
//!
//! The pool is lazy and points at a closed port, so any handler that
//! reaches the database fails; these requests are all answered before.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use q5_server::assistant::{AssistantError, ChatBackend, ChatMessage};
use q5_server::http::USER_ID_HEADER;
use q5_server::{build_router, AppState, ServerConfig};
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;
use uuid::Uuid;

struct EchoBackend;

#[async_trait]
impl ChatBackend for EchoBackend {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, AssistantError> {
        let last = messages.last().map(|m| m.content.as_str()).unwrap_or("");
        Ok(format!("echo: {last}"))
    }
}

struct FailingBackend;

#[async_trait]
impl ChatBackend for FailingBackend {
    async fn complete(&self, _: &[ChatMessage]) -> Result<String, AssistantError> {
        Err(AssistantError::Upstream { status: 500 })
    }
}

/// Answers after a delay longer than the test request timeout.
struct SlowBackend;

#[async_trait]
impl ChatBackend for SlowBackend {
    async fn complete(&self, _: &[ChatMessage]) -> Result<String, AssistantError> {
        tokio::time::sleep(Duration::from_millis(300)).await;
        Ok("took a while".to_owned())
    }
}

fn state() -> AppState {
    let pool = PgPoolOptions::new()
        .acquire_timeout(Duration::from_millis(200))
        .connect_lazy("postgres://q5:q5@127.0.0.1:1/q5")
        .expect("lazy pool");
    AppState::new(pool)
}

fn app(state: AppState) -> Router {
    build_router(Arc::new(state), &ServerConfig::default()).expect("router")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, user: Option<Uuid>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(id) = user {
        builder = builder.header(USER_ID_HEADER, id.to_string());
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_is_ok() {
    let response = app(state()).oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "ok");
}

#[tokio::test]
async fn status_reports_unreachable_database() {
    let response = app(state()).oneshot(get("/status")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body = json_body(response).await;
    assert_eq!(body["database"], false);
    assert_eq!(body["assistant_enabled"], false);
}

#[tokio::test]
async fn writes_require_identity() {
    let response = app(state())
        .oneshot(post_json("/posts", None, json!({"body": "hello"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["error"], "unauthorized");
}

#[tokio::test]
async fn malformed_identity_is_rejected_on_reads() {
    let request = Request::builder()
        .uri("/posts")
        .header(USER_ID_HEADER, "admin")
        .body(Body::empty())
        .unwrap();

    let response = app(state()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn blank_post_is_a_validation_error() {
    let response = app(state())
        .oneshot(post_json("/posts", Some(Uuid::new_v4()), json!({"body": "   "})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["message"], "body cannot be empty");
}

#[tokio::test]
async fn oversized_comment_is_rejected() {
    let uri = format!("/posts/{}/comments", Uuid::new_v4());
    let response = app(state())
        .oneshot(post_json(&uri, Some(Uuid::new_v4()), json!({"body": "c".repeat(2001)})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn bad_path_uuid_is_400() {
    let response = app(state()).oneshot(get("/posts/not-a-uuid")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn cannot_entangle_with_yourself() {
    let me = Uuid::new_v4();
    let response = app(state())
        .oneshot(post_json("/entanglements", Some(me), json!({"addressee_id": me})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["message"], "addressee_id cannot be yourself");
}

#[tokio::test]
async fn question_tag_limit() {
    let response = app(state())
        .oneshot(post_json(
            "/questions",
            Some(Uuid::new_v4()),
            json!({
                "title": "Which error-correcting code?",
                "body": "Comparing options",
                "tags": ["a", "b", "c", "d", "e", "f"]
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn badge_preview_scores_without_login() {
    let response = app(state())
        .oneshot(post_json(
            "/badge/preview",
            None,
            json!({
                "involvement": 4,
                "contribution": 4,
                "role": "Researcher",
                "education": "PhD",
                "impact": 4
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["level"], 5);
    assert_eq!(body["label"], "Authority");
    assert_eq!(body["review_status"], "pending");
}

#[tokio::test]
async fn out_of_range_json_field_uses_error_body() {
    let response = app(state())
        .oneshot(post_json(
            "/badge/preview",
            None,
            json!({
                "involvement": 300,
                "contribution": 4,
                "role": "Researcher",
                "education": "PhD",
                "impact": 4
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "validation_error");
    assert!(body["message"].as_str().unwrap().contains("involvement"));
}

#[tokio::test]
async fn malformed_json_uses_error_body() {
    let request = Request::builder()
        .method("POST")
        .uri("/posts")
        .header("content-type", "application/json")
        .header(USER_ID_HEADER, Uuid::new_v4().to_string())
        .body(Body::from("{\"body\": "))
        .unwrap();

    let response = app(state()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "validation_error");
}

#[tokio::test]
async fn unknown_sort_uses_error_body() {
    let response = app(state())
        .oneshot(get("/questions?sort=popular"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "validation_error");
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn assistant_unconfigured_is_503() {
    let response = app(state())
        .oneshot(post_json(
            "/assistant/chat",
            Some(Uuid::new_v4()),
            json!({"messages": [{"role": "user", "content": "hi"}]}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json_body(response).await["error"], "assistant_unavailable");
}

#[tokio::test]
async fn assistant_replies_through_backend() {
    let state = state().with_assistant(Arc::new(EchoBackend));
    let response = app(state)
        .oneshot(post_json(
            "/assistant/chat",
            Some(Uuid::new_v4()),
            json!({"messages": [{"role": "user", "content": "what is entanglement?"}]}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["reply"]["role"], "assistant");
    assert_eq!(body["reply"]["content"], "echo: what is entanglement?");
}

#[tokio::test]
async fn assistant_rejects_trailing_assistant_turn() {
    let state = state().with_assistant(Arc::new(EchoBackend));
    let response = app(state)
        .oneshot(post_json(
            "/assistant/chat",
            Some(Uuid::new_v4()),
            json!({"messages": [
                {"role": "user", "content": "hi"},
                {"role": "assistant", "content": "hello"}
            ]}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn assistant_upstream_failure_is_502() {
    let state = state().with_assistant(Arc::new(FailingBackend));
    let response = app(state)
        .oneshot(post_json(
            "/assistant/chat",
            Some(Uuid::new_v4()),
            json!({"messages": [{"role": "user", "content": "hi"}]}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(json_body(response).await["error"], "upstream_error");
}

#[tokio::test]
async fn slow_assistant_outlives_request_timeout() {
    let state = state().with_assistant(Arc::new(SlowBackend));
    let config = ServerConfig {
        request_timeout: Duration::from_millis(100),
        ..ServerConfig::default()
    };
    let app = build_router(Arc::new(state), &config).expect("router");

    let response = app
        .oneshot(post_json(
            "/assistant/chat",
            Some(Uuid::new_v4()),
            json!({"messages": [{"role": "user", "content": "hi"}]}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["reply"]["content"], "took a while");
}

#[tokio::test]
async fn message_stream_requires_identity() {
    let response = app(state()).oneshot(get("/messages/stream")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn message_stream_opens_for_member() {
    let request = Request::builder()
        .uri("/messages/stream")
        .header(USER_ID_HEADER, Uuid::new_v4().to_string())
        .body(Body::empty())
        .unwrap();

    let response = app(state()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"],
        "text/event-stream"
    );
}
