//! HTTP API tests against the in-process router

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use build_notifier::config::Settings;
use build_notifier::publisher::MemoryPublisher;
use build_notifier::server::{create_app, AppState};

fn create_test_app(settings: Settings) -> (Router, Arc<MemoryPublisher>) {
    let publisher = Arc::new(MemoryPublisher::new());
    let state = AppState::new(settings, publisher.clone());
    (create_app(state), publisher)
}

async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

fn build_subject() -> Value {
    json!({
        "type": "build",
        "id": 1,
        "repository": {"id": 2, "owner_name": "svenfuchs", "name": "minimal"}
    })
}

#[tokio::test]
async fn test_dispatch_event_publishes() {
    let (app, publisher) = create_test_app(Settings::default());

    let (status, body) = post_json(
        app,
        "/api/v1/events",
        json!({"event": "build:started", "subject": build_subject()}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["event"], "build:started");
    assert_eq!(body["handled"], 1);
    assert_eq!(publisher.messages_for("builds").await.len(), 1);
}

#[tokio::test]
async fn test_dispatch_unknown_event_is_bad_request() {
    let (app, publisher) = create_test_app(Settings::default());

    let (status, body) = post_json(
        app,
        "/api/v1/events",
        json!({"event": "build:exploded", "subject": build_subject()}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "UNROUTABLE_EVENT");
    assert!(publisher.is_empty().await);
}

#[tokio::test]
async fn test_dispatch_reports_handler_failure() {
    let (app, _) = create_test_app(Settings::default());

    let (status, body) = post_json(
        app,
        "/api/v1/events",
        json!({"event": "build:log", "subject": build_subject()}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["failed"], 1);
}

#[tokio::test]
async fn test_dispatch_with_pusher_disabled_is_unavailable() {
    let mut settings = Settings::default();
    settings.notifications.enabled.clear();
    let (app, _) = create_test_app(settings);

    let (status, body) = post_json(
        app,
        "/api/v1/events",
        json!({"event": "build:started", "subject": build_subject()}),
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "UNAVAILABLE");
}

#[tokio::test]
async fn test_preview_job_event() {
    let (app, publisher) = create_test_app(Settings::default());

    let (status, body) = post_json(
        app,
        "/api/v1/events/preview",
        json!({
            "event": "job:test:started",
            "subject": {"type": "job", "id": 5, "request": {"id": 4, "build": build_subject()}}
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["queue"], "jobs");
    assert_eq!(body["event"], "build:removed");
    assert_eq!(body["payload"]["build"]["id"], 1);
    assert!(publisher.is_empty().await);
}

#[tokio::test]
async fn test_preview_errors() {
    let (app, _) = create_test_app(Settings::default());
    let (status, body) = post_json(
        app,
        "/api/v1/events/preview",
        json!({"event": "build:log", "subject": build_subject()}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "MISSING_EXTRA_FIELD");

    let (app, _) = create_test_app(Settings::default());
    let (status, body) = post_json(
        app,
        "/api/v1/events/preview",
        json!({"event": "job:test:started", "subject": {"type": "job", "id": 5}}),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "UNRESOLVABLE_RELATIONSHIP");
}

#[tokio::test]
async fn test_health() {
    let (app, _) = create_test_app(Settings::default());

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["publisher"], "memory");
    assert_eq!(body["subscriptions"], 6);
}

#[tokio::test]
async fn test_stats_counts_published_messages() {
    let (app, _) = create_test_app(Settings::default());

    let (status, _) = post_json(
        app.clone(),
        "/api/v1/events",
        json!({"event": "build:queued", "subject": build_subject()}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let response = app
        .oneshot(Request::builder().uri("/stats").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["registry"]["total_subscriptions"], 6);
    assert_eq!(body["registry"]["subscriptions"]["build:log"], 1);
    assert_eq!(body["pusher"]["published"], 1);
    assert_eq!(body["pusher"]["dispatch_failed"], 0);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let (app, _) = create_test_app(Settings::default());

    let response = app
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()["content-type"].to_str().unwrap();
    assert!(content_type.starts_with("text/plain"));
}
