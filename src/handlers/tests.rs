//! # Tests for Handlers
//!
//! Drives the full router with `tower::ServiceExt::oneshot` against the in-memory store.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
};
use serde_json::{Value, json};
use tower::ServiceExt;

use crate::config::AppConfig;
use crate::normalization::NormalizedEvent;
use crate::repositories::{
    EventStore, InMemoryEventStore, StorageError, StoredEvent, StoredId,
};
use crate::server::{AppState, create_app};
use crate::webhook_verification::sign_body;

const SECRET: &str = "test-webhook-secret";

struct UnavailableStore;

#[async_trait]
impl EventStore for UnavailableStore {
    async fn insert(&self, _event: &NormalizedEvent) -> Result<StoredId, StorageError> {
        Err(StorageError::Unavailable("connection refused".to_string()))
    }

    async fn recent(&self, _limit: u64) -> Result<Vec<StoredEvent>, StorageError> {
        Err(StorageError::Unavailable("connection refused".to_string()))
    }

    async fn ping(&self) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("connection refused".to_string()))
    }
}

fn test_config(secret: Option<&str>) -> AppConfig {
    AppConfig {
        profile: "test".to_string(),
        webhook_secret: secret.map(str::to_string),
        ..Default::default()
    }
}

fn app_with_store(config: AppConfig, store: Arc<dyn EventStore>) -> Router {
    create_app(AppState::new(config, store))
}

fn push_payload(commit: &str) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "ref": "refs/heads/feature-x",
        "pusher": {"name": "alice"},
        "head_commit": {"id": commit, "timestamp": "2021-04-01T21:30:00Z"}
    }))
    .unwrap()
}

fn webhook_request(event_type: &str, body: Vec<u8>, secret: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/webhook")
        .header(header::CONTENT_TYPE, "application/json")
        .header("X-GitHub-Event", event_type)
        .header("X-GitHub-Delivery", "72d3162e-cc78-11e3-81ab-4c9367dc0958");
    if let Some(secret) = secret {
        builder = builder.header("X-Hub-Signature-256", sign_body(&body, secret));
    }
    builder.body(Body::from(body)).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_signed_push_is_stored_and_listed() {
    let store = Arc::new(InMemoryEventStore::new());
    let app = app_with_store(test_config(Some(SECRET)), store.clone());

    let response = app
        .clone()
        .oneshot(webhook_request("push", push_payload("abc123"), Some(SECRET)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Webhook processed successfully");
    assert_eq!(body["id"], "1");

    let response = app.oneshot(get("/data")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(
        body,
        json!([{
            "id": "1",
            "request_id": "abc123",
            "author": "alice",
            "action": "PUSH",
            "from_branch": "feature-x",
            "to_branch": "feature-x",
            "timestamp": "1st April 2021 - 09:30 PM UTC"
        }])
    );
}

#[tokio::test]
async fn test_invalid_signature_returns_401_problem() {
    let store = Arc::new(InMemoryEventStore::new());
    let app = app_with_store(test_config(Some(SECRET)), store.clone());

    let response = app
        .oneshot(webhook_request("push", push_payload("abc123"), Some("wrong")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/problem+json"
    );
    let body = body_json(response).await;
    assert_eq!(body["code"], "INVALID_SIGNATURE");
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_unsigned_request_rejected_when_secret_configured() {
    let store = Arc::new(InMemoryEventStore::new());
    let app = app_with_store(test_config(Some(SECRET)), store.clone());

    let response = app
        .oneshot(webhook_request("push", push_payload("abc123"), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_unsigned_request_accepted_without_secret() {
    let store = Arc::new(InMemoryEventStore::new());
    let app = app_with_store(test_config(None), store.clone());

    let response = app
        .oneshot(webhook_request("push", push_payload("abc123"), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_unsupported_event_is_acknowledged() {
    let store = Arc::new(InMemoryEventStore::new());
    let app = app_with_store(test_config(Some(SECRET)), store.clone());

    let response = app
        .oneshot(webhook_request(
            "issues",
            br#"{"action":"opened"}"#.to_vec(),
            Some(SECRET),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({"message": "Event type not supported"})
    );
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_malformed_payload_returns_400() {
    let store = Arc::new(InMemoryEventStore::new());
    let app = app_with_store(test_config(None), store.clone());

    let response = app
        .oneshot(webhook_request("pull_request", b"{\"pull_request\":".to_vec(), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["code"], "MALFORMED_PAYLOAD");
    assert_eq!(body["message"], "Failed to process event data");
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_storage_failure_returns_500() {
    let app = app_with_store(test_config(None), Arc::new(UnavailableStore));

    let response = app
        .clone()
        .oneshot(webhook_request("push", push_payload("abc123"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Internal server error");
    assert!(!body.to_string().contains("connection refused"));

    let response = app.oneshot(get("/data")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_data_returns_fifty_newest_first() {
    let store = Arc::new(InMemoryEventStore::new());
    let app = app_with_store(test_config(None), store.clone());

    for n in 0..60 {
        let response = app
            .clone()
            .oneshot(webhook_request("push", push_payload(&format!("c{n}")), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app.oneshot(get("/data")).await.unwrap();
    let body = body_json(response).await;
    let events = body.as_array().unwrap();

    assert_eq!(events.len(), 50);
    assert_eq!(events[0]["request_id"], "c59");
    assert_eq!(events[0]["id"], "60");
    assert_eq!(events[49]["request_id"], "c10");
}

#[tokio::test]
async fn test_data_is_cors_enabled() {
    let app = app_with_store(test_config(None), Arc::new(InMemoryEventStore::new()));

    let request = Request::builder()
        .uri("/data")
        .header(header::ORIGIN, "http://dashboard.example")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        "*"
    );
}

#[tokio::test]
async fn test_health_reports_storage_state() {
    let app = app_with_store(test_config(None), Arc::new(InMemoryEventStore::new()));
    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
    assert!(body.get("error").is_none());
    assert!(body["timestamp"].as_str().unwrap().ends_with('Z'));

    let app = app_with_store(test_config(None), Arc::new(UnavailableStore));
    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["status"], "unhealthy");
    assert_eq!(body["database"], "disconnected");
    assert!(body["error"].as_str().unwrap().contains("connection refused"));
}

#[tokio::test]
async fn test_root_serves_polling_page() {
    let app = app_with_store(test_config(None), Arc::new(InMemoryEventStore::new()));
    let response = app.oneshot(get("/")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .get(header::CONTENT_TYPE)
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("text/html")
    );
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("fetch(\"/data\")"));
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let store = Arc::new(InMemoryEventStore::new());
    let config = AppConfig {
        webhook_max_body_kb: 1,
        ..test_config(None)
    };
    let app = app_with_store(config, store.clone());

    let response = app
        .oneshot(webhook_request("push", vec![b' '; 4096], None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/problem+json"
    );
    let body = body_json(response).await;
    assert_eq!(body["code"], "PAYLOAD_TOO_LARGE");
    assert!(body["trace_id"].is_string());
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let app = app_with_store(test_config(None), Arc::new(InMemoryEventStore::new()));

    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "req-abc")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.headers().get("x-request-id").unwrap(), "req-abc");

    let response = app.oneshot(get("/health")).await.unwrap();
    assert!(response.headers().get("x-request-id").is_some());
}

#[tokio::test]
async fn test_error_body_carries_request_trace_id() {
    let app = app_with_store(test_config(Some(SECRET)), Arc::new(InMemoryEventStore::new()));

    let mut request = webhook_request("push", push_payload("abc123"), None);
    request
        .headers_mut()
        .insert("x-request-id", "trace-77".parse().unwrap());
    let response = app.oneshot(request).await.unwrap();

    let body = body_json(response).await;
    assert_eq!(body["trace_id"], "trace-77");
}

#[tokio::test]
async fn test_openapi_document_lists_routes() {
    let app = app_with_store(test_config(None), Arc::new(InMemoryEventStore::new()));
    let response = app.oneshot(get("/openapi.json")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    for path in ["/", "/webhook", "/data", "/health"] {
        assert!(body["paths"].get(path).is_some(), "missing {path}");
    }
}

#[tokio::test]
async fn test_unknown_route_is_problem_json_404() {
    let app = app_with_store(test_config(None), Arc::new(InMemoryEventStore::new()));
    let response = app.oneshot(get("/nope")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/problem+json"
    );
    assert_eq!(body_json(response).await["code"], "NOT_FOUND");
}
