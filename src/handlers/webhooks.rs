//! # Webhook Handlers
//!
//! `POST /webhook` adapts headers and the raw body into a [`WebhookDelivery`].
//! The body is kept as bytes because the signature covers the exact payload.

use axum::{
    body::Bytes,
    extract::{State, rejection::BytesRejection},
    http::HeaderMap,
    response::Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::ingest::{IngestOutcome, WebhookDelivery};
use crate::server::AppState;
use crate::webhook_verification::SIGNATURE_HEADER;

/// Event-type tag header
pub const EVENT_HEADER: &str = "X-GitHub-Event";

/// Per-delivery GUID header
pub const DELIVERY_HEADER: &str = "X-GitHub-Delivery";

/// Webhook acknowledgement
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WebhookResponse {
    pub message: String,
    /// Identifier of the stored record, absent when nothing was stored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl From<IngestOutcome> for WebhookResponse {
    fn from(outcome: IngestOutcome) -> Self {
        match outcome {
            IngestOutcome::Stored { id } => Self {
                message: "Webhook processed successfully".to_string(),
                id: Some(id.to_string()),
            },
            IngestOutcome::Unsupported { .. } => Self {
                message: "Event type not supported".to_string(),
                id: None,
            },
        }
    }
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

/// Receive a GitHub webhook delivery
#[utoipa::path(
    post,
    path = "/webhook",
    params(
        ("X-Hub-Signature-256" = Option<String>, Header, description = "HMAC-SHA256 of the body as `sha256=<hex>`; required when a secret is configured"),
        ("X-GitHub-Event" = Option<String>, Header, description = "Event type; `push` and `pull_request` are recorded"),
        ("X-GitHub-Delivery" = Option<String>, Header, description = "Delivery GUID, used for logging")
    ),
    request_body(content = Option<JsonValue>, description = "GitHub webhook payload", content_type = "application/json"),
    responses(
        (status = 200, description = "Event stored, or event type ignored", body = WebhookResponse),
        (status = 400, description = "Payload could not be normalized", body = ApiError),
        (status = 401, description = "Missing or invalid signature", body = ApiError),
        (status = 413, description = "Body exceeds the configured limit", body = ApiError),
        (status = 500, description = "Event could not be stored", body = ApiError)
    ),
    tag = "webhooks"
)]
pub async fn receive_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<WebhookResponse>, ApiError> {
    let body = body?;
    let delivery = WebhookDelivery {
        body,
        signature: header_value(&headers, SIGNATURE_HEADER),
        event_type: header_value(&headers, EVENT_HEADER),
        delivery_id: header_value(&headers, DELIVERY_HEADER),
    };

    let outcome = state.ingestor.ingest(delivery).await?;

    Ok(Json(outcome.into()))
}
