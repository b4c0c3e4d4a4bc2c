//! Webhook ingestion pipeline: verify, normalize, persist.
//!
//! Transport-agnostic so the HTTP handler stays a thin header/body adapter.

use std::sync::Arc;

use axum::body::Bytes;
use metrics::counter;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::normalization::{EventType, NormalizationError, normalize_event};
use crate::repositories::{EventStore, StorageError, StoredId};
use crate::webhook_verification::verify_github_signature;

/// One inbound delivery as received on the wire.
#[derive(Debug, Clone, Default)]
pub struct WebhookDelivery {
    /// Raw request body, exactly as signed by the sender
    pub body: Bytes,
    /// `X-Hub-Signature-256`
    pub signature: Option<String>,
    /// `X-GitHub-Event`
    pub event_type: Option<String>,
    /// `X-GitHub-Delivery`, logged only
    pub delivery_id: Option<String>,
}

/// Successful handling of a delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    Stored { id: StoredId },
    /// Event type is not one we record; nothing was persisted
    Unsupported { event_type: String },
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("webhook signature rejected")]
    Unauthorized,
    #[error("malformed payload: {0}")]
    MalformedPayload(#[from] NormalizationError),
    #[error("failed to store event: {0}")]
    Storage(#[from] StorageError),
}

impl IngestError {
    /// Label for the rejection counter.
    pub fn reason(&self) -> &'static str {
        match self {
            IngestError::Unauthorized => "unauthorized",
            IngestError::MalformedPayload(_) => "malformed_payload",
            IngestError::Storage(_) => "storage",
        }
    }
}

/// Runs deliveries through verification, normalization and storage.
pub struct WebhookIngestor {
    store: Arc<dyn EventStore>,
    secret: String,
}

impl WebhookIngestor {
    /// An empty `secret` disables signature verification.
    pub fn new(store: Arc<dyn EventStore>, secret: impl Into<String>) -> Self {
        Self {
            store,
            secret: secret.into(),
        }
    }

    pub fn verification_enabled(&self) -> bool {
        !self.secret.is_empty()
    }

    pub async fn ingest(&self, delivery: WebhookDelivery) -> Result<IngestOutcome, IngestError> {
        let result = self.process(&delivery).await;
        if let Err(err) = &result {
            counter!("webhook_events_rejected_total", "reason" => err.reason()).increment(1);
        }
        result
    }

    async fn process(&self, delivery: &WebhookDelivery) -> Result<IngestOutcome, IngestError> {
        let delivery_id = delivery.delivery_id.as_deref().unwrap_or("-");
        let event_type = delivery.event_type.as_deref().unwrap_or("");

        counter!(
            "webhook_deliveries_total",
            "event_type" => EventType::parse(event_type).map_or("other", EventType::as_str)
        )
        .increment(1);

        if self.verification_enabled() {
            if let Err(err) =
                verify_github_signature(&delivery.body, delivery.signature.as_deref(), &self.secret)
            {
                counter!("webhook_signature_failures_total").increment(1);
                warn!(
                    delivery_id,
                    event_type,
                    reason = err.reason(),
                    error = %err,
                    "Rejected webhook with invalid signature"
                );
                return Err(IngestError::Unauthorized);
            }
        } else {
            debug!(delivery_id, "Signature verification disabled");
        }

        let Some(event) = normalize_event(event_type, &delivery.body)? else {
            info!(delivery_id, event_type, "Ignoring unsupported webhook event");
            return Ok(IngestOutcome::Unsupported {
                event_type: event_type.to_string(),
            });
        };

        let id = self.store.insert(&event).await.inspect_err(|err| {
            warn!(delivery_id, error = %err, "Failed to store webhook event");
        })?;

        counter!("webhook_events_stored_total", "action" => event.action.as_str()).increment(1);
        info!(
            delivery_id,
            id = %id,
            action = %event.action,
            request_id = %event.request_id,
            author = %event.author,
            "Stored webhook event"
        );

        Ok(IngestOutcome::Stored { id })
    }
}
