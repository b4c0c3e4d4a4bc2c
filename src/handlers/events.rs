//! # Event Feed Handlers

use axum::{extract::State, response::Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::normalization::EventAction;
use crate::repositories::{RECENT_EVENTS_LIMIT, StoredEvent};
use crate::server::AppState;

/// A stored event as returned by `/data`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EventResponse {
    /// Storage identifier
    #[schema(example = "17")]
    pub id: String,
    #[schema(example = "abc123")]
    pub request_id: String,
    #[schema(example = "alice")]
    pub author: String,
    pub action: EventAction,
    #[schema(example = "feature-x")]
    pub from_branch: String,
    #[schema(example = "main")]
    pub to_branch: String,
    #[schema(example = "1st April 2021 - 09:30 PM UTC")]
    pub timestamp: String,
}

impl From<StoredEvent> for EventResponse {
    fn from(stored: StoredEvent) -> Self {
        let event = stored.event;
        Self {
            id: stored.id.to_string(),
            request_id: event.request_id,
            author: event.author,
            action: event.action,
            from_branch: event.from_branch,
            to_branch: event.to_branch,
            timestamp: event.timestamp,
        }
    }
}

/// List the 50 most recent events, newest first
#[utoipa::path(
    get,
    path = "/data",
    responses(
        (status = 200, description = "Most recent events, newest first", body = [EventResponse]),
        (status = 500, description = "Events could not be read", body = ApiError)
    ),
    tag = "events"
)]
pub async fn list_recent_events(
    State(state): State<AppState>,
) -> Result<Json<Vec<EventResponse>>, ApiError> {
    let events = state.store.recent(RECENT_EVENTS_LIMIT).await?;

    Ok(Json(events.into_iter().map(EventResponse::from).collect()))
}
