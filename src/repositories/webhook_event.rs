//! # Webhook Event Repository
//!
//! SeaORM-backed [`EventStore`] over the `webhook_events` table.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue::NotSet, DatabaseConnection, EntityTrait, QueryOrder, QuerySelect, Set};
use tracing::debug;

use super::{EventStore, StorageError, StoredEvent, StoredId};
use crate::db;
use crate::models::webhook_event::{self, Entity as WebhookEvent};
use crate::normalization::{EventAction, NormalizedEvent};

/// Repository for webhook event database operations
#[derive(Debug, Clone)]
pub struct WebhookEventRepository {
    /// Database connection pool
    pub db: Arc<DatabaseConnection>,
}

impl WebhookEventRepository {
    /// Creates a new WebhookEventRepository instance
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl EventStore for WebhookEventRepository {
    async fn insert(&self, event: &NormalizedEvent) -> Result<StoredId, StorageError> {
        let row = webhook_event::ActiveModel {
            id: NotSet,
            request_id: Set(event.request_id.clone()),
            author: Set(event.author.clone()),
            action: Set(event.action.as_str().to_string()),
            from_branch: Set(event.from_branch.clone()),
            to_branch: Set(event.to_branch.clone()),
            timestamp: Set(event.timestamp.clone()),
            received_at: Set(Utc::now().into()),
        };

        let result = WebhookEvent::insert(row).exec(&*self.db).await?;
        debug!(id = result.last_insert_id, "Inserted webhook event");

        Ok(StoredId(result.last_insert_id))
    }

    async fn recent(&self, limit: u64) -> Result<Vec<StoredEvent>, StorageError> {
        let rows = WebhookEvent::find()
            .order_by_desc(webhook_event::Column::Id)
            .limit(limit)
            .all(&*self.db)
            .await?;

        rows.into_iter().map(into_stored_event).collect()
    }

    async fn ping(&self) -> Result<(), StorageError> {
        db::health_check(&self.db)
            .await
            .map_err(|err| StorageError::Unavailable(format!("{err:#}")))
    }
}

fn into_stored_event(row: webhook_event::Model) -> Result<StoredEvent, StorageError> {
    let action = EventAction::parse(&row.action).ok_or_else(|| StorageError::InvalidRecord {
        id: row.id,
        reason: format!("unknown action '{}'", row.action),
    })?;

    Ok(StoredEvent {
        id: StoredId(row.id),
        event: NormalizedEvent {
            request_id: row.request_id,
            author: row.author,
            action,
            from_branch: row.from_branch,
            to_branch: row.to_branch,
            timestamp: row.timestamp,
        },
        received_at: DateTime::<Utc>::from(row.received_at),
    })
}
