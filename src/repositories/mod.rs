//! # Repository Layer
//!
//! The [`EventStore`] capability plus its SeaORM and in-memory implementations.
//! Handlers only ever see `Arc<dyn EventStore>`.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::normalization::NormalizedEvent;

pub mod memory;
pub mod webhook_event;

pub use memory::InMemoryEventStore;
pub use webhook_event::WebhookEventRepository;

/// Number of records returned by the recent-events query.
pub const RECENT_EVENTS_LIMIT: u64 = 50;

/// Identifier assigned by the store. Larger ids were stored later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StoredId(pub i64);

impl fmt::Display for StoredId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A normalized event as read back from storage.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEvent {
    pub id: StoredId,
    pub event: NormalizedEvent,
    pub received_at: DateTime<Utc>,
}

/// Storage failures surfaced to the ingestion and query paths.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),
    #[error("stored record {id} is invalid: {reason}")]
    InvalidRecord { id: i64, reason: String },
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Append-only store for normalized events.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Persist one record and return its identifier.
    async fn insert(&self, event: &NormalizedEvent) -> Result<StoredId, StorageError>;

    /// Up to `limit` records, newest first.
    async fn recent(&self, limit: u64) -> Result<Vec<StoredEvent>, StorageError>;

    /// Cheap reachability probe used by the health endpoint.
    async fn ping(&self) -> Result<(), StorageError>;
}
