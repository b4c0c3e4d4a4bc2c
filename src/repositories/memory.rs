//! Process-local [`EventStore`] backing the router and ingest tests.

use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use super::{EventStore, StorageError, StoredEvent, StoredId};
use crate::normalization::NormalizedEvent;

#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    events: RwLock<Vec<StoredEvent>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.events.read().map(|events| events.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: T) -> StorageError {
    StorageError::Unavailable("in-memory store lock poisoned".to_string())
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn insert(&self, event: &NormalizedEvent) -> Result<StoredId, StorageError> {
        let mut events = self.events.write().map_err(poisoned)?;
        let id = StoredId(events.len() as i64 + 1);
        events.push(StoredEvent {
            id,
            event: event.clone(),
            received_at: Utc::now(),
        });
        Ok(id)
    }

    async fn recent(&self, limit: u64) -> Result<Vec<StoredEvent>, StorageError> {
        let events = self.events.read().map_err(poisoned)?;
        Ok(events
            .iter()
            .rev()
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    async fn ping(&self) -> Result<(), StorageError> {
        self.events.read().map(|_| ()).map_err(poisoned)
    }
}
