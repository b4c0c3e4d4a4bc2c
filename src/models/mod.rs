//! # Data Models
//!
//! SeaORM entities backing the event store.

pub mod webhook_event;

pub use webhook_event::Entity as WebhookEvent;
