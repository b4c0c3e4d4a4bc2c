//! Webhook event entity model
//!
//! SeaORM entity for the `webhook_events` table, one row per normalized delivery.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "webhook_events")]
pub struct Model {
    /// Auto-increment key; ordering by it gives insertion order
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Commit id (push) or pull request id
    pub request_id: String,

    pub author: String,

    /// `PUSH`, `PULL_REQUEST` or `MERGE`
    pub action: String,

    pub from_branch: String,

    pub to_branch: String,

    /// Display-formatted event time
    pub timestamp: String,

    /// When the row was written
    pub received_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
