//! Migration to create the webhook_events table.
//!
//! Each row is one normalized repository event. The auto-increment `id` doubles as the
//! insertion order used by the recent-events feed.

use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Statement;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(WebhookEvents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WebhookEvents::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(WebhookEvents::RequestId).text().not_null())
                    .col(ColumnDef::new(WebhookEvents::Author).text().not_null())
                    .col(ColumnDef::new(WebhookEvents::Action).text().not_null())
                    .col(ColumnDef::new(WebhookEvents::FromBranch).text().not_null())
                    .col(ColumnDef::new(WebhookEvents::ToBranch).text().not_null())
                    .col(ColumnDef::new(WebhookEvents::Timestamp).text().not_null())
                    .col(
                        ColumnDef::new(WebhookEvents::ReceivedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Lookups by originating commit / pull request id
        manager
            .get_connection()
            .execute(Statement::from_string(
                manager.get_database_backend(),
                "CREATE INDEX IF NOT EXISTS idx_webhook_events_action_request ON webhook_events (action, request_id)".to_string(),
            ))
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_webhook_events_action_request")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(WebhookEvents::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum WebhookEvents {
    Table,
    Id,
    RequestId,
    Author,
    Action,
    FromBranch,
    ToBranch,
    Timestamp,
    ReceivedAt,
}
