//! Database migrations for the repo-events service.

pub use sea_orm_migration::prelude::*;

mod m2025_07_04_000001_create_webhook_events;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m2025_07_04_000001_create_webhook_events::Migration)]
    }
}
