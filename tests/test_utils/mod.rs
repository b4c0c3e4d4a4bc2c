//! Test utilities for database testing.
//!
//! Sets up in-memory SQLite databases with migrations applied and builds
//! routers over them.

use anyhow::Result;
use migration::{Migrator, MigratorTrait};
use repo_events::{
    config::AppConfig,
    repositories::WebhookEventRepository,
    server::{AppState, create_app},
};
use sea_orm::{Database, DatabaseConnection};
use std::sync::Arc;

/// Sets up an in-memory SQLite database with all migrations applied.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:").await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

/// Builds the application router over a fresh migrated database.
///
/// Returns the router and the repository so tests can inspect what was stored.
#[allow(dead_code)]
pub async fn setup_test_app(
    webhook_secret: Option<&str>,
) -> Result<(axum::Router, Arc<WebhookEventRepository>)> {
    let db = setup_test_db().await?;
    let repository = Arc::new(WebhookEventRepository::new(Arc::new(db)));
    let config = AppConfig {
        profile: "test".to_string(),
        webhook_secret: webhook_secret.map(str::to_string),
        ..Default::default()
    };
    let app = create_app(AppState::new(config, repository.clone()));
    Ok((app, repository))
}
