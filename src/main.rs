//! # Repo Events Main Entry Point
//!
//! Loads configuration, connects to storage, applies migrations, and serves.

use std::sync::Arc;

use migration::{Migrator, MigratorTrait};
use repo_events::{
    config::ConfigLoader,
    db::init_pool,
    repositories::WebhookEventRepository,
    server::{AppState, run_server},
    telemetry::init_tracing,
};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration from layered env files and variables
    let config = ConfigLoader::new().load()?;

    init_tracing(&config)?;

    info!(profile = %config.profile, "Loaded configuration");
    if let Ok(redacted_json) = config.redacted_json() {
        info!(configuration = %redacted_json, "Effective configuration");
    }

    if config.webhook_secret.is_none() {
        if config.is_dev_profile() {
            info!("Webhook secret not set; signature verification disabled");
        } else {
            warn!(
                profile = %config.profile,
                "Webhook secret not set; accepting unsigned deliveries"
            );
        }
    }

    let db = init_pool(&config).await?;
    Migrator::up(&db, None).await?;
    info!("Database migrations applied");

    let store = Arc::new(WebhookEventRepository::new(Arc::new(db)));
    let state = AppState::new(config, store);

    run_server(state).await
}
