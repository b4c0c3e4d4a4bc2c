use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::Parser;
use migration::{Migrator, MigratorTrait};
use repo_events::{config::ConfigLoader, db, models::webhook_event};
use sea_orm::{ActiveModelTrait, NotSet, Set, TransactionTrait};

#[derive(Parser, Debug)]
#[command(author, version, about = "Verify repo-events configuration and database access")]
struct Cli {
    /// Directory containing the .env files
    #[arg(long, default_value = ".")]
    base_dir: PathBuf,
    /// Apply pending migrations before checking the table
    #[arg(long)]
    migrate: bool,
    /// Insert a probe row inside a transaction that is rolled back
    #[arg(long)]
    probe_write: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    println!("Checking configuration in {}", cli.base_dir.display());
    let config = ConfigLoader::with_base_dir(cli.base_dir.clone())
        .load()
        .context("loading configuration")?;
    println!("  profile: {}", config.profile);
    println!("  bind address: {}", config.api_bind_addr);
    match config.webhook_secret {
        Some(_) => println!("  webhook secret: configured"),
        None => println!("  webhook secret: NOT SET (signature verification disabled)"),
    }

    println!("Checking database");
    let db = db::init_pool(&config)
        .await
        .context("initializing database connection pool")?;
    db::health_check(&db).await?;
    println!("  connection: ok");

    if cli.migrate {
        Migrator::up(&db, None)
            .await
            .context("applying migrations")?;
        println!("  migrations: applied");
    }

    let pending = Migrator::get_pending_migrations(&db)
        .await
        .context("listing pending migrations")?;
    if !pending.is_empty() {
        bail!(
            "{} migration(s) pending; rerun with --migrate",
            pending.len()
        );
    }
    println!("  migrations: up to date");

    if cli.probe_write {
        let txn = db.begin().await.context("starting transaction")?;
        let probe = webhook_event::ActiveModel {
            id: NotSet,
            request_id: Set("setup-probe".to_string()),
            author: Set("check-setup".to_string()),
            action: Set("PUSH".to_string()),
            from_branch: Set("probe".to_string()),
            to_branch: Set("probe".to_string()),
            timestamp: Set("probe".to_string()),
            received_at: Set(Utc::now().into()),
        }
        .insert(&txn)
        .await
        .context("inserting probe row")?;
        txn.rollback().await.context("rolling back probe row")?;
        println!("  write probe: ok (row {} rolled back)", probe.id);
    }

    println!("Setup looks good");
    Ok(())
}
