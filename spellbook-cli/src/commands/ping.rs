//! Database connectivity check

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use spellbook_server::db::create_pool_with_options;
use spellbook_server::{PgStore, Settings, SpellStore};

/// Arguments for the ping command
#[derive(Parser, Debug)]
pub struct PingArgs {
    /// Database URL (overrides config/environment)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Config file (default: ~/.spellbook/config.toml when present)
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,
}

/// Connect once and run a trivial statement
pub async fn run_ping(args: PingArgs) -> Result<()> {
    let mut settings =
        Settings::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(url) = args.database_url.filter(|url| !url.is_empty()) {
        settings.database.url = Some(url);
    }

    let url = settings
        .database
        .require_url()
        .context("DATABASE_URL not set. Set via --database-url, DATABASE_URL env, .env, or config file")?;

    let pool = create_pool_with_options(
        url,
        1,
        std::time::Duration::from_secs(settings.database.acquire_timeout_secs),
    )
    .await
    .context("Failed to create database pool")?;

    let store = PgStore::with_timeout(pool, settings.database.query_timeout());
    store.ping().await.context("Database ping failed")?;

    println!("database ok");
    Ok(())
}
