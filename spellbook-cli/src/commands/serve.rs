//! HTTP server command
//!
//! Settings are layered: config file, then environment, then these flags.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use spellbook_server::{ErrorMode, FanInPolicy, Settings};

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to (default: 127.0.0.1:3000)
    #[arg(long, short = 'b')]
    pub bind: Option<SocketAddr>,

    /// Database URL (overrides config/environment)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Config file (default: ~/.spellbook/config.toml when present)
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Allow permissive CORS (all origins) - use with caution
    #[arg(long)]
    pub cors_permissive: bool,

    /// How store failures are rendered: lenient or strict
    #[arg(long)]
    pub error_mode: Option<ErrorMode>,

    /// What a failed class lookup does to the aggregates: degrade or fail-fast
    #[arg(long)]
    pub fan_in: Option<FanInPolicy>,

    /// Maximum pooled connections
    #[arg(long)]
    pub max_connections: Option<u32>,

    /// Per-statement timeout in milliseconds
    #[arg(long)]
    pub query_timeout_ms: Option<u64>,
}

impl ServeArgs {
    /// Layer command-line overrides on top of loaded settings.
    pub fn apply(self, settings: &mut Settings) {
        if let Some(bind) = self.bind {
            settings.server.bind_addr = bind;
        }
        if let Some(url) = self.database_url.filter(|url| !url.is_empty()) {
            settings.database.url = Some(url);
        }
        if self.cors_permissive {
            settings.server.cors.permissive = true;
        }
        if let Some(mode) = self.error_mode {
            settings.api.error_mode = mode;
        }
        if let Some(policy) = self.fan_in {
            settings.api.fan_in = policy;
        }
        if let Some(max) = self.max_connections {
            settings.database.max_connections = max;
            settings.api.max_in_flight = max as usize;
        }
        if let Some(ms) = self.query_timeout_ms {
            settings.database.query_timeout_ms = ms;
        }
    }
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs) -> Result<()> {
    let mut settings =
        Settings::load(args.config.as_deref()).context("Failed to load configuration")?;
    args.apply(&mut settings);

    settings.database.require_url().context(
        "DATABASE_URL not set. Set via --database-url, DATABASE_URL env, .env, or config file",
    )?;

    tracing::info!("Starting spellbook server on {}", settings.server.bind_addr);

    // Run server (blocks until shutdown)
    spellbook_server::serve(settings)
        .await
        .context("Server error")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_settings() {
        let args = ServeArgs::parse_from([
            "serve",
            "--bind",
            "0.0.0.0:8080",
            "--error-mode",
            "strict",
            "--fan-in",
            "fail-fast",
            "--max-connections",
            "4",
            "--database-url",
            "postgres://localhost/dnd",
        ]);

        let mut settings = Settings::default();
        args.apply(&mut settings);

        assert_eq!(settings.server.bind_addr.port(), 8080);
        assert_eq!(settings.api.error_mode, ErrorMode::Strict);
        assert_eq!(settings.api.fan_in, FanInPolicy::FailFast);
        assert_eq!(settings.database.max_connections, 4);
        assert_eq!(settings.api.max_in_flight, 4);
        assert_eq!(
            settings.database.url.as_deref(),
            Some("postgres://localhost/dnd")
        );
    }

    #[test]
    fn no_flags_keep_settings() {
        let args = ServeArgs::parse_from(["serve", "--database-url", ""]);
        let mut settings = Settings::default();
        args.apply(&mut settings);

        assert_eq!(settings.server.bind_addr.port(), 3000);
        assert_eq!(settings.api.error_mode, ErrorMode::Lenient);
        assert!(settings.database.url.is_none());
    }
}
