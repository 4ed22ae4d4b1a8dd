//! spellbook-server: JSON query API over classes, spells and per-user spell lists
//!
//! The data layer (`db`) owns every store access behind the `SpellStore`
//! trait; the HTTP layer (`http`) validates path input and renders results.

pub mod config;
pub mod db;
pub mod error;
pub mod http;
pub mod models;
pub mod state;

use std::sync::Arc;

pub use config::{ApiSettings, ConfigError, ErrorMode, Settings};
pub use db::{FanInPolicy, MemoryStore, PgStore, SpellStore};
pub use error::{Result, ServerError};
pub use http::{build_router, run_server};
pub use state::AppState;

/// Connect to Postgres and serve until shutdown.
///
/// # Example
///
/// ```ignore
/// let settings = Settings::load(None)?;
/// spellbook_server::serve(settings).await?;
/// ```
pub async fn serve(settings: Settings) -> Result<()> {
    let url = settings.database.require_url()?;
    let pool = db::pool::create_pool_from_config(url, &settings.database).await?;
    let store = PgStore::with_timeout(pool, settings.database.query_timeout());

    tracing::info!(
        error_mode = %settings.api.error_mode,
        fan_in = %settings.api.fan_in,
        max_in_flight = settings.api.max_in_flight,
        "API settings"
    );

    let state = AppState::new(Arc::new(store), settings.api);
    run_server(state, &settings.server).await
}
