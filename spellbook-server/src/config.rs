//! Server configuration
//!
//! Sources, lowest to highest priority:
//! 1. Built-in defaults
//! 2. TOML file (`--config`, or `~/.spellbook/config.toml` when present)
//! 3. Environment (`DATABASE_URL`)
//! 4. Command-line flags, applied by the binary
//!
//! Example `config.toml`:
//!
//! ```toml
//! [server]
//! bind_addr = "0.0.0.0:3000"
//!
//! [server.cors]
//! origins = ["http://localhost:4200"]
//!
//! [database]
//! max_connections = 25
//! query_timeout_ms = 5000
//!
//! [api]
//! error_mode = "lenient"
//! fan_in = "degrade"
//! ```

use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use axum::http::HeaderValue;
use serde::{Deserialize, Serialize};

use crate::db::aggregate::{FanInPolicy, DEFAULT_MAX_IN_FLIGHT};
use crate::db::pool::{DEFAULT_ACQUIRE_TIMEOUT, DEFAULT_MAX_CONNECTIONS};
use crate::db::postgres::DEFAULT_QUERY_TIMEOUT;

/// Origins allowed by default: the local frontend plus the production sites.
const DEFAULT_ORIGINS: &[&str] = &[
    "http://dnd.dsierra.io",
    "http://dsierra.io",
    "http://localhost:4200",
];

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value for {field}: '{value}'")]
    Invalid { field: &'static str, value: String },

    #[error("DATABASE_URL not set")]
    MissingDatabaseUrl,
}

impl ConfigError {
    pub fn invalid(field: &'static str, value: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            value: value.into(),
        }
    }
}

/// How store failures are rendered to HTTP clients
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorMode {
    /// Log the failure, answer the endpoint's empty shape (`{}` or `[]`) with 200
    #[default]
    Lenient,
    /// Log the failure, answer a JSON error body with a 5xx status
    Strict,
}

impl fmt::Display for ErrorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Lenient => "lenient",
            Self::Strict => "strict",
        })
    }
}

impl FromStr for ErrorMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lenient" => Ok(Self::Lenient),
            "strict" => Ok(Self::Strict),
            other => Err(ConfigError::invalid("error_mode", other)),
        }
    }
}

/// Top-level settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub api: ApiSettings,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (default: 127.0.0.1:3000)
    pub bind_addr: SocketAddr,

    pub cors: CorsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            cors: CorsConfig::default(),
        }
    }
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Allow any origin
    ///
    /// WARNING: only for development.
    pub permissive: bool,

    /// Allowed origins when not permissive
    pub origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            permissive: false,
            origins: DEFAULT_ORIGINS.iter().map(|o| o.to_string()).collect(),
        }
    }
}

impl CorsConfig {
    /// Parse configured origins into header values.
    pub fn origin_headers(&self) -> Result<Vec<HeaderValue>, ConfigError> {
        self.origins
            .iter()
            .map(|origin| {
                HeaderValue::from_str(origin).map_err(|_| ConfigError::invalid("cors.origins", origin))
            })
            .collect()
    }
}

/// Connection pool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Connection string; usually supplied through `DATABASE_URL`
    pub url: Option<String>,

    pub max_connections: u32,

    pub acquire_timeout_secs: u64,

    /// Per-statement timeout
    pub query_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_timeout_secs: DEFAULT_ACQUIRE_TIMEOUT.as_secs(),
            query_timeout_ms: DEFAULT_QUERY_TIMEOUT.as_millis() as u64,
        }
    }
}

impl DatabaseConfig {
    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }

    /// The configured connection string, or an error if none was supplied.
    pub fn require_url(&self) -> Result<&str, ConfigError> {
        self.url
            .as_deref()
            .filter(|url| !url.is_empty())
            .ok_or(ConfigError::MissingDatabaseUrl)
    }
}

/// Behavior of the HTTP boundary
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    pub error_mode: ErrorMode,

    pub fan_in: FanInPolicy,

    /// Class lookups in flight at once for the aggregate endpoints
    pub max_in_flight: usize,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            error_mode: ErrorMode::default(),
            fan_in: FanInPolicy::default(),
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }
}

impl Settings {
    /// Default config file location (~/.spellbook/config.toml)
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".spellbook").join("config.toml"))
    }

    /// Load settings from `path`, or from the default location if it exists,
    /// then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(path) => Self::from_file(&path)?,
                None => {
                    tracing::debug!("no config file found, using defaults");
                    Self::default()
                }
            },
        };

        settings.apply_env();
        Ok(settings)
    }

    /// Parse a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        let settings = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })?;
        tracing::info!(path = %path.display(), "loaded config file");
        Ok(settings)
    }

    /// Environment overrides: `DATABASE_URL` replaces the configured url.
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("DATABASE_URL") {
            if !url.is_empty() {
                self.database.url = Some(url);
            }
        }
    }
}
