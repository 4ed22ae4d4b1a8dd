//! Error types for spellbook-server

use thiserror::Error;

use crate::config::ConfigError;

pub type Result<T> = std::result::Result<T, ServerError>;

/// Startup and serving failures
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_converts() {
        let err: ServerError = ConfigError::MissingDatabaseUrl.into();
        assert_eq!(err.to_string(), "Configuration error: DATABASE_URL not set");
    }
}
