//! Axum server setup
//!
//! Server skeleton with:
//! - CORS allow-list from config (permissive only when asked)
//! - Tracing middleware
//! - Graceful shutdown on SIGTERM/Ctrl+C

use axum::http::Method;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::routes;
use crate::config::{ConfigError, CorsConfig, ServerConfig};
use crate::error::Result;
use crate::state::AppState;

/// Build the CORS layer for the configured origins.
pub fn cors_layer(config: &CorsConfig) -> std::result::Result<CorsLayer, ConfigError> {
    if config.permissive {
        tracing::warn!("CORS: Permissive mode enabled - all origins allowed");
        return Ok(CorsLayer::permissive());
    }

    let origins = config.origin_headers()?;
    tracing::debug!(origins = ?config.origins, "CORS allow-list");
    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers(Any))
}

/// Build the application router with all routes
pub fn build_router(state: AppState, cors: &CorsConfig) -> std::result::Result<Router, ConfigError> {
    let app = Router::new()
        .merge(routes::health::router())
        .merge(routes::classes::router())
        .merge(routes::spells::router())
        .merge(routes::users::router())
        .layer(cors_layer(cors)?)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}

/// Run the HTTP server until a shutdown signal arrives.
pub async fn run_server(state: AppState, config: &ServerConfig) -> Result<()> {
    let app = build_router(state, &config.cors)?;

    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
///
/// If a handler cannot be installed that branch never fires; the other one
/// still can.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting shutdown");
        }
    }
}
