//! HTTP layer
//!
//! Axum server with:
//! - CORS allow-list (permissive only on request)
//! - Request tracing
//! - Graceful shutdown
//! - Path validation before any store access
//! - Store failures rendered per `ErrorMode`

pub mod error;
pub mod extractors;
pub mod routes;
pub mod server;

pub use error::{ApiError, Shape, StoreResultExt};
pub use server::{build_router, run_server};
