//! API error types with IntoResponse
//!
//! Every response body is valid JSON. Malformed path parameters answer `{}`.
//! Store failures are always logged, then rendered according to `ErrorMode`:
//! lenient answers the endpoint's empty shape, strict answers an error body
//! with a 5xx status.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

use crate::config::ErrorMode;
use crate::db::DbError;
use crate::models::ValidationError;

/// Empty JSON shape an endpoint answers when it has nothing to return
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Object,
    Array,
}

impl Shape {
    pub fn empty(self) -> Value {
        match self {
            Self::Object => json!({}),
            Self::Array => json!([]),
        }
    }
}

/// API error type with automatic HTTP status mapping
#[derive(Debug)]
pub enum ApiError {
    /// Path parameter failed validation; the store was never called
    InvalidParam(ValidationError),

    /// The store failed while serving the request
    Store {
        source: DbError,
        shape: Shape,
        mode: ErrorMode,
    },
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::InvalidParam(e) => {
                tracing::debug!("Rejected path parameter: {}", e);
                (StatusCode::OK, Json(Shape::Object.empty())).into_response()
            }
            Self::Store {
                source,
                shape,
                mode,
            } => {
                tracing::error!(kind = source.kind(), "Store error: {}", source);
                match mode {
                    ErrorMode::Lenient => (StatusCode::OK, Json(shape.empty())).into_response(),
                    ErrorMode::Strict => strict_response(&source),
                }
            }
        }
    }
}

fn strict_response(source: &DbError) -> Response {
    let (status, message) = match source {
        DbError::Connection(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            "database unavailable".to_string(),
        ),
        DbError::Timeout { after, .. } => (
            StatusCode::GATEWAY_TIMEOUT,
            format!("query timed out after {} ms", after.as_millis()),
        ),
        DbError::Query { .. } | DbError::Decode { .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "an internal error occurred".to_string(),
        ),
    };

    let body = json!({
        "error": source.kind(),
        "message": message
    });
    (status, Json(body)).into_response()
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Self::InvalidParam(e)
    }
}

/// Attach the boundary's rendering choice to a store result.
pub trait StoreResultExt<T> {
    fn or_render(self, shape: Shape, mode: ErrorMode) -> Result<T, ApiError>;
}

impl<T> StoreResultExt<T> for Result<T, DbError> {
    fn or_render(self, shape: Shape, mode: ErrorMode) -> Result<T, ApiError> {
        self.map_err(|source| ApiError::Store {
            source,
            shape,
            mode,
        })
    }
}
