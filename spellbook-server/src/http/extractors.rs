//! Custom Axum extractors
//!
//! Numeric path segments are validated here, before any handler runs, so a
//! malformed id never reaches the store.

use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;

use super::error::ApiError;
use crate::models::{parse_id, ClassId, SpellId, ValidationError};

/// Extract and validate a single numeric id from path
pub struct ValidId(pub i32);

impl<S> FromRequestParts<S> for ValidId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw): Path<String> = Path::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::InvalidParam(ValidationError::Empty { field: "id" }))?;

        Ok(Self(parse_id("id", &raw)?))
    }
}

/// `{class}/spells/{level}` pair
pub struct ClassLevel {
    pub class: ClassId,
    pub level: i32,
}

impl<S> FromRequestParts<S> for ClassLevel
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path((class, level)): Path<(String, String)> = Path::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::InvalidParam(ValidationError::Empty { field: "class" }))?;

        Ok(Self {
            class: parse_id("class", &class)?,
            level: parse_id("level", &level)?,
        })
    }
}

/// `{user}/spells/{spell}` pair; the user name is taken verbatim
pub struct UserSpell {
    pub user: String,
    pub spell: SpellId,
}

impl<S> FromRequestParts<S> for UserSpell
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path((user, spell)): Path<(String, String)> = Path::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::InvalidParam(ValidationError::Empty { field: "user" }))?;

        Ok(Self {
            user,
            spell: parse_id("spell", &spell)?,
        })
    }
}
