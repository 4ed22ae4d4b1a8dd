//! Spell endpoints

use axum::extract::{Query, State};
use axum::{routing::get, Json, Router};
use serde::Deserialize;

use crate::db::repos::SpellRepo;
use crate::http::error::{ApiError, Shape, StoreResultExt};
use crate::http::extractors::ValidId;
use crate::models::{OrEmpty, SpellAttributes, SpellId, SpellSummary};
use crate::state::AppState;

/// `?q=<text>&anywhere=1`
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub anywhere: Option<String>,
}

impl SearchParams {
    /// Only the literal `1` switches to substring matching.
    fn anywhere(&self) -> bool {
        self.anywhere.as_deref() == Some("1")
    }
}

/// GET /spells - every spell id
async fn list_ids(State(state): State<AppState>) -> Result<Json<Vec<SpellId>>, ApiError> {
    let ids = SpellRepo::new(state.store())
        .list_ids()
        .await
        .or_render(Shape::Array, state.settings().error_mode)?;
    Ok(Json(ids))
}

/// GET /spells/search
async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<SpellSummary>>, ApiError> {
    let hits = SpellRepo::new(state.store())
        .search(params.q.as_deref(), params.anywhere())
        .await
        .or_render(Shape::Array, state.settings().error_mode)?;
    Ok(Json(hits))
}

/// GET /spells/{spell}
async fn get_spell(
    State(state): State<AppState>,
    ValidId(id): ValidId,
) -> Result<Json<OrEmpty<SpellAttributes>>, ApiError> {
    let spell = SpellRepo::new(state.store())
        .attributes(id)
        .await
        .or_render(Shape::Object, state.settings().error_mode)?;
    Ok(Json(OrEmpty(spell)))
}

/// Spell routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/spells", get(list_ids))
        .route("/spells/search", get(search))
        .route("/spells/{spell}", get(get_spell))
}
