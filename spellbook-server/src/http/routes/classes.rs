//! Class endpoints

use std::collections::BTreeMap;

use axum::extract::State;
use axum::{routing::get, Json, Router};

use crate::db::repos::ClassRepo;
use crate::db::{all_classes_with_attributes, class_summaries};
use crate::http::error::{ApiError, Shape, StoreResultExt};
use crate::http::extractors::{ClassLevel, ValidId};
use crate::models::{ClassAttributes, ClassId, ClassSummary, OrEmpty, SpellId};
use crate::state::AppState;

/// GET /classes - every class id
async fn list_ids(State(state): State<AppState>) -> Result<Json<Vec<ClassId>>, ApiError> {
    let ids = ClassRepo::new(state.store())
        .list_ids()
        .await
        .or_render(Shape::Array, state.settings().error_mode)?;
    Ok(Json(ids))
}

/// GET /classes/all - every class keyed by id
async fn all_by_id(
    State(state): State<AppState>,
) -> Result<Json<BTreeMap<ClassId, OrEmpty<ClassAttributes>>>, ApiError> {
    let api = state.settings();
    let classes = all_classes_with_attributes(state.store(), api.fan_in, api.max_in_flight)
        .await
        .or_render(Shape::Object, api.error_mode)?;

    Ok(Json(
        classes
            .into_iter()
            .map(|(id, attributes)| (id, OrEmpty(attributes)))
            .collect(),
    ))
}

/// GET /classes/all2 - every class as `{id, name}`
async fn all_as_list(State(state): State<AppState>) -> Result<Json<Vec<ClassSummary>>, ApiError> {
    let api = state.settings();
    let summaries = class_summaries(state.store(), api.fan_in, api.max_in_flight)
        .await
        .or_render(Shape::Array, api.error_mode)?;
    Ok(Json(summaries))
}

/// GET /classes/{class}
async fn get_class(
    State(state): State<AppState>,
    ValidId(id): ValidId,
) -> Result<Json<OrEmpty<ClassAttributes>>, ApiError> {
    let lookup = ClassRepo::new(state.store())
        .attributes(id)
        .await
        .or_render(Shape::Object, state.settings().error_mode)?;
    Ok(Json(OrEmpty(lookup.attributes)))
}

/// GET /classes/{class}/spells - levels at which the class gains spells
async fn spell_levels(
    State(state): State<AppState>,
    ValidId(id): ValidId,
) -> Result<Json<Vec<i32>>, ApiError> {
    let levels = ClassRepo::new(state.store())
        .spell_levels(id)
        .await
        .or_render(Shape::Array, state.settings().error_mode)?;
    Ok(Json(levels))
}

/// GET /classes/{class}/spells/{level}
async fn spells_at_level(
    State(state): State<AppState>,
    ClassLevel { class, level }: ClassLevel,
) -> Result<Json<Vec<SpellId>>, ApiError> {
    let spells = ClassRepo::new(state.store())
        .spells_at_level(class, level)
        .await
        .or_render(Shape::Array, state.settings().error_mode)?;
    Ok(Json(spells))
}

/// GET /classes/{class}/spells/{level}/upto
async fn spells_up_to_level(
    State(state): State<AppState>,
    ClassLevel { class, level }: ClassLevel,
) -> Result<Json<Vec<SpellId>>, ApiError> {
    let spells = ClassRepo::new(state.store())
        .spells_up_to_level(class, level)
        .await
        .or_render(Shape::Array, state.settings().error_mode)?;
    Ok(Json(spells))
}

/// Class routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/classes", get(list_ids))
        .route("/classes/all", get(all_by_id))
        .route("/classes/all2", get(all_as_list))
        .route("/classes/{class}", get(get_class))
        .route("/classes/{class}/spells", get(spell_levels))
        .route("/classes/{class}/spells/{level}", get(spells_at_level))
        .route("/classes/{class}/spells/{level}/upto", get(spells_up_to_level))
}
