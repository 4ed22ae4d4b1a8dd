//! User endpoints
//!
//! User names are taken from the path verbatim and matched case-insensitively.

use axum::extract::{Path, State};
use axum::routing::{delete, get, post};
use axum::{Json, Router};

use crate::db::repos::UserRepo;
use crate::http::error::{ApiError, Shape, StoreResultExt};
use crate::http::extractors::UserSpell;
use crate::models::{OrEmpty, User, UserSpells};
use crate::state::AppState;

/// GET /users - every user name
async fn list_names(State(state): State<AppState>) -> Result<Json<Vec<String>>, ApiError> {
    let names = UserRepo::new(state.store())
        .list_names()
        .await
        .or_render(Shape::Array, state.settings().error_mode)?;
    Ok(Json(names))
}

/// GET /users/{user}
async fn get_user(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<OrEmpty<User>>, ApiError> {
    let user = UserRepo::new(state.store())
        .find(&name)
        .await
        .or_render(Shape::Object, state.settings().error_mode)?;
    Ok(Json(OrEmpty(user)))
}

/// POST /users/{user} - create with an empty list, or return the existing user
async fn get_or_create(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<UserSpells>, ApiError> {
    let user = UserRepo::new(state.store())
        .get_or_create(&name)
        .await
        .or_render(Shape::Object, state.settings().error_mode)?;
    Ok(Json(user))
}

/// DELETE /users/{user}/spells - wipe the list
async fn reset_spells(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<UserSpells>, ApiError> {
    let user = UserRepo::new(state.store())
        .reset_spells(&name)
        .await
        .or_render(Shape::Object, state.settings().error_mode)?;
    Ok(Json(user))
}

/// POST /users/{user}/spells/{spell}
async fn add_spell(
    State(state): State<AppState>,
    UserSpell { user, spell }: UserSpell,
) -> Result<Json<OrEmpty<UserSpells>>, ApiError> {
    let edited = UserRepo::new(state.store())
        .add_spell(&user, spell)
        .await
        .or_render(Shape::Object, state.settings().error_mode)?;
    Ok(Json(OrEmpty(edited)))
}

/// DELETE /users/{user}/spells/{spell}
async fn remove_spell(
    State(state): State<AppState>,
    UserSpell { user, spell }: UserSpell,
) -> Result<Json<OrEmpty<UserSpells>>, ApiError> {
    let edited = UserRepo::new(state.store())
        .remove_spell(&user, spell)
        .await
        .or_render(Shape::Object, state.settings().error_mode)?;
    Ok(Json(OrEmpty(edited)))
}

/// User routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_names))
        .route("/users/{user}", get(get_user).post(get_or_create))
        .route("/users/{user}/spells", delete(reset_spells))
        .route(
            "/users/{user}/spells/{spell}",
            post(add_spell).delete(remove_spell),
        )
}
