use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, GenreDto, Page, resolve_page};
use crate::api::auth::MaybeUser;
use crate::api::permissions::require_admin;
use crate::api::validation::{validate_name, validate_slug};
use crate::db::is_unique_violation;

#[derive(Deserialize)]
pub struct GenreListQuery {
    pub search: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[derive(Deserialize)]
pub struct CreateGenreRequest {
    pub name: String,
    pub slug: String,
}

pub async fn list_genres(
    State(state): State<Arc<AppState>>,
    Query(query): Query<GenreListQuery>,
) -> Result<Json<ApiResponse<Page<GenreDto>>>, ApiError> {
    let (limit, offset) = resolve_page(query.limit, query.offset);
    let (rows, count) = state
        .store()
        .list_genres(query.search.as_deref(), limit, offset)
        .await?;

    Ok(Json(ApiResponse::success(Page {
        count,
        results: rows.into_iter().map(GenreDto::from).collect(),
    })))
}

pub async fn create_genre(
    State(state): State<Arc<AppState>>,
    Extension(who): Extension<MaybeUser>,
    Json(payload): Json<CreateGenreRequest>,
) -> Result<Json<ApiResponse<GenreDto>>, ApiError> {
    require_admin(who.require()?)?;
    validate_name(&payload.name)?;
    validate_slug(&payload.slug)?;

    match state.store().create_genre(&payload.name, &payload.slug).await {
        Ok(genre) => Ok(Json(ApiResponse::success(GenreDto::from(genre)))),
        Err(err) if is_unique_violation(&err) => Err(ApiError::conflict(format!(
            "Genre slug '{}' is already taken",
            payload.slug
        ))),
        Err(err) => Err(err.into()),
    }
}

pub async fn delete_genre(
    State(state): State<Arc<AppState>>,
    Extension(who): Extension<MaybeUser>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    require_admin(who.require()?)?;

    if state.store().delete_genre(&slug).await? {
        Ok(Json(ApiResponse::success(())))
    } else {
        Err(ApiError::not_found("Genre", slug))
    }
}
