use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, CategoryDto, Page, resolve_page};
use crate::api::auth::MaybeUser;
use crate::api::permissions::require_admin;
use crate::api::validation::{validate_name, validate_slug};
use crate::db::is_unique_violation;

#[derive(Deserialize)]
pub struct CategoryListQuery {
    /// Name prefix to search for.
    pub search: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[derive(Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub slug: String,
}

pub async fn list_categories(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CategoryListQuery>,
) -> Result<Json<ApiResponse<Page<CategoryDto>>>, ApiError> {
    let (limit, offset) = resolve_page(query.limit, query.offset);
    let (rows, count) = state
        .store()
        .list_categories(query.search.as_deref(), limit, offset)
        .await?;

    Ok(Json(ApiResponse::success(Page {
        count,
        results: rows.into_iter().map(CategoryDto::from).collect(),
    })))
}

pub async fn create_category(
    State(state): State<Arc<AppState>>,
    Extension(who): Extension<MaybeUser>,
    Json(payload): Json<CreateCategoryRequest>,
) -> Result<Json<ApiResponse<CategoryDto>>, ApiError> {
    require_admin(who.require()?)?;
    validate_name(&payload.name)?;
    validate_slug(&payload.slug)?;

    match state.store().create_category(&payload.name, &payload.slug).await {
        Ok(category) => Ok(Json(ApiResponse::success(CategoryDto::from(category)))),
        Err(err) if is_unique_violation(&err) => Err(ApiError::conflict(format!(
            "Category slug '{}' is already taken",
            payload.slug
        ))),
        Err(err) => Err(err.into()),
    }
}

pub async fn delete_category(
    State(state): State<Arc<AppState>>,
    Extension(who): Extension<MaybeUser>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    require_admin(who.require()?)?;

    if state.store().delete_category(&slug).await? {
        Ok(Json(ApiResponse::success(())))
    } else {
        Err(ApiError::not_found("Category", slug))
    }
}
