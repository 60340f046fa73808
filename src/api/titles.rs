use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, Page, TitleDto, resolve_page};
use crate::api::auth::MaybeUser;
use crate::api::permissions::require_admin;
use crate::api::validation::{validate_name, validate_year};
use crate::db::{NewTitle, TitleFilter, TitleOrder, TitleOrderField, TitleUpdate};

#[derive(Deserialize)]
pub struct TitleListQuery {
    /// Category slug, matched case-insensitively.
    pub category: Option<String>,
    /// Genre slug, matched case-insensitively.
    pub genre: Option<String>,
    /// Substring of the title name.
    pub name: Option<String>,
    pub year: Option<i32>,
    /// One of rating/name/year, with a `-` prefix for descending.
    pub ordering: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[derive(Deserialize)]
pub struct CreateTitleRequest {
    pub name: String,
    pub year: i32,
    #[serde(default)]
    pub description: String,
    pub category: String,
    pub genre: Vec<String>,
}

#[derive(Deserialize, Default)]
pub struct PatchTitleRequest {
    pub name: Option<String>,
    pub year: Option<i32>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub genre: Option<Vec<String>>,
}

fn parse_ordering(raw: &str) -> Result<TitleOrder, ApiError> {
    let (field_name, descending) = raw
        .strip_prefix('-')
        .map_or((raw, false), |stripped| (stripped, true));

    let field = match field_name {
        "rating" => TitleOrderField::Rating,
        "name" => TitleOrderField::Name,
        "year" => TitleOrderField::Year,
        other => {
            return Err(ApiError::validation(format!(
                "Cannot order by '{other}'. Expected one of: rating, name, year"
            )));
        }
    };

    Ok(TitleOrder { field, descending })
}

/// Resolve category and genre slugs into ids, rejecting unknown slugs and an
/// empty genre list before anything is written.
async fn resolve_references(
    state: &AppState,
    category: Option<&str>,
    genre_slugs: Option<&[String]>,
) -> Result<(Option<i32>, Option<Vec<i32>>), ApiError> {
    let category_id = match category {
        Some(slug) => {
            let category = state
                .store()
                .get_category_by_slug(slug)
                .await?
                .ok_or_else(|| {
                    ApiError::validation(format!("Unknown category slug: '{slug}'"))
                })?;
            Some(category.id)
        }
        None => None,
    };

    let genre_ids = match genre_slugs {
        Some([]) => {
            return Err(ApiError::validation("At least one genre is required"));
        }
        Some(slugs) => match state.store().resolve_genre_slugs(slugs).await? {
            Ok(genres) => Some(genres.into_iter().map(|g| g.id).collect()),
            Err(unknown) => {
                return Err(ApiError::validation(format!(
                    "Unknown genre slug: '{unknown}'"
                )));
            }
        },
        None => None,
    };

    Ok((category_id, genre_ids))
}

pub async fn list_titles(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TitleListQuery>,
) -> Result<Json<ApiResponse<Page<TitleDto>>>, ApiError> {
    let order = query.ordering.as_deref().map(parse_ordering).transpose()?;
    let (limit, offset) = resolve_page(query.limit, query.offset);

    let filter = TitleFilter {
        category: query.category,
        genre: query.genre,
        name: query.name,
        year: query.year,
    };

    let (records, count) = state.store().list_titles(&filter, order, limit, offset).await?;

    Ok(Json(ApiResponse::success(Page {
        count,
        results: records.into_iter().map(TitleDto::from).collect(),
    })))
}

pub async fn get_title(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<TitleDto>>, ApiError> {
    let record = state
        .store()
        .get_title(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Title", id))?;

    Ok(Json(ApiResponse::success(TitleDto::from(record))))
}

pub async fn create_title(
    State(state): State<Arc<AppState>>,
    Extension(who): Extension<MaybeUser>,
    Json(payload): Json<CreateTitleRequest>,
) -> Result<Json<ApiResponse<TitleDto>>, ApiError> {
    require_admin(who.require()?)?;
    validate_name(&payload.name)?;
    validate_year(payload.year)?;

    let (category_id, genre_ids) = match resolve_references(
        &state,
        Some(&payload.category),
        Some(&payload.genre),
    )
    .await?
    {
        (Some(category_id), Some(genre_ids)) => (category_id, genre_ids),
        _ => return Err(ApiError::internal("Reference resolution returned nothing")),
    };

    let id = state
        .store()
        .create_title(NewTitle {
            name: payload.name,
            year: payload.year,
            description: payload.description,
            category_id,
            genre_ids,
        })
        .await?;

    // Respond with the read representation, not an echo of the input.
    let record = state
        .store()
        .get_title(id)
        .await?
        .ok_or_else(|| ApiError::internal("Created title vanished before read-back"))?;

    Ok(Json(ApiResponse::success(TitleDto::from(record))))
}

pub async fn patch_title(
    State(state): State<Arc<AppState>>,
    Extension(who): Extension<MaybeUser>,
    Path(id): Path<i32>,
    Json(payload): Json<PatchTitleRequest>,
) -> Result<Json<ApiResponse<TitleDto>>, ApiError> {
    require_admin(who.require()?)?;

    if let Some(name) = &payload.name {
        validate_name(name)?;
    }
    if let Some(year) = payload.year {
        validate_year(year)?;
    }

    let (category_id, genre_ids) = resolve_references(
        &state,
        payload.category.as_deref(),
        payload.genre.as_deref(),
    )
    .await?;

    let updated = state
        .store()
        .update_title(
            id,
            TitleUpdate {
                name: payload.name,
                year: payload.year,
                description: payload.description,
                category_id,
                genre_ids,
            },
        )
        .await?;

    if !updated {
        return Err(ApiError::not_found("Title", id));
    }

    let record = state
        .store()
        .get_title(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Title", id))?;

    Ok(Json(ApiResponse::success(TitleDto::from(record))))
}

pub async fn delete_title(
    State(state): State<Arc<AppState>>,
    Extension(who): Extension<MaybeUser>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    require_admin(who.require()?)?;

    if state.store().delete_title(id).await? {
        Ok(Json(ApiResponse::success(())))
    } else {
        Err(ApiError::not_found("Title", id))
    }
}
