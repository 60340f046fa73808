use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, Page, PageQuery, ReviewDto};
use crate::api::auth::MaybeUser;
use crate::api::permissions::require_author_or_moderator;
use crate::api::validation::validate_score;
use crate::db::is_unique_violation;
use crate::entities::titles;

#[derive(Deserialize)]
pub struct CreateReviewRequest {
    pub text: String,
    pub score: i16,
}

#[derive(Deserialize, Default)]
pub struct PatchReviewRequest {
    pub text: Option<String>,
    pub score: Option<i16>,
}

async fn parent_title(state: &AppState, title_id: i32) -> Result<titles::Model, ApiError> {
    state
        .store()
        .get_title_model(title_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Title", title_id))
}

pub async fn list_reviews(
    State(state): State<Arc<AppState>>,
    Path(title_id): Path<i32>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<Page<ReviewDto>>>, ApiError> {
    let title = parent_title(&state, title_id).await?;
    let (limit, offset) = query.resolve();

    let (rows, count) = state.store().list_reviews(title_id, limit, offset).await?;

    Ok(Json(ApiResponse::success(Page {
        count,
        results: rows
            .into_iter()
            .map(|(review, author)| ReviewDto::new(review, author, &title.name))
            .collect(),
    })))
}

pub async fn get_review(
    State(state): State<Arc<AppState>>,
    Path((title_id, review_id)): Path<(i32, i32)>,
) -> Result<Json<ApiResponse<ReviewDto>>, ApiError> {
    let title = parent_title(&state, title_id).await?;

    let (review, author) = state
        .store()
        .get_review_for_title(title_id, review_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Review", review_id))?;

    Ok(Json(ApiResponse::success(ReviewDto::new(
        review,
        author,
        &title.name,
    ))))
}

/// POST /titles/{title_id}/reviews
/// Author and title are assigned server-side; the unique index rejects a
/// second review by the same author.
pub async fn create_review(
    State(state): State<Arc<AppState>>,
    Extension(who): Extension<MaybeUser>,
    Path(title_id): Path<i32>,
    Json(payload): Json<CreateReviewRequest>,
) -> Result<Json<ApiResponse<ReviewDto>>, ApiError> {
    let user = who.require()?.clone();
    if payload.text.is_empty() {
        return Err(ApiError::validation("Review text cannot be empty"));
    }
    validate_score(payload.score)?;

    let title = parent_title(&state, title_id).await?;

    match state
        .store()
        .create_review(title_id, user.id, &payload.text, payload.score)
        .await
    {
        Ok(review) => {
            let author = state.store().get_user_by_username(&user.username).await?;
            Ok(Json(ApiResponse::success(ReviewDto::new(
                review,
                author,
                &title.name,
            ))))
        }
        Err(err) if is_unique_violation(&err) => Err(ApiError::conflict(
            "Adding a second review for this title is forbidden",
        )),
        Err(err) => Err(err.into()),
    }
}

pub async fn patch_review(
    State(state): State<Arc<AppState>>,
    Extension(who): Extension<MaybeUser>,
    Path((title_id, review_id)): Path<(i32, i32)>,
    Json(payload): Json<PatchReviewRequest>,
) -> Result<Json<ApiResponse<ReviewDto>>, ApiError> {
    let user = who.require()?;

    if let Some(score) = payload.score {
        validate_score(score)?;
    }

    let title = parent_title(&state, title_id).await?;

    let (review, author) = state
        .store()
        .get_review_for_title(title_id, review_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Review", review_id))?;

    require_author_or_moderator(user, review.author_id)?;

    let updated = state
        .store()
        .update_review(review, payload.text, payload.score)
        .await?;

    Ok(Json(ApiResponse::success(ReviewDto::new(
        updated,
        author,
        &title.name,
    ))))
}

pub async fn delete_review(
    State(state): State<Arc<AppState>>,
    Extension(who): Extension<MaybeUser>,
    Path((title_id, review_id)): Path<(i32, i32)>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let user = who.require()?;

    parent_title(&state, title_id).await?;

    let (review, _) = state
        .store()
        .get_review_for_title(title_id, review_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Review", review_id))?;

    require_author_or_moderator(user, review.author_id)?;

    state.store().delete_review(review_id).await?;

    Ok(Json(ApiResponse::success(())))
}
