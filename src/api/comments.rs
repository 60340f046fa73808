use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, CommentDto, Page, PageQuery};
use crate::api::auth::MaybeUser;
use crate::api::permissions::require_author_or_moderator;

#[derive(Deserialize)]
pub struct CreateCommentRequest {
    pub text: String,
}

#[derive(Deserialize, Default)]
pub struct PatchCommentRequest {
    pub text: Option<String>,
}

async fn ensure_review_exists(state: &AppState, review_id: i32) -> Result<(), ApiError> {
    state
        .store()
        .get_review(review_id)
        .await?
        .map(|_| ())
        .ok_or_else(|| ApiError::not_found("Review", review_id))
}

pub async fn list_comments(
    State(state): State<Arc<AppState>>,
    Path(review_id): Path<i32>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<Page<CommentDto>>>, ApiError> {
    ensure_review_exists(&state, review_id).await?;
    let (limit, offset) = query.resolve();

    let (rows, count) = state.store().list_comments(review_id, limit, offset).await?;

    Ok(Json(ApiResponse::success(Page {
        count,
        results: rows
            .into_iter()
            .map(|(comment, author)| CommentDto::new(comment, author))
            .collect(),
    })))
}

pub async fn get_comment(
    State(state): State<Arc<AppState>>,
    Path((review_id, comment_id)): Path<(i32, i32)>,
) -> Result<Json<ApiResponse<CommentDto>>, ApiError> {
    ensure_review_exists(&state, review_id).await?;

    let (comment, author) = state
        .store()
        .get_comment_for_review(review_id, comment_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Comment", comment_id))?;

    Ok(Json(ApiResponse::success(CommentDto::new(comment, author))))
}

/// POST /reviews/{review_id}/comments
/// Author and review are assigned server-side.
pub async fn create_comment(
    State(state): State<Arc<AppState>>,
    Extension(who): Extension<MaybeUser>,
    Path(review_id): Path<i32>,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<Json<ApiResponse<CommentDto>>, ApiError> {
    let user = who.require()?.clone();

    if payload.text.is_empty() {
        return Err(ApiError::validation("Comment text cannot be empty"));
    }

    ensure_review_exists(&state, review_id).await?;

    let comment = state
        .store()
        .create_comment(review_id, user.id, &payload.text)
        .await?;

    let author = state.store().get_user_by_username(&user.username).await?;

    Ok(Json(ApiResponse::success(CommentDto::new(comment, author))))
}

pub async fn patch_comment(
    State(state): State<Arc<AppState>>,
    Extension(who): Extension<MaybeUser>,
    Path((review_id, comment_id)): Path<(i32, i32)>,
    Json(payload): Json<PatchCommentRequest>,
) -> Result<Json<ApiResponse<CommentDto>>, ApiError> {
    let user = who.require()?;

    ensure_review_exists(&state, review_id).await?;

    let (comment, author) = state
        .store()
        .get_comment_for_review(review_id, comment_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Comment", comment_id))?;

    require_author_or_moderator(user, comment.author_id)?;

    let updated = match payload.text {
        Some(text) if !text.is_empty() => state.store().update_comment(comment, text).await?,
        Some(_) => return Err(ApiError::validation("Comment text cannot be empty")),
        None => comment,
    };

    Ok(Json(ApiResponse::success(CommentDto::new(updated, author))))
}

pub async fn delete_comment(
    State(state): State<Arc<AppState>>,
    Extension(who): Extension<MaybeUser>,
    Path((review_id, comment_id)): Path<(i32, i32)>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let user = who.require()?;

    ensure_review_exists(&state, review_id).await?;

    let (comment, _) = state
        .store()
        .get_comment_for_review(review_id, comment_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Comment", comment_id))?;

    require_author_or_moderator(user, comment.author_id)?;

    state.store().delete_comment(comment_id).await?;

    Ok(Json(ApiResponse::success(())))
}
