use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, Page, UserDto, resolve_page};
use crate::api::auth::MaybeUser;
use crate::api::permissions::require_admin;
use crate::api::validation::{validate_email, validate_username};
use crate::db::{NewUser, UserUpdate, is_unique_violation};
use crate::domain::Role;

#[derive(Deserialize)]
pub struct UserListQuery {
    /// Username prefix to search for.
    pub search: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub bio: String,
    pub role: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct PatchUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub role: Option<String>,
}

/// Self-service patch: same shape minus `role`, which is read-only on the
/// `me` resource (an extra `role` key in the payload is simply ignored).
#[derive(Deserialize, Default)]
pub struct PatchSelfRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
}

fn parse_role(raw: &str) -> Result<Role, ApiError> {
    raw.parse().map_err(ApiError::ValidationError)
}

/// Map a uniqueness violation on a user write to a field-scoped conflict.
async fn translate_user_conflict(
    state: &AppState,
    err: anyhow::Error,
    email: Option<&str>,
) -> ApiError {
    if !is_unique_violation(&err) {
        return err.into();
    }
    match email {
        Some(email) => match state.store().email_exists(email).await {
            Ok(true) => ApiError::conflict("Email is already taken"),
            Ok(false) => ApiError::conflict("Username is already taken"),
            Err(e) => e.into(),
        },
        None => ApiError::conflict("Username is already taken"),
    }
}

pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Extension(who): Extension<MaybeUser>,
    Query(query): Query<UserListQuery>,
) -> Result<Json<ApiResponse<Page<UserDto>>>, ApiError> {
    require_admin(who.require()?)?;
    let (limit, offset) = resolve_page(query.limit, query.offset);

    let (rows, count) = state
        .store()
        .list_users(query.search.as_deref(), limit, offset)
        .await?;

    Ok(Json(ApiResponse::success(Page {
        count,
        results: rows.into_iter().map(UserDto::from).collect(),
    })))
}

pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Extension(who): Extension<MaybeUser>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    require_admin(who.require()?)?;
    validate_username(&payload.username)?;
    validate_email(&payload.email)?;

    let role = match payload.role.as_deref() {
        Some(raw) => parse_role(raw)?,
        None => Role::User,
    };

    let created = state
        .store()
        .create_user(NewUser {
            username: payload.username,
            email: payload.email.clone(),
            role,
            bio: payload.bio,
            first_name: payload.first_name,
            last_name: payload.last_name,
            confirmation_code_hash: None,
            is_active: true,
        })
        .await;

    match created {
        Ok(user) => Ok(Json(ApiResponse::success(UserDto::from(user)))),
        Err(err) => Err(translate_user_conflict(&state, err, Some(&payload.email)).await),
    }
}

pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Extension(who): Extension<MaybeUser>,
    Path(username): Path<String>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    require_admin(who.require()?)?;

    let user = state
        .store()
        .get_user_by_username(&username)
        .await?
        .ok_or_else(|| ApiError::not_found("User", username))?;

    Ok(Json(ApiResponse::success(UserDto::from(user))))
}

pub async fn patch_user(
    State(state): State<Arc<AppState>>,
    Extension(who): Extension<MaybeUser>,
    Path(username): Path<String>,
    Json(payload): Json<PatchUserRequest>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    require_admin(who.require()?)?;

    if let Some(new_username) = &payload.username {
        validate_username(new_username)?;
    }
    if let Some(email) = &payload.email {
        validate_email(email)?;
    }
    let role = payload.role.as_deref().map(parse_role).transpose()?;

    let update = UserUpdate {
        username: payload.username,
        email: payload.email.clone(),
        first_name: payload.first_name,
        last_name: payload.last_name,
        bio: payload.bio,
        role,
    };

    match state.store().update_user(&username, update).await {
        Ok(Some(user)) => Ok(Json(ApiResponse::success(UserDto::from(user)))),
        Ok(None) => Err(ApiError::not_found("User", username)),
        Err(err) => Err(translate_user_conflict(&state, err, payload.email.as_deref()).await),
    }
}

pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Extension(who): Extension<MaybeUser>,
    Path(username): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    require_admin(who.require()?)?;

    if state.store().delete_user(&username).await? {
        Ok(Json(ApiResponse::success(())))
    } else {
        Err(ApiError::not_found("User", username))
    }
}

/// GET /users/me
pub async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(who): Extension<MaybeUser>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let user = who.require()?;

    let model = state
        .store()
        .get_user_by_username(&user.username)
        .await?
        .ok_or_else(ApiError::unauthorized)?;

    Ok(Json(ApiResponse::success(UserDto::from(model))))
}

/// PATCH /users/me
pub async fn patch_me(
    State(state): State<Arc<AppState>>,
    Extension(who): Extension<MaybeUser>,
    Json(payload): Json<PatchSelfRequest>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let user = who.require()?.clone();

    if let Some(new_username) = &payload.username {
        validate_username(new_username)?;
    }
    if let Some(email) = &payload.email {
        validate_email(email)?;
    }

    let update = UserUpdate {
        username: payload.username,
        email: payload.email.clone(),
        first_name: payload.first_name,
        last_name: payload.last_name,
        bio: payload.bio,
        role: None,
    };

    match state.store().update_user(&user.username, update).await {
        Ok(Some(updated)) => Ok(Json(ApiResponse::success(UserDto::from(updated)))),
        Ok(None) => Err(ApiError::unauthorized()),
        Err(err) => Err(translate_user_conflict(&state, err, payload.email.as_deref()).await),
    }
}
