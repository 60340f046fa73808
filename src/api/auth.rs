use axum::{
    Json,
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState};
use crate::api::validation::{validate_email, validate_username};
use crate::domain::Role;
use crate::entities::users;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
}

#[derive(Serialize)]
pub struct SignupResponse {
    pub username: String,
    pub email: String,
}

#[derive(Deserialize)]
pub struct TokenRequest {
    pub username: String,
    pub confirmation_code: String,
}

#[derive(Serialize)]
pub struct TokenResponse {
    pub token: String,
}

// ============================================================================
// Identity
// ============================================================================

/// The authenticated requester, resolved from a bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i32,
    pub username: String,
    pub role: Role,
    pub is_superuser: bool,
}

impl AuthUser {
    /// Superusers count as admins everywhere.
    #[must_use]
    pub fn effective_role(&self) -> Role {
        if self.is_superuser { Role::Admin } else { self.role }
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.effective_role() == Role::Admin
    }

    #[must_use]
    pub fn is_moderator(&self) -> bool {
        self.role == Role::Moderator
    }
}

impl From<users::Model> for AuthUser {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            role: model.role.parse().unwrap_or_default(),
            username: model.username,
            is_superuser: model.is_superuser,
        }
    }
}

/// Requester identity attached to every request by [`identity_middleware`].
/// `None` means anonymous; reads stay open, writes call [`Self::require`].
#[derive(Debug, Clone, Default)]
pub struct MaybeUser(pub Option<AuthUser>);

impl MaybeUser {
    pub fn require(&self) -> Result<&AuthUser, ApiError> {
        self.0.as_ref().ok_or_else(ApiError::unauthorized)
    }
}

// ============================================================================
// Middleware
// ============================================================================

/// Resolve `Authorization: Bearer <token>` into a [`MaybeUser`] request
/// extension. Unknown or missing tokens proceed as anonymous; endpoints that
/// need authentication reject on their own.
pub async fn identity_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let mut identity = MaybeUser(None);

    if let Some(token) = extract_bearer_token(request.headers()) {
        match state.store().get_user_by_access_token(&token).await {
            Ok(Some(user)) => {
                tracing::Span::current().record("user_id", &user.username);
                identity = MaybeUser(Some(AuthUser::from(user)));
            }
            Ok(None) => {}
            Err(e) => tracing::error!("Failed to resolve access token: {e}"),
        }
    }

    request.extensions_mut().insert(identity);
    next.run(request).await
}

/// Extract a bearer token from the Authorization header.
fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth_header) = headers.get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        return Some(token.trim().to_string());
    }

    None
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/signup
/// Register (or retry registration for) an account; mails a confirmation
/// code and echoes the submitted identity back.
pub async fn signup(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SignupRequest>,
) -> Result<Json<ApiResponse<SignupResponse>>, ApiError> {
    validate_username(&payload.username)?;
    validate_email(&payload.email)?;

    state
        .shared
        .auth
        .signup(&payload.username, &payload.email)
        .await?;

    Ok(Json(ApiResponse::success(SignupResponse {
        username: payload.username,
        email: payload.email,
    })))
}

/// POST /auth/token
/// Exchange a mailed confirmation code for a bearer token, activating the
/// account.
pub async fn token(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<TokenRequest>,
) -> Result<Json<ApiResponse<TokenResponse>>, ApiError> {
    if payload.username.is_empty() {
        return Err(ApiError::validation("Username is required"));
    }
    if payload.confirmation_code.is_empty() {
        return Err(ApiError::validation("Confirmation code is required"));
    }

    let token = state
        .shared
        .auth
        .exchange_token(&payload.username, &payload.confirmation_code)
        .await?;

    Ok(Json(ApiResponse::success(TokenResponse { token })))
}
