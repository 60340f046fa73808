use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{delete, get, patch, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::state::SharedState;

pub mod auth;
mod categories;
mod comments;
mod error;
mod genres;
mod permissions;
mod reviews;
mod titles;
mod types;
mod users;
mod validation;

pub use error::ApiError;
pub use types::*;

use tokio::sync::RwLock;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Arc<RwLock<Config>> {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }
}

pub async fn create_app_state(shared: Arc<SharedState>) -> anyhow::Result<Arc<AppState>> {
    Ok(Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
    }))
}

pub async fn create_app_state_from_config(config: Config) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    create_app_state(shared).await
}

pub async fn router(state: Arc<AppState>) -> Router {
    let cors_origins = {
        let config = state.config().read().await;
        config.server.cors_allowed_origins.clone()
    };

    let api_router = Router::new()
        .route("/auth/signup", post(auth::signup))
        .route("/auth/token", post(auth::token))
        .route("/categories", get(categories::list_categories))
        .route("/categories", post(categories::create_category))
        .route("/categories/{slug}", delete(categories::delete_category))
        .route("/genres", get(genres::list_genres))
        .route("/genres", post(genres::create_genre))
        .route("/genres/{slug}", delete(genres::delete_genre))
        .route("/titles", get(titles::list_titles))
        .route("/titles", post(titles::create_title))
        .route("/titles/{id}", get(titles::get_title))
        .route("/titles/{id}", patch(titles::patch_title))
        .route("/titles/{id}", delete(titles::delete_title))
        .route("/titles/{title_id}/reviews", get(reviews::list_reviews))
        .route("/titles/{title_id}/reviews", post(reviews::create_review))
        .route(
            "/titles/{title_id}/reviews/{review_id}",
            get(reviews::get_review),
        )
        .route(
            "/titles/{title_id}/reviews/{review_id}",
            patch(reviews::patch_review),
        )
        .route(
            "/titles/{title_id}/reviews/{review_id}",
            delete(reviews::delete_review),
        )
        .route("/reviews/{review_id}/comments", get(comments::list_comments))
        .route(
            "/reviews/{review_id}/comments",
            post(comments::create_comment),
        )
        .route(
            "/reviews/{review_id}/comments/{id}",
            get(comments::get_comment),
        )
        .route(
            "/reviews/{review_id}/comments/{id}",
            patch(comments::patch_comment),
        )
        .route(
            "/reviews/{review_id}/comments/{id}",
            delete(comments::delete_comment),
        )
        .route("/users", get(users::list_users))
        .route("/users", post(users::create_user))
        .route("/users/me", get(users::get_me))
        .route("/users/me", patch(users::patch_me))
        .route("/users/{username}", get(users::get_user))
        .route("/users/{username}", patch(users::patch_user))
        .route("/users/{username}", delete(users::delete_user))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::identity_middleware,
        ))
        .with_state(state);

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}
