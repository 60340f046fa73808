use anyhow::Result;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, SqlErr, Statement,
};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::entities::{categories, comments, genres, reviews, titles, users};

pub mod migrator;
pub mod repositories;

pub use migrator::DEFAULT_ACCESS_TOKEN;
pub use repositories::title::{
    NewTitle, TitleFilter, TitleOrder, TitleOrderField, TitleRecord, TitleUpdate,
};
pub use repositories::user::{NewUser, UserUpdate};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn category_repo(&self) -> repositories::category::CategoryRepository {
        repositories::category::CategoryRepository::new(self.conn.clone())
    }

    fn genre_repo(&self) -> repositories::genre::GenreRepository {
        repositories::genre::GenreRepository::new(self.conn.clone())
    }

    fn title_repo(&self) -> repositories::title::TitleRepository {
        repositories::title::TitleRepository::new(self.conn.clone())
    }

    fn review_repo(&self) -> repositories::review::ReviewRepository {
        repositories::review::ReviewRepository::new(self.conn.clone())
    }

    fn comment_repo(&self) -> repositories::comment::CommentRepository {
        repositories::comment::CommentRepository::new(self.conn.clone())
    }

    // Users

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<users::Model>> {
        self.user_repo().get_by_username(username).await
    }

    pub async fn get_user_by_username_and_email(
        &self,
        username: &str,
        email: &str,
    ) -> Result<Option<users::Model>> {
        self.user_repo().get_by_username_and_email(username, email).await
    }

    pub async fn get_user_by_access_token(&self, token: &str) -> Result<Option<users::Model>> {
        self.user_repo().get_by_access_token(token).await
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        self.user_repo().email_exists(email).await
    }

    pub async fn create_user(&self, new_user: NewUser) -> Result<users::Model> {
        self.user_repo().create(new_user).await
    }

    pub async fn list_users(
        &self,
        search: Option<&str>,
        limit: u64,
        offset: u64,
    ) -> Result<(Vec<users::Model>, u64)> {
        self.user_repo().list(search, limit, offset).await
    }

    pub async fn update_user(
        &self,
        username: &str,
        update: UserUpdate,
    ) -> Result<Option<users::Model>> {
        self.user_repo().update(username, update).await
    }

    pub async fn delete_user(&self, username: &str) -> Result<bool> {
        self.user_repo().delete(username).await
    }

    pub async fn set_confirmation_code(&self, username: &str, code_hash: &str) -> Result<()> {
        self.user_repo().set_confirmation_code(username, code_hash).await
    }

    pub async fn activate_user_with_token(&self, username: &str, token: &str) -> Result<()> {
        self.user_repo().activate_with_token(username, token).await
    }

    // Categories

    pub async fn list_categories(
        &self,
        search: Option<&str>,
        limit: u64,
        offset: u64,
    ) -> Result<(Vec<categories::Model>, u64)> {
        self.category_repo().list(search, limit, offset).await
    }

    pub async fn get_category_by_slug(&self, slug: &str) -> Result<Option<categories::Model>> {
        self.category_repo().get_by_slug(slug).await
    }

    pub async fn create_category(&self, name: &str, slug: &str) -> Result<categories::Model> {
        self.category_repo().create(name, slug).await
    }

    pub async fn delete_category(&self, slug: &str) -> Result<bool> {
        self.category_repo().delete_by_slug(slug).await
    }

    // Genres

    pub async fn list_genres(
        &self,
        search: Option<&str>,
        limit: u64,
        offset: u64,
    ) -> Result<(Vec<genres::Model>, u64)> {
        self.genre_repo().list(search, limit, offset).await
    }

    pub async fn create_genre(&self, name: &str, slug: &str) -> Result<genres::Model> {
        self.genre_repo().create(name, slug).await
    }

    pub async fn delete_genre(&self, slug: &str) -> Result<bool> {
        self.genre_repo().delete_by_slug(slug).await
    }

    pub async fn resolve_genre_slugs(
        &self,
        slugs: &[String],
    ) -> Result<std::result::Result<Vec<genres::Model>, String>> {
        self.genre_repo().resolve_slugs(slugs).await
    }

    // Titles

    pub async fn list_titles(
        &self,
        filter: &TitleFilter,
        order: Option<TitleOrder>,
        limit: u64,
        offset: u64,
    ) -> Result<(Vec<TitleRecord>, u64)> {
        self.title_repo().list(filter, order, limit, offset).await
    }

    pub async fn get_title(&self, id: i32) -> Result<Option<TitleRecord>> {
        self.title_repo().get(id).await
    }

    pub async fn get_title_model(&self, id: i32) -> Result<Option<titles::Model>> {
        self.title_repo().get_model(id).await
    }

    pub async fn title_exists(&self, id: i32) -> Result<bool> {
        self.title_repo().exists(id).await
    }

    pub async fn create_title(&self, new_title: NewTitle) -> Result<i32> {
        self.title_repo().create(new_title).await
    }

    pub async fn update_title(&self, id: i32, update: TitleUpdate) -> Result<bool> {
        self.title_repo().update(id, update).await
    }

    pub async fn delete_title(&self, id: i32) -> Result<bool> {
        self.title_repo().delete(id).await
    }

    // Reviews

    pub async fn list_reviews(
        &self,
        title_id: i32,
        limit: u64,
        offset: u64,
    ) -> Result<(Vec<(reviews::Model, Option<users::Model>)>, u64)> {
        self.review_repo().list_for_title(title_id, limit, offset).await
    }

    pub async fn get_review_for_title(
        &self,
        title_id: i32,
        review_id: i32,
    ) -> Result<Option<(reviews::Model, Option<users::Model>)>> {
        self.review_repo().get_for_title(title_id, review_id).await
    }

    pub async fn get_review(&self, review_id: i32) -> Result<Option<reviews::Model>> {
        self.review_repo().get(review_id).await
    }

    pub async fn create_review(
        &self,
        title_id: i32,
        author_id: i32,
        text: &str,
        score: i16,
    ) -> Result<reviews::Model> {
        self.review_repo().create(title_id, author_id, text, score).await
    }

    pub async fn update_review(
        &self,
        review: reviews::Model,
        text: Option<String>,
        score: Option<i16>,
    ) -> Result<reviews::Model> {
        self.review_repo().update(review, text, score).await
    }

    pub async fn delete_review(&self, review_id: i32) -> Result<bool> {
        self.review_repo().delete(review_id).await
    }

    // Comments

    pub async fn list_comments(
        &self,
        review_id: i32,
        limit: u64,
        offset: u64,
    ) -> Result<(Vec<(comments::Model, Option<users::Model>)>, u64)> {
        self.comment_repo().list_for_review(review_id, limit, offset).await
    }

    pub async fn get_comment_for_review(
        &self,
        review_id: i32,
        comment_id: i32,
    ) -> Result<Option<(comments::Model, Option<users::Model>)>> {
        self.comment_repo().get_for_review(review_id, comment_id).await
    }

    pub async fn create_comment(
        &self,
        review_id: i32,
        author_id: i32,
        text: &str,
    ) -> Result<comments::Model> {
        self.comment_repo().create(review_id, author_id, text).await
    }

    pub async fn update_comment(
        &self,
        comment: comments::Model,
        text: String,
    ) -> Result<comments::Model> {
        self.comment_repo().update(comment, text).await
    }

    pub async fn delete_comment(&self, comment_id: i32) -> Result<bool> {
        self.comment_repo().delete(comment_id).await
    }
}

/// True when the error chain bottoms out in a storage-level unique
/// constraint violation. The constraint is the authoritative uniqueness
/// signal; callers translate this into a conflict response.
#[must_use]
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.downcast_ref::<DbErr>()
        .and_then(DbErr::sql_err)
        .is_some_and(|sql_err| matches!(sql_err, SqlErr::UniqueConstraintViolation(_)))
}
