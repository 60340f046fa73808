use anyhow::{Context, Result};
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};

use crate::entities::{genre_titles, genres};

pub struct GenreRepository {
    conn: DatabaseConnection,
}

impl GenreRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list(
        &self,
        search: Option<&str>,
        limit: u64,
        offset: u64,
    ) -> Result<(Vec<genres::Model>, u64)> {
        let mut query = genres::Entity::find();
        if let Some(name) = search {
            query = query.filter(genres::Column::Name.starts_with(name));
        }

        let count = query
            .clone()
            .count(&self.conn)
            .await
            .context("Failed to count genres")?;

        let rows = query
            .order_by_asc(genres::Column::Name)
            .offset(offset)
            .limit(limit)
            .all(&self.conn)
            .await
            .context("Failed to list genres")?;

        Ok((rows, count))
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<genres::Model>> {
        genres::Entity::find()
            .filter(Expr::expr(Func::lower(Expr::col(genres::Column::Slug))).eq(slug.to_lowercase()))
            .one(&self.conn)
            .await
            .context("Failed to query genre by slug")
    }

    /// Resolve a list of slugs, preserving input order.
    /// Returns the first unknown slug as the error value.
    pub async fn resolve_slugs(
        &self,
        slugs: &[String],
    ) -> Result<std::result::Result<Vec<genres::Model>, String>> {
        let mut resolved = Vec::with_capacity(slugs.len());
        for slug in slugs {
            match self.get_by_slug(slug).await? {
                Some(genre) => resolved.push(genre),
                None => return Ok(Err(slug.clone())),
            }
        }
        Ok(Ok(resolved))
    }

    pub async fn create(&self, name: &str, slug: &str) -> Result<genres::Model> {
        let active = genres::ActiveModel {
            name: Set(name.to_string()),
            slug: Set(slug.to_string()),
            ..Default::default()
        };

        active.insert(&self.conn).await.context("Failed to insert genre")
    }

    pub async fn delete_by_slug(&self, slug: &str) -> Result<bool> {
        let Some(genre) = self.get_by_slug(slug).await? else {
            return Ok(false);
        };

        let txn = self.conn.begin().await?;

        genre_titles::Entity::delete_many()
            .filter(genre_titles::Column::GenreId.eq(genre.id))
            .exec(&txn)
            .await?;

        genres::Entity::delete_by_id(genre.id).exec(&txn).await?;

        txn.commit().await?;
        Ok(true)
    }
}
