use anyhow::{Context, Result};
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};

use crate::entities::{categories, titles};

pub struct CategoryRepository {
    conn: DatabaseConnection,
}

impl CategoryRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list(
        &self,
        search: Option<&str>,
        limit: u64,
        offset: u64,
    ) -> Result<(Vec<categories::Model>, u64)> {
        let mut query = categories::Entity::find();
        if let Some(name) = search {
            query = query.filter(categories::Column::Name.starts_with(name));
        }

        let count = query
            .clone()
            .count(&self.conn)
            .await
            .context("Failed to count categories")?;

        let rows = query
            .order_by_asc(categories::Column::Name)
            .offset(offset)
            .limit(limit)
            .all(&self.conn)
            .await
            .context("Failed to list categories")?;

        Ok((rows, count))
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<categories::Model>> {
        categories::Entity::find()
            .filter(
                Expr::expr(Func::lower(Expr::col(categories::Column::Slug)))
                    .eq(slug.to_lowercase()),
            )
            .one(&self.conn)
            .await
            .context("Failed to query category by slug")
    }

    pub async fn create(&self, name: &str, slug: &str) -> Result<categories::Model> {
        let active = categories::ActiveModel {
            name: Set(name.to_string()),
            slug: Set(slug.to_string()),
            ..Default::default()
        };

        active
            .insert(&self.conn)
            .await
            .context("Failed to insert category")
    }

    /// Delete a category; referencing titles are detached, not removed.
    pub async fn delete_by_slug(&self, slug: &str) -> Result<bool> {
        let Some(category) = self.get_by_slug(slug).await? else {
            return Ok(false);
        };

        let txn = self.conn.begin().await?;

        titles::Entity::update_many()
            .col_expr(titles::Column::CategoryId, Expr::value(Option::<i32>::None))
            .filter(titles::Column::CategoryId.eq(category.id))
            .exec(&txn)
            .await?;

        categories::Entity::delete_by_id(category.id).exec(&txn).await?;

        txn.commit().await?;
        Ok(true)
    }
}
