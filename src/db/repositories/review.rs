use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};

use crate::entities::{comments, reviews, users};

pub struct ReviewRepository {
    conn: DatabaseConnection,
}

impl ReviewRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list_for_title(
        &self,
        title_id: i32,
        limit: u64,
        offset: u64,
    ) -> Result<(Vec<(reviews::Model, Option<users::Model>)>, u64)> {
        let query = reviews::Entity::find().filter(reviews::Column::TitleId.eq(title_id));

        let count = query
            .clone()
            .count(&self.conn)
            .await
            .context("Failed to count reviews")?;

        let rows = query
            .order_by_asc(reviews::Column::PubDate)
            .offset(offset)
            .limit(limit)
            .find_also_related(users::Entity)
            .all(&self.conn)
            .await
            .context("Failed to list reviews")?;

        Ok((rows, count))
    }

    /// Fetch a review scoped to its parent title.
    pub async fn get_for_title(
        &self,
        title_id: i32,
        review_id: i32,
    ) -> Result<Option<(reviews::Model, Option<users::Model>)>> {
        reviews::Entity::find_by_id(review_id)
            .filter(reviews::Column::TitleId.eq(title_id))
            .find_also_related(users::Entity)
            .one(&self.conn)
            .await
            .context("Failed to query review")
    }

    pub async fn get(&self, review_id: i32) -> Result<Option<reviews::Model>> {
        reviews::Entity::find_by_id(review_id)
            .one(&self.conn)
            .await
            .context("Failed to query review")
    }

    /// Insert a review. The unique index on (author, title) is the guard
    /// against a second review; callers translate the violation.
    pub async fn create(
        &self,
        title_id: i32,
        author_id: i32,
        text: &str,
        score: i16,
    ) -> Result<reviews::Model> {
        let active = reviews::ActiveModel {
            title_id: Set(title_id),
            author_id: Set(author_id),
            text: Set(text.to_string()),
            score: Set(score),
            pub_date: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        active.insert(&self.conn).await.context("Failed to insert review")
    }

    pub async fn update(
        &self,
        review: reviews::Model,
        text: Option<String>,
        score: Option<i16>,
    ) -> Result<reviews::Model> {
        let mut active: reviews::ActiveModel = review.into();
        if let Some(text) = text {
            active.text = Set(text);
        }
        if let Some(score) = score {
            active.score = Set(score);
        }

        active.update(&self.conn).await.context("Failed to update review")
    }

    /// Delete a review together with its comments.
    pub async fn delete(&self, review_id: i32) -> Result<bool> {
        let txn = self.conn.begin().await?;

        comments::Entity::delete_many()
            .filter(comments::Column::ReviewId.eq(review_id))
            .exec(&txn)
            .await?;

        let result = reviews::Entity::delete_by_id(review_id).exec(&txn).await?;

        txn.commit().await?;
        Ok(result.rows_affected > 0)
    }
}
