use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};

use crate::entities::{comments, users};

pub struct CommentRepository {
    conn: DatabaseConnection,
}

impl CommentRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list_for_review(
        &self,
        review_id: i32,
        limit: u64,
        offset: u64,
    ) -> Result<(Vec<(comments::Model, Option<users::Model>)>, u64)> {
        let query = comments::Entity::find().filter(comments::Column::ReviewId.eq(review_id));

        let count = query
            .clone()
            .count(&self.conn)
            .await
            .context("Failed to count comments")?;

        let rows = query
            .order_by_asc(comments::Column::PubDate)
            .offset(offset)
            .limit(limit)
            .find_also_related(users::Entity)
            .all(&self.conn)
            .await
            .context("Failed to list comments")?;

        Ok((rows, count))
    }

    /// Fetch a comment scoped to its parent review.
    pub async fn get_for_review(
        &self,
        review_id: i32,
        comment_id: i32,
    ) -> Result<Option<(comments::Model, Option<users::Model>)>> {
        comments::Entity::find_by_id(comment_id)
            .filter(comments::Column::ReviewId.eq(review_id))
            .find_also_related(users::Entity)
            .one(&self.conn)
            .await
            .context("Failed to query comment")
    }

    pub async fn create(
        &self,
        review_id: i32,
        author_id: i32,
        text: &str,
    ) -> Result<comments::Model> {
        let active = comments::ActiveModel {
            review_id: Set(review_id),
            author_id: Set(author_id),
            text: Set(text.to_string()),
            pub_date: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        active.insert(&self.conn).await.context("Failed to insert comment")
    }

    pub async fn update(&self, comment: comments::Model, text: String) -> Result<comments::Model> {
        let mut active: comments::ActiveModel = comment.into();
        active.text = Set(text);

        active.update(&self.conn).await.context("Failed to update comment")
    }

    pub async fn delete(&self, comment_id: i32) -> Result<bool> {
        let result = comments::Entity::delete_by_id(comment_id)
            .exec(&self.conn)
            .await
            .context("Failed to delete comment")?;
        Ok(result.rows_affected > 0)
    }
}
