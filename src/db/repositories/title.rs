use std::collections::HashMap;

use anyhow::{Context, Result};
use sea_orm::sea_query::{Expr, Func, Query, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Select, Set, TransactionTrait,
};

use crate::entities::{categories, comments, genre_titles, genres, reviews, titles};

use super::category::CategoryRepository;
use super::genre::GenreRepository;

/// List filters; slugs match case-insensitively, name is a substring match.
#[derive(Debug, Clone, Default)]
pub struct TitleFilter {
    pub category: Option<String>,
    pub genre: Option<String>,
    pub name: Option<String>,
    pub year: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleOrderField {
    Rating,
    Name,
    Year,
}

#[derive(Debug, Clone, Copy)]
pub struct TitleOrder {
    pub field: TitleOrderField,
    pub descending: bool,
}

/// A title hydrated with its referenced records and the read-time rating.
#[derive(Debug, Clone)]
pub struct TitleRecord {
    pub title: titles::Model,
    pub category: Option<categories::Model>,
    pub genres: Vec<genres::Model>,
    pub rating: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct NewTitle {
    pub name: String,
    pub year: i32,
    pub description: String,
    pub category_id: i32,
    pub genre_ids: Vec<i32>,
}

#[derive(Debug, Clone, Default)]
pub struct TitleUpdate {
    pub name: Option<String>,
    pub year: Option<i32>,
    pub description: Option<String>,
    pub category_id: Option<i32>,
    pub genre_ids: Option<Vec<i32>>,
}

pub struct TitleRepository {
    conn: DatabaseConnection,
}

impl TitleRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list(
        &self,
        filter: &TitleFilter,
        order: Option<TitleOrder>,
        limit: u64,
        offset: u64,
    ) -> Result<(Vec<TitleRecord>, u64)> {
        let Some(query) = self.filtered_query(filter).await? else {
            // A filter slug matched nothing; the result set is empty by
            // construction.
            return Ok((Vec::new(), 0));
        };

        let count = query
            .clone()
            .count(&self.conn)
            .await
            .context("Failed to count titles")?;

        // Rating is an aggregate over child reviews, so rating-ordering sorts
        // the hydrated set in memory; everything else orders in SQL.
        let models = match order {
            Some(TitleOrder {
                field: TitleOrderField::Rating,
                ..
            }) => {
                query
                    .order_by_asc(titles::Column::Name)
                    .all(&self.conn)
                    .await
            }
            Some(TitleOrder { field, descending }) => {
                let column = match field {
                    TitleOrderField::Name => titles::Column::Name,
                    TitleOrderField::Year | TitleOrderField::Rating => titles::Column::Year,
                };
                let ordered = if descending {
                    query.order_by_desc(column)
                } else {
                    query.order_by_asc(column)
                };
                ordered.offset(offset).limit(limit).all(&self.conn).await
            }
            None => {
                query
                    .order_by_asc(titles::Column::Name)
                    .order_by_asc(titles::Column::Year)
                    .offset(offset)
                    .limit(limit)
                    .all(&self.conn)
                    .await
            }
        }
        .context("Failed to list titles")?;

        let mut records = self.hydrate(models).await?;

        if let Some(TitleOrder {
            field: TitleOrderField::Rating,
            descending,
        }) = order
        {
            records.sort_by(|a, b| {
                let left = a.rating.unwrap_or(f64::NEG_INFINITY);
                let right = b.rating.unwrap_or(f64::NEG_INFINITY);
                let cmp = left.total_cmp(&right);
                if descending { cmp.reverse() } else { cmp }
            });
            let start = usize::try_from(offset).unwrap_or(usize::MAX).min(records.len());
            let end = start
                .saturating_add(usize::try_from(limit).unwrap_or(usize::MAX))
                .min(records.len());
            records = records[start..end].to_vec();
        }

        Ok((records, count))
    }

    pub async fn get(&self, id: i32) -> Result<Option<TitleRecord>> {
        let Some((title, category)) = titles::Entity::find_by_id(id)
            .find_also_related(categories::Entity)
            .one(&self.conn)
            .await
            .context("Failed to query title")?
        else {
            return Ok(None);
        };

        let genre_rows = title
            .find_related(genres::Entity)
            .all(&self.conn)
            .await
            .context("Failed to query genres for title")?;

        let rating = self.rating_for(id).await?;

        Ok(Some(TitleRecord {
            title,
            category,
            genres: genre_rows,
            rating,
        }))
    }

    /// Bare row without references or rating, for parent-existence checks.
    pub async fn get_model(&self, id: i32) -> Result<Option<titles::Model>> {
        titles::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query title")
    }

    pub async fn exists(&self, id: i32) -> Result<bool> {
        let count = titles::Entity::find_by_id(id)
            .count(&self.conn)
            .await
            .context("Failed to check title existence")?;
        Ok(count > 0)
    }

    pub async fn create(&self, new_title: NewTitle) -> Result<i32> {
        let txn = self.conn.begin().await?;

        let title = titles::ActiveModel {
            name: Set(new_title.name),
            year: Set(new_title.year),
            description: Set(new_title.description),
            category_id: Set(Some(new_title.category_id)),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .context("Failed to insert title")?;

        for genre_id in new_title.genre_ids {
            genre_titles::ActiveModel {
                title_id: Set(title.id),
                genre_id: Set(genre_id),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .context("Failed to link genre to title")?;
        }

        txn.commit().await?;
        Ok(title.id)
    }

    pub async fn update(&self, id: i32, update: TitleUpdate) -> Result<bool> {
        let Some(title) = titles::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query title for update")?
        else {
            return Ok(false);
        };

        let txn = self.conn.begin().await?;

        let mut active: titles::ActiveModel = title.into();
        if let Some(name) = update.name {
            active.name = Set(name);
        }
        if let Some(year) = update.year {
            active.year = Set(year);
        }
        if let Some(description) = update.description {
            active.description = Set(description);
        }
        if let Some(category_id) = update.category_id {
            active.category_id = Set(Some(category_id));
        }
        active.update(&txn).await.context("Failed to update title")?;

        if let Some(genre_ids) = update.genre_ids {
            genre_titles::Entity::delete_many()
                .filter(genre_titles::Column::TitleId.eq(id))
                .exec(&txn)
                .await?;
            for genre_id in genre_ids {
                genre_titles::ActiveModel {
                    title_id: Set(id),
                    genre_id: Set(genre_id),
                    ..Default::default()
                }
                .insert(&txn)
                .await
                .context("Failed to link genre to title")?;
            }
        }

        txn.commit().await?;
        Ok(true)
    }

    /// Delete a title together with its reviews and their comments.
    pub async fn delete(&self, id: i32) -> Result<bool> {
        let txn = self.conn.begin().await?;

        comments::Entity::delete_many()
            .filter(
                comments::Column::ReviewId.in_subquery(
                    Query::select()
                        .column(reviews::Column::Id)
                        .from(reviews::Entity)
                        .and_where(reviews::Column::TitleId.eq(id))
                        .to_owned(),
                ),
            )
            .exec(&txn)
            .await?;

        reviews::Entity::delete_many()
            .filter(reviews::Column::TitleId.eq(id))
            .exec(&txn)
            .await?;

        genre_titles::Entity::delete_many()
            .filter(genre_titles::Column::TitleId.eq(id))
            .exec(&txn)
            .await?;

        let result = titles::Entity::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;
        Ok(result.rows_affected > 0)
    }

    /// Average review score, `None` when the title has no reviews.
    pub async fn rating_for(&self, title_id: i32) -> Result<Option<f64>> {
        let rating: Option<Option<f64>> = reviews::Entity::find()
            .select_only()
            .column_as(
                SimpleExpr::from(Func::avg(Expr::col(reviews::Column::Score))),
                "rating",
            )
            .filter(reviews::Column::TitleId.eq(title_id))
            .into_tuple()
            .one(&self.conn)
            .await
            .context("Failed to aggregate rating")?;

        Ok(rating.flatten())
    }

    async fn ratings_for(&self, title_ids: &[i32]) -> Result<HashMap<i32, f64>> {
        if title_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(i32, Option<f64>)> = reviews::Entity::find()
            .select_only()
            .column(reviews::Column::TitleId)
            .column_as(
                SimpleExpr::from(Func::avg(Expr::col(reviews::Column::Score))),
                "rating",
            )
            .filter(reviews::Column::TitleId.is_in(title_ids.to_vec()))
            .group_by(reviews::Column::TitleId)
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to aggregate ratings")?;

        Ok(rows
            .into_iter()
            .filter_map(|(id, rating)| rating.map(|r| (id, r)))
            .collect())
    }

    /// Build the filtered select, resolving slug filters first.
    /// Returns `None` when a slug filter matched no record.
    async fn filtered_query(&self, filter: &TitleFilter) -> Result<Option<Select<titles::Entity>>> {
        let mut query = titles::Entity::find();

        if let Some(slug) = &filter.category {
            let Some(category) = CategoryRepository::new(self.conn.clone())
                .get_by_slug(slug)
                .await?
            else {
                return Ok(None);
            };
            query = query.filter(titles::Column::CategoryId.eq(category.id));
        }

        if let Some(slug) = &filter.genre {
            let Some(genre) = GenreRepository::new(self.conn.clone()).get_by_slug(slug).await?
            else {
                return Ok(None);
            };
            query = query.filter(
                titles::Column::Id.in_subquery(
                    Query::select()
                        .column(genre_titles::Column::TitleId)
                        .from(genre_titles::Entity)
                        .and_where(genre_titles::Column::GenreId.eq(genre.id))
                        .to_owned(),
                ),
            );
        }

        if let Some(name) = &filter.name {
            query = query.filter(titles::Column::Name.contains(name));
        }

        if let Some(year) = filter.year {
            query = query.filter(titles::Column::Year.eq(year));
        }

        Ok(Some(query))
    }

    /// Attach categories, genres and ratings to a page of title models.
    async fn hydrate(&self, models: Vec<titles::Model>) -> Result<Vec<TitleRecord>> {
        if models.is_empty() {
            return Ok(Vec::new());
        }

        let title_ids: Vec<i32> = models.iter().map(|t| t.id).collect();
        let category_ids: Vec<i32> = models.iter().filter_map(|t| t.category_id).collect();

        let categories_by_id: HashMap<i32, categories::Model> = if category_ids.is_empty() {
            HashMap::new()
        } else {
            categories::Entity::find()
                .filter(categories::Column::Id.is_in(category_ids))
                .all(&self.conn)
                .await
                .context("Failed to query categories for titles")?
                .into_iter()
                .map(|c| (c.id, c))
                .collect()
        };

        let mut genres_by_title: HashMap<i32, Vec<genres::Model>> = HashMap::new();
        let links = genre_titles::Entity::find()
            .filter(genre_titles::Column::TitleId.is_in(title_ids.clone()))
            .find_also_related(genres::Entity)
            .all(&self.conn)
            .await
            .context("Failed to query genres for titles")?;
        for (link, genre) in links {
            if let Some(genre) = genre {
                genres_by_title.entry(link.title_id).or_default().push(genre);
            }
        }

        let ratings = self.ratings_for(&title_ids).await?;

        Ok(models
            .into_iter()
            .map(|title| {
                let category = title.category_id.and_then(|id| categories_by_id.get(&id).cloned());
                let genre_rows = genres_by_title.remove(&title.id).unwrap_or_default();
                let rating = ratings.get(&title.id).copied();
                TitleRecord {
                    title,
                    category,
                    genres: genre_rows,
                    rating,
                }
            })
            .collect())
    }
}
