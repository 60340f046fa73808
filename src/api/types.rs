use serde::{Deserialize, Serialize};

use crate::constants::pagination;
use crate::db::TitleRecord;
use crate::entities::{categories, comments, genres, reviews, users};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Limit/offset page of a list endpoint.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub count: u64,
    pub results: Vec<T>,
}

/// Resolved (limit, offset) with defaults applied and the limit capped.
#[must_use]
pub fn resolve_page(limit: Option<u64>, offset: Option<u64>) -> (u64, u64) {
    let limit = limit
        .unwrap_or(pagination::DEFAULT_LIMIT)
        .clamp(1, pagination::MAX_LIMIT);
    (limit, offset.unwrap_or(0))
}

/// Common `?limit=&offset=` query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl PageQuery {
    #[must_use]
    pub fn resolve(&self) -> (u64, u64) {
        resolve_page(self.limit, self.offset)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryDto {
    pub name: String,
    pub slug: String,
}

impl From<categories::Model> for CategoryDto {
    fn from(model: categories::Model) -> Self {
        Self {
            name: model.name,
            slug: model.slug,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GenreDto {
    pub name: String,
    pub slug: String,
}

impl From<genres::Model> for GenreDto {
    fn from(model: genres::Model) -> Self {
        Self {
            name: model.name,
            slug: model.slug,
        }
    }
}

/// Read representation of a title; writes respond with this as well,
/// fetched back after the mutation.
#[derive(Debug, Serialize)]
pub struct TitleDto {
    pub id: i32,
    pub name: String,
    pub year: i32,
    pub rating: Option<f64>,
    pub description: String,
    pub category: Option<CategoryDto>,
    pub genre: Vec<GenreDto>,
}

impl From<TitleRecord> for TitleDto {
    fn from(record: TitleRecord) -> Self {
        Self {
            id: record.title.id,
            name: record.title.name,
            year: record.title.year,
            rating: record.rating,
            description: record.title.description,
            category: record.category.map(CategoryDto::from),
            genre: record.genres.into_iter().map(GenreDto::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReviewDto {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub text: String,
    pub score: i16,
    pub pub_date: String,
}

impl ReviewDto {
    #[must_use]
    pub fn new(review: reviews::Model, author: Option<users::Model>, title_name: &str) -> Self {
        Self {
            id: review.id,
            title: title_name.to_string(),
            author: author.map(|u| u.username).unwrap_or_default(),
            text: review.text,
            score: review.score,
            pub_date: review.pub_date,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CommentDto {
    pub id: i32,
    pub author: String,
    pub text: String,
    pub pub_date: String,
}

impl CommentDto {
    #[must_use]
    pub fn new(comment: comments::Model, author: Option<users::Model>) -> Self {
        Self {
            id: comment.id,
            author: author.map(|u| u.username).unwrap_or_default(),
            text: comment.text,
            pub_date: comment.pub_date,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserDto {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub bio: String,
    pub role: String,
}

impl From<users::Model> for UserDto {
    fn from(model: users::Model) -> Self {
        Self {
            username: model.username,
            email: model.email,
            first_name: model.first_name,
            last_name: model.last_name,
            bio: model.bio,
            role: model.role,
        }
    }
}
