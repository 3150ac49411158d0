//! Book model and related types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Book with the names of its authors and genres
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub publication_date: Option<NaiveDate>,
    /// Copies currently on the shelf
    pub available_copies: i32,
    pub genres: Vec<String>,
    pub authors: Vec<String>,
}

/// Book search filters
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
pub struct BookQuery {
    /// Case-insensitive title fragment
    pub title: Option<String>,
    /// Exact author name
    pub author: Option<String>,
    /// Exact genre name
    pub genre: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Create book request, authors and genres are referenced by name
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, max = 255, message = "Title must be 1 to 255 characters"))]
    pub title: String,
    pub description: Option<String>,
    pub publication_date: Option<NaiveDate>,
    #[validate(range(min = 0, message = "Available copies cannot be negative"))]
    pub available_copies: i32,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub authors: Vec<String>,
}

/// Update book request
///
/// Absent fields are left untouched; a non-empty `genres` or `authors`
/// list replaces the current associations.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[validate(length(min = 1, max = 255, message = "Title must be 1 to 255 characters"))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub publication_date: Option<NaiveDate>,
    #[validate(range(min = 0, message = "Available copies cannot be negative"))]
    pub available_copies: Option<i32>,
    pub genres: Option<Vec<String>>,
    pub authors: Option<Vec<String>>,
}
