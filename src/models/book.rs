//! Book (catalog entry) model and related types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Book model from database.
///
/// `quantity` is the number of copies currently on shelf; `total_copies` is
/// the number of copies owned regardless of loan state. The schema enforces
/// `0 <= quantity <= total_copies`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub description: Option<String>,
    #[schema(value_type = String)]
    pub price: Decimal,
    pub quantity: i32,
    pub total_copies: i32,
    pub created_at: DateTime<Utc>,
}

impl Book {
    pub fn is_available(&self) -> bool {
        self.quantity > 0
    }
}

/// Create book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, max = 512))]
    pub title: String,
    #[validate(length(min = 1, max = 256))]
    pub author: String,
    pub description: Option<String>,
    #[schema(value_type = String)]
    pub price: Decimal,
    #[validate(range(min = 0))]
    pub total_copies: i32,
}

/// Update book request (all fields optional)
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[validate(length(min = 1, max = 512))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 256))]
    pub author: Option<String>,
    pub description: Option<String>,
    #[schema(value_type = Option<String>)]
    pub price: Option<Decimal>,
}

/// Book search query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct BookQuery {
    /// Search in title or author
    pub search: Option<String>,
    /// Only books with at least one copy on shelf
    pub available: Option<bool>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book_with_quantity(quantity: i32) -> Book {
        Book {
            id: 1,
            title: "Title".to_string(),
            author: "Author".to_string(),
            description: None,
            price: Decimal::new(1250, 2),
            quantity,
            total_copies: 2,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn availability_follows_shelf_count() {
        assert!(book_with_quantity(1).is_available());
        assert!(!book_with_quantity(0).is_available());
    }
}
