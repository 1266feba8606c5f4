//! Loan (borrow record) model and related types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Loan model from database.
///
/// A loan is open while `returned_date` is null; `returned_date` and `fine`
/// are set exactly once, on return. Loans are never deleted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Loan {
    pub id: i32,
    pub user_id: i32,
    pub book_id: i32,
    pub created_at: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub returned_date: Option<DateTime<Utc>>,
    #[schema(value_type = Option<String>)]
    pub fine: Option<Decimal>,
    pub notified: bool,
}

impl Loan {
    pub fn is_open(&self) -> bool {
        self.returned_date.is_none()
    }
}

/// Loan with borrower and book context, for staff views
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct LoanDetails {
    pub id: i32,
    pub book_id: i32,
    pub book_title: String,
    pub user_id: i32,
    pub user_name: String,
    pub user_email: String,
    pub created_at: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub returned_date: Option<DateTime<Utc>>,
    #[schema(value_type = Option<String>)]
    pub fine: Option<Decimal>,
    pub notified: bool,
    pub is_overdue: bool,
}

/// Per-user borrowed-book view, computed by query from the loans table
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BorrowedBook {
    pub loan_id: i32,
    pub book_id: i32,
    pub book_title: String,
    pub returned: bool,
    pub borrowed_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    #[schema(value_type = Option<String>)]
    pub fine: Option<Decimal>,
}
