//! Borrow and return endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::AppResult,
    models::loan::{BorrowedBook, LoanDetails},
};

use super::AuthenticatedUser;

/// Record borrow request: the member the loan is for, chosen from the
/// pre-booking queue or entered manually by staff
#[derive(Deserialize, Validate, ToSchema)]
pub struct RecordBorrowRequest {
    #[validate(email)]
    pub email: String,
}

/// Borrow confirmation
#[derive(Serialize, ToSchema)]
pub struct BorrowResponse {
    pub success: bool,
    pub message: String,
    pub loan_id: i32,
    pub due_date: DateTime<Utc>,
}

/// Return confirmation with the computed amounts
#[derive(Serialize, ToSchema)]
pub struct ReturnResponse {
    pub success: bool,
    pub message: String,
    pub loan_id: i32,
    #[schema(value_type = String)]
    pub fine: Decimal,
    #[schema(value_type = String)]
    pub total_due: Decimal,
}

/// Generic success message
#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

/// Record a borrow for a member (staff). This is also the conversion path
/// for pre-bookings: any active reservation held by the member for this book
/// is consumed by the same transaction.
#[utoipa::path(
    post,
    path = "/borrow/record-borrow-book/{book_id}",
    tag = "borrows",
    security(("bearer_auth" = [])),
    params(
        ("book_id" = i32, Path, description = "Book ID")
    ),
    request_body = RecordBorrowRequest,
    responses(
        (status = 201, description = "Borrow recorded", body = BorrowResponse),
        (status = 403, description = "Staff role required or member not verified"),
        (status = 404, description = "Book or user not found"),
        (status = 409, description = "Book unavailable or already borrowed by this member")
    )
)]
pub async fn record_borrow(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(book_id): Path<i32>,
    Json(request): Json<RecordBorrowRequest>,
) -> AppResult<(StatusCode, Json<BorrowResponse>)> {
    claims.require_staff()?;
    request.validate()?;

    let loan = state.services.lending.borrow(book_id, &request.email).await?;

    Ok((
        StatusCode::CREATED,
        Json(BorrowResponse {
            success: true,
            message: format!("Book borrowed successfully, due {}", loan.due_date.format("%Y-%m-%d %H:%M")),
            loan_id: loan.id,
            due_date: loan.due_date,
        }),
    ))
}

/// Return a borrowed book. The caller must be the borrower or staff.
#[utoipa::path(
    put,
    path = "/borrow/return-borrowed-book/{loan_id}",
    tag = "borrows",
    security(("bearer_auth" = [])),
    params(
        ("loan_id" = i32, Path, description = "Loan ID")
    ),
    responses(
        (status = 200, description = "Book returned", body = ReturnResponse),
        (status = 403, description = "Not the borrower or staff"),
        (status = 404, description = "Loan not found"),
        (status = 409, description = "Loan already returned")
    )
)]
pub async fn return_borrowed(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(loan_id): Path<i32>,
) -> AppResult<Json<ReturnResponse>> {
    let outcome = state.services.lending.return_loan(loan_id, &claims).await?;

    Ok(Json(ReturnResponse {
        success: true,
        message: format!(
            "Book returned. Fine: {}, total charges (price + fine): {}",
            outcome.fine, outcome.total_due
        ),
        loan_id: outcome.loan.id,
        fine: outcome.fine,
        total_due: outcome.total_due,
    }))
}

/// The caller's borrow history, computed from the loans ledger
#[utoipa::path(
    get,
    path = "/borrow/my-borrowed-books",
    tag = "borrows",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Caller's borrowed books", body = Vec<BorrowedBook>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn my_borrowed_books(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<BorrowedBook>>> {
    let books = state.services.lending.borrowed_books(claims.sub).await?;
    Ok(Json(books))
}

/// Loan history for a book
#[utoipa::path(
    get,
    path = "/borrow/book/{book_id}",
    tag = "borrows",
    security(("bearer_auth" = [])),
    params(
        ("book_id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Loan history", body = Vec<LoanDetails>),
        (status = 403, description = "Staff role required"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn book_loans(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(book_id): Path<i32>,
) -> AppResult<Json<Vec<LoanDetails>>> {
    claims.require_staff()?;

    let loans = state.services.lending.book_loans(book_id).await?;
    Ok(Json(loans))
}

/// Open, overdue, un-notified loans — the read interface consumed by the
/// external notification sweep
#[utoipa::path(
    get,
    path = "/borrow/overdue",
    tag = "borrows",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Overdue loans pending notification", body = Vec<LoanDetails>),
        (status = 403, description = "Staff role required")
    )
)]
pub async fn overdue_loans(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<LoanDetails>>> {
    claims.require_staff()?;

    let loans = state.services.lending.overdue_loans().await?;
    Ok(Json(loans))
}

/// Flag an overdue loan as notified (sweep write-back)
#[utoipa::path(
    put,
    path = "/borrow/mark-notified/{loan_id}",
    tag = "borrows",
    security(("bearer_auth" = [])),
    params(
        ("loan_id" = i32, Path, description = "Loan ID")
    ),
    responses(
        (status = 200, description = "Loan flagged as notified", body = MessageResponse),
        (status = 403, description = "Staff role required"),
        (status = 404, description = "Open loan not found")
    )
)]
pub async fn mark_notified(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(loan_id): Path<i32>,
) -> AppResult<Json<MessageResponse>> {
    claims.require_staff()?;

    state.services.lending.mark_notified(loan_id).await?;
    Ok(Json(MessageResponse {
        success: true,
        message: "Loan flagged as notified".to_string(),
    }))
}
