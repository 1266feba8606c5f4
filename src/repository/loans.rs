//! Loans repository: the ledger of open and historical borrows.
//!
//! Every mutation here runs inside a transaction that locks the book row
//! first, so that `books.quantity` always equals `total_copies` minus the
//! number of open loans once the transaction commits.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::loan::{BorrowedBook, Loan, LoanDetails},
    repository::books::BooksRepository,
};

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Postgres>,
}

impl LoansRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get loan by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Loan> {
        sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", id)))
    }

    /// Record a borrow: one transaction that decrements the book's shelf
    /// count and opens the loan.
    ///
    /// The book row is locked up front; concurrent borrows of the last copy
    /// therefore serialize, and the loser sees `quantity == 0` and gets a
    /// Conflict. The borrower's active prebooking for this book, if any, is
    /// consumed by the same transaction.
    pub async fn borrow(
        &self,
        book_id: i32,
        user_id: i32,
        loan_period_days: i64,
        lock_timeout_ms: u64,
    ) -> AppResult<Loan> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        super::set_lock_timeout(&mut tx, lock_timeout_ms).await?;

        let book = BooksRepository::get_for_update(&mut tx, book_id).await?;

        if !book.is_available() {
            return Err(AppError::Conflict("Book is not available".to_string()));
        }

        let already_borrowed: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM loans WHERE user_id = $1 AND book_id = $2 AND returned_date IS NULL)",
        )
        .bind(user_id)
        .bind(book_id)
        .fetch_one(&mut *tx)
        .await?;

        if already_borrowed {
            return Err(AppError::Conflict(
                "User has already borrowed this book".to_string(),
            ));
        }

        let due_date = now + Duration::days(loan_period_days);

        let loan = sqlx::query_as::<_, Loan>(
            r#"
            INSERT INTO loans (user_id, book_id, created_at, due_date)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(book_id)
        .bind(now)
        .bind(due_date)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE books SET quantity = quantity - 1 WHERE id = $1")
            .bind(book_id)
            .execute(&mut *tx)
            .await?;

        // Consume the reservation this borrow fulfils (if one exists) so it
        // cannot linger until TTL expiry
        sqlx::query("DELETE FROM prebookings WHERE book_id = $1 AND user_id = $2")
            .bind(book_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(loan)
    }

    /// Close a loan: set `returned_date` and `fine` exactly once and put the
    /// copy back on the shelf, all in one transaction.
    ///
    /// The open-ness check is re-done under the book lock, so a concurrent
    /// double return leaves exactly one closed loan and one increment.
    pub async fn close(
        &self,
        loan_id: i32,
        returned_date: DateTime<Utc>,
        fine: Decimal,
        lock_timeout_ms: u64,
    ) -> AppResult<Loan> {
        let mut tx = self.pool.begin().await?;
        super::set_lock_timeout(&mut tx, lock_timeout_ms).await?;

        let loan = sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1")
            .bind(loan_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", loan_id)))?;

        // Lock ordering: book row first, same as borrow
        BooksRepository::get_for_update(&mut tx, loan.book_id).await?;

        let open = sqlx::query_as::<_, Loan>(
            "SELECT * FROM loans WHERE id = $1 AND returned_date IS NULL FOR UPDATE",
        )
        .bind(loan_id)
        .fetch_optional(&mut *tx)
        .await?;

        if open.is_none() {
            return Err(AppError::Conflict("Loan already returned".to_string()));
        }

        let closed = sqlx::query_as::<_, Loan>(
            r#"
            UPDATE loans SET returned_date = $2, fine = $3
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(loan_id)
        .bind(returned_date)
        .bind(fine)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE books SET quantity = quantity + 1 WHERE id = $1")
            .bind(loan.book_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(closed)
    }

    /// Per-user borrowed-book view, computed by query (no denormalized cache)
    pub async fn list_borrowed_by_user(&self, user_id: i32) -> AppResult<Vec<BorrowedBook>> {
        let rows = sqlx::query_as::<_, BorrowedBook>(
            r#"
            SELECT l.id as loan_id, l.book_id, b.title as book_title,
                   l.returned_date IS NOT NULL as returned,
                   l.created_at as borrowed_date, l.due_date, l.fine
            FROM loans l
            JOIN books b ON b.id = l.book_id
            WHERE l.user_id = $1
            ORDER BY l.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Full loan history for a book (staff view)
    pub async fn list_for_book(&self, book_id: i32) -> AppResult<Vec<LoanDetails>> {
        let rows = sqlx::query_as::<_, LoanDetails>(
            r#"
            SELECT l.id, l.book_id, b.title as book_title,
                   l.user_id, u.name as user_name, u.email as user_email,
                   l.created_at, l.due_date, l.returned_date, l.fine, l.notified,
                   (l.returned_date IS NULL AND l.due_date < NOW()) as is_overdue
            FROM loans l
            JOIN books b ON b.id = l.book_id
            JOIN users u ON u.id = l.user_id
            WHERE l.book_id = $1
            ORDER BY l.created_at DESC
            "#,
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Open, overdue, not-yet-notified loans. This is the read interface the
    /// external notification sweep consumes.
    pub async fn find_overdue_unnotified(&self) -> AppResult<Vec<LoanDetails>> {
        let rows = sqlx::query_as::<_, LoanDetails>(
            r#"
            SELECT l.id, l.book_id, b.title as book_title,
                   l.user_id, u.name as user_name, u.email as user_email,
                   l.created_at, l.due_date, l.returned_date, l.fine, l.notified,
                   TRUE as is_overdue
            FROM loans l
            JOIN books b ON b.id = l.book_id
            JOIN users u ON u.id = l.user_id
            WHERE l.returned_date IS NULL AND l.due_date < NOW() AND NOT l.notified
            ORDER BY l.due_date
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Sweep write-back: flag an overdue loan as notified
    pub async fn mark_notified(&self, loan_id: i32) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE loans SET notified = TRUE WHERE id = $1 AND returned_date IS NULL",
        )
        .bind(loan_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Open loan with id {} not found",
                loan_id
            )));
        }
        Ok(())
    }
}
