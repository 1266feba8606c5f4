//! Lending ledger service: borrow, return, pre-book and inventory
//! adjustment, with the cross-entity quantity invariants enforced through
//! the repository's per-book transactions.

use chrono::Utc;
use rust_decimal::Decimal;

use crate::{
    config::LendingConfig,
    error::{AppError, AppResult},
    models::{
        book::Book,
        loan::{BorrowedBook, Loan, LoanDetails},
        prebooking::{Prebooking, PrebookingEntry},
        user::{User, UserClaims},
    },
    repository::Repository,
    services::fine,
};

/// Outcome of a return: the closed loan plus the amount owed
/// (book price + fine).
pub struct ReturnOutcome {
    pub loan: Loan,
    pub fine: Decimal,
    pub total_due: Decimal,
}

#[derive(Clone)]
pub struct LendingService {
    repository: Repository,
    policy: LendingConfig,
}

impl LendingService {
    pub fn new(repository: Repository, policy: LendingConfig) -> Self {
        Self { repository, policy }
    }

    /// Record a borrow for the user with the given email (staff operation,
    /// also the conversion path for pre-bookings).
    pub async fn borrow(&self, book_id: i32, email: &str) -> AppResult<Loan> {
        let user = self.find_verified_user(email).await?;

        self.repository
            .loans
            .borrow(
                book_id,
                user.id,
                self.policy.loan_period_days,
                self.policy.lock_timeout_ms,
            )
            .await
    }

    /// Return a borrowed book. The caller must be the borrower or staff.
    pub async fn return_loan(&self, loan_id: i32, claims: &UserClaims) -> AppResult<ReturnOutcome> {
        let loan = self.repository.loans.get_by_id(loan_id).await?;
        claims.require_self_or_staff(loan.user_id)?;

        if !loan.is_open() {
            return Err(AppError::Conflict("Loan already returned".to_string()));
        }

        let now = Utc::now();
        let fine = fine::fine_for(loan.due_date, now, self.policy.fine_per_hour);

        let closed = self
            .repository
            .loans
            .close(loan_id, now, fine, self.policy.lock_timeout_ms)
            .await?;

        let book = self.repository.books.get_by_id(closed.book_id).await?;

        Ok(ReturnOutcome {
            loan: closed,
            fine,
            total_due: book.price + fine,
        })
    }

    /// Reserve a future copy for a verified user
    pub async fn prebook(&self, book_id: i32, user_id: i32) -> AppResult<Prebooking> {
        let user = self.repository.users.get_by_id(user_id).await?;
        if !user.is_verified() {
            return Err(AppError::Forbidden(
                "Identity verification required to pre-book".to_string(),
            ));
        }

        self.repository
            .prebookings
            .create(
                book_id,
                user_id,
                self.policy.prebooking_ttl_hours,
                self.policy.lock_timeout_ms,
            )
            .await
    }

    /// Cancel the caller's reservation for a book
    pub async fn cancel_prebooking(&self, book_id: i32, user_id: i32) -> AppResult<()> {
        self.repository.prebookings.cancel(book_id, user_id).await
    }

    /// Active reservation queue for a book (staff view)
    pub async fn prebooking_queue(&self, book_id: i32) -> AppResult<Vec<PrebookingEntry>> {
        self.repository.books.get_by_id(book_id).await?;
        self.repository
            .prebookings
            .list_active_for_book(book_id, self.policy.prebooking_ttl_hours)
            .await
    }

    /// Adjust a book's shelf and owned copy counts together by `delta` (±1)
    pub async fn adjust_inventory(&self, book_id: i32, delta: i32) -> AppResult<Book> {
        self.repository
            .books
            .adjust_inventory(
                book_id,
                delta,
                self.policy.prebooking_ttl_hours,
                self.policy.lock_timeout_ms,
            )
            .await
    }

    /// The caller's borrow history, computed from the loans table
    pub async fn borrowed_books(&self, user_id: i32) -> AppResult<Vec<BorrowedBook>> {
        self.repository.loans.list_borrowed_by_user(user_id).await
    }

    /// Loan history for a book (staff view)
    pub async fn book_loans(&self, book_id: i32) -> AppResult<Vec<LoanDetails>> {
        self.repository.books.get_by_id(book_id).await?;
        self.repository.loans.list_for_book(book_id).await
    }

    /// Overdue, un-notified open loans for the external notification sweep
    pub async fn overdue_loans(&self) -> AppResult<Vec<LoanDetails>> {
        self.repository.loans.find_overdue_unnotified().await
    }

    /// Flag an overdue loan as notified (sweep write-back)
    pub async fn mark_notified(&self, loan_id: i32) -> AppResult<()> {
        self.repository.loans.mark_notified(loan_id).await
    }

    /// Purge expired prebooking rows; returns the number removed
    pub async fn purge_expired_prebookings(&self) -> AppResult<u64> {
        self.repository
            .prebookings
            .purge_expired(self.policy.prebooking_ttl_hours)
            .await
    }

    async fn find_verified_user(&self, email: &str) -> AppResult<User> {
        let user = self
            .repository
            .users
            .get_by_email(email)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with email {} not found", email)))?;

        if !user.is_verified() {
            return Err(AppError::Forbidden(
                "User identity is not verified".to_string(),
            ));
        }
        Ok(user)
    }
}
