//! Prebookings repository: advisory reservations with a passive TTL.
//!
//! A prebooking never touches `books.quantity`; the invariant enforced here
//! is that the number of active (non-expired) reservations for a book stays
//! within its shelf count. Expiry is store-driven: every query filters on
//! `created_at`, and the background reaper purges stale rows.

use chrono::{DateTime, Duration, Utc};
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::prebooking::{Prebooking, PrebookingEntry},
    repository::books::BooksRepository,
};

#[derive(Clone)]
pub struct PrebookingsRepository {
    pool: Pool<Postgres>,
}

fn active_cutoff(ttl_hours: i64) -> DateTime<Utc> {
    Utc::now() - Duration::hours(ttl_hours)
}

impl PrebookingsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Reserve a future copy of a book for a user.
    ///
    /// Runs under the book row lock so the reservation count check and the
    /// insert are atomic against concurrent pre-books, borrows and inventory
    /// decrements on the same book.
    pub async fn create(
        &self,
        book_id: i32,
        user_id: i32,
        ttl_hours: i64,
        lock_timeout_ms: u64,
    ) -> AppResult<Prebooking> {
        let cutoff = active_cutoff(ttl_hours);
        let mut tx = self.pool.begin().await?;
        super::set_lock_timeout(&mut tx, lock_timeout_ms).await?;

        let book = BooksRepository::get_for_update(&mut tx, book_id).await?;

        if !book.is_available() {
            return Err(AppError::Conflict("Book is out of stock".to_string()));
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

        let already_prebooked: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM prebookings WHERE book_id = $1 AND user_id = $2 AND created_at >= $3)",
        )
        .bind(book_id)
        .bind(user_id)
        .bind(cutoff)
        .fetch_one(&mut *tx)
        .await?;

        if already_prebooked {
            return Err(AppError::Conflict(
                "Book is already pre-booked by this user".to_string(),
            ));
        }

        let active: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM prebookings WHERE book_id = $1 AND created_at >= $2",
        )
        .bind(book_id)
        .bind(cutoff)
        .fetch_one(&mut *tx)
        .await?;

        if active >= book.quantity as i64 {
            return Err(AppError::Conflict(
                "Book is fully reserved".to_string(),
            ));
        }

        // Replace the user's own expired row, if any, before inserting
        // against the (book_id, user_id) unique constraint
        sqlx::query("DELETE FROM prebookings WHERE book_id = $1 AND user_id = $2")
            .bind(book_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let prebooking = sqlx::query_as::<_, Prebooking>(
            r#"
            INSERT INTO prebookings (book_id, user_id, created_at)
            VALUES ($1, $2, NOW())
            RETURNING *
            "#,
        )
        .bind(book_id)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(prebooking)
    }

    /// Cancel a user's reservation for a book
    pub async fn cancel(&self, book_id: i32, user_id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM prebookings WHERE book_id = $1 AND user_id = $2")
            .bind(book_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(
                "No pre-booking for this book".to_string(),
            ));
        }
        Ok(())
    }

    /// Active reservation queue for a book, oldest first (staff view)
    pub async fn list_active_for_book(
        &self,
        book_id: i32,
        ttl_hours: i64,
    ) -> AppResult<Vec<PrebookingEntry>> {
        let cutoff = active_cutoff(ttl_hours);
        let entries = sqlx::query_as::<_, PrebookingEntry>(
            r#"
            SELECT p.id, p.book_id, p.user_id, u.name as user_name, u.email as user_email,
                   p.created_at, p.created_at + make_interval(hours => $3::int) as expires_at
            FROM prebookings p
            JOIN users u ON u.id = p.user_id
            WHERE p.book_id = $1 AND p.created_at >= $2
            ORDER BY p.created_at
            "#,
        )
        .bind(book_id)
        .bind(cutoff)
        .bind(ttl_hours as i32)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Delete expired reservation rows; returns how many were purged.
    /// Invoked by the background reaper task.
    pub async fn purge_expired(&self, ttl_hours: i64) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM prebookings WHERE created_at < $1")
            .bind(active_cutoff(ttl_hours))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
