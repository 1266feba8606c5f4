//! Books repository for database operations

use chrono::{Duration, Utc};
use sqlx::{Pool, Postgres, Transaction};

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, BookQuery, CreateBook, UpdateBook},
        user::User,
    },
};

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Lock a book row for the duration of the enclosing transaction.
    ///
    /// Every operation that touches a book's quantity goes through this,
    /// which linearizes all mutations of one book while letting operations
    /// on different books proceed in parallel.
    pub(crate) async fn get_for_update(
        tx: &mut Transaction<'_, Postgres>,
        id: i32,
    ) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Search books with pagination
    pub async fn search(&self, query: &BookQuery) -> AppResult<(Vec<Book>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * per_page;

        let pattern = query
            .search
            .as_ref()
            .map(|s| format!("%{}%", s.to_lowercase()));
        let available_only = query.available.unwrap_or(false);

        let books = sqlx::query_as::<_, Book>(
            r#"
            SELECT * FROM books
            WHERE ($1::text IS NULL OR LOWER(title) LIKE $1 OR LOWER(author) LIKE $1)
              AND (NOT $2 OR quantity > 0)
            ORDER BY title
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(&pattern)
        .bind(available_only)
        .bind(per_page)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM books
            WHERE ($1::text IS NULL OR LOWER(title) LIKE $1 OR LOWER(author) LIKE $1)
              AND (NOT $2 OR quantity > 0)
            "#,
        )
        .bind(&pattern)
        .bind(available_only)
        .fetch_one(&self.pool)
        .await?;

        Ok((books, total))
    }

    /// Create a new book. All copies start on the shelf.
    pub async fn create(&self, book: &CreateBook) -> AppResult<Book> {
        let created = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (title, author, description, price, quantity, total_copies)
            VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING *
            "#,
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.description)
        .bind(book.price)
        .bind(book.total_copies)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    /// Update book metadata (title/author/description/price only; copy counts
    /// change exclusively through `adjust_inventory`)
    pub async fn update(&self, id: i32, book: &UpdateBook) -> AppResult<Book> {
        let updated = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books SET
                title = COALESCE($2, title),
                author = COALESCE($3, author),
                description = COALESCE($4, description),
                price = COALESCE($5, price)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.description)
        .bind(book.price)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))?;

        Ok(updated)
    }

    /// Delete a book. Loan records are never deleted, so a book with any
    /// loan history (open or closed) cannot be removed.
    pub async fn delete(&self, id: i32, lock_timeout_ms: u64) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;
        super::set_lock_timeout(&mut tx, lock_timeout_ms).await?;

        Self::get_for_update(&mut tx, id).await?;

        let loans: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM loans WHERE book_id = $1")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        if loans > 0 {
            return Err(AppError::Conflict(
                "Cannot delete a book with loan records".to_string(),
            ));
        }

        sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Adjust `quantity` and `total_copies` together by `delta` (±1).
    ///
    /// Decrements are rejected when the shelf count would go negative, or
    /// when they would leave more active reservations than copies on shelf.
    pub async fn adjust_inventory(
        &self,
        id: i32,
        delta: i32,
        prebooking_ttl_hours: i64,
        lock_timeout_ms: u64,
    ) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;
        super::set_lock_timeout(&mut tx, lock_timeout_ms).await?;

        let book = Self::get_for_update(&mut tx, id).await?;

        let new_quantity = book.quantity + delta;
        let new_total = book.total_copies + delta;
        if new_quantity < 0 || new_total < 0 {
            return Err(AppError::Conflict(
                "Cannot decrement: no copies on shelf".to_string(),
            ));
        }

        if delta < 0 {
            let cutoff = Utc::now() - Duration::hours(prebooking_ttl_hours);
            let reserved: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM prebookings WHERE book_id = $1 AND created_at >= $2",
            )
            .bind(id)
            .bind(cutoff)
            .fetch_one(&mut *tx)
            .await?;

            if reserved > new_quantity as i64 {
                return Err(AppError::Conflict(
                    "Cannot decrement: copies are reserved by active pre-bookings".to_string(),
                ));
            }
        }

        let updated = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books SET quantity = quantity + $2, total_copies = total_copies + $2
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(delta)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Add a user to a book's restock waitlist
    pub async fn subscribe(&self, book_id: i32, user_id: i32) -> AppResult<()> {
        self.get_by_id(book_id).await?;

        let result = sqlx::query(
            r#"
            INSERT INTO book_subscribers (book_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (book_id, user_id) DO NOTHING
            "#,
        )
        .bind(book_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::Conflict(
                "Already subscribed to this book".to_string(),
            ));
        }
        Ok(())
    }

    /// Remove a user from a book's restock waitlist
    pub async fn unsubscribe(&self, book_id: i32, user_id: i32) -> AppResult<()> {
        let result =
            sqlx::query("DELETE FROM book_subscribers WHERE book_id = $1 AND user_id = $2")
                .bind(book_id)
                .bind(user_id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(
                "No subscription for this book".to_string(),
            ));
        }
        Ok(())
    }

    /// List users waiting for a restock of this book
    pub async fn list_subscribers(&self, book_id: i32) -> AppResult<Vec<User>> {
        self.get_by_id(book_id).await?;

        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT u.* FROM users u
            JOIN book_subscribers bs ON bs.user_id = u.id
            WHERE bs.book_id = $1
            ORDER BY bs.created_at
            "#,
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }
}
