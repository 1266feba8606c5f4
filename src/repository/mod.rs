//! Repository layer for database operations

pub mod books;
pub mod loans;
pub mod prebookings;
pub mod users;

use sqlx::{Pool, Postgres, Transaction};

use crate::error::AppResult;

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub books: books::BooksRepository,
    pub users: users::UsersRepository,
    pub loans: loans::LoansRepository,
    pub prebookings: prebookings::PrebookingsRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            books: books::BooksRepository::new(pool.clone()),
            users: users::UsersRepository::new(pool.clone()),
            loans: loans::LoansRepository::new(pool.clone()),
            prebookings: prebookings::PrebookingsRepository::new(pool.clone()),
            pool,
        }
    }
}

/// Bound how long a transaction may wait on a locked book row. A timeout
/// aborts the transaction and surfaces as a retryable 503.
pub(crate) async fn set_lock_timeout(
    tx: &mut Transaction<'_, Postgres>,
    timeout_ms: u64,
) -> AppResult<()> {
    // SET LOCAL does not accept bind parameters
    sqlx::query(&format!("SET LOCAL lock_timeout = '{}ms'", timeout_ms))
        .execute(&mut **tx)
        .await?;
    Ok(())
}
