//! Catalog management service

use crate::{
    error::AppResult,
    models::{
        book::{Book, BookQuery, CreateBook, UpdateBook},
        user::User,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
    lock_timeout_ms: u64,
}

impl CatalogService {
    pub fn new(repository: Repository, lock_timeout_ms: u64) -> Self {
        Self {
            repository,
            lock_timeout_ms,
        }
    }

    /// Search books with pagination
    pub async fn search_books(&self, query: &BookQuery) -> AppResult<(Vec<Book>, i64)> {
        self.repository.books.search(query).await
    }

    /// Get book details
    pub async fn get_book(&self, id: i32) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await
    }

    /// Add a book to the catalog
    pub async fn create_book(&self, book: CreateBook) -> AppResult<Book> {
        self.repository.books.create(&book).await
    }

    /// Update book metadata
    pub async fn update_book(&self, id: i32, book: UpdateBook) -> AppResult<Book> {
        self.repository.books.update(id, &book).await
    }

    /// Remove a book from the catalog
    pub async fn delete_book(&self, id: i32) -> AppResult<()> {
        self.repository.books.delete(id, self.lock_timeout_ms).await
    }

    /// Join a book's restock waitlist
    pub async fn subscribe(&self, book_id: i32, user_id: i32) -> AppResult<()> {
        self.repository.users.get_by_id(user_id).await?;
        self.repository.books.subscribe(book_id, user_id).await
    }

    /// Leave a book's restock waitlist
    pub async fn unsubscribe(&self, book_id: i32, user_id: i32) -> AppResult<()> {
        self.repository.books.unsubscribe(book_id, user_id).await
    }

    /// Users waiting for a restock of this book (staff view)
    pub async fn subscribers(&self, book_id: i32) -> AppResult<Vec<User>> {
        self.repository.books.list_subscribers(book_id).await
    }
}
