//! Book (catalog) endpoints, including admin inventory adjustment

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::AppResult,
    models::{
        book::{Book, BookQuery, CreateBook, UpdateBook},
        user::User,
    },
};

use super::AuthenticatedUser;

/// Paginated response wrapper
#[derive(Serialize, ToSchema)]
pub struct PaginatedResponse<T>
where
    T: for<'a> ToSchema<'a>,
{
    pub success: bool,
    /// List of items
    pub items: Vec<T>,
    /// Total number of items
    pub total: i64,
    /// Current page number
    pub page: i64,
    /// Items per page
    pub per_page: i64,
}

/// Inventory adjustment response
#[derive(Serialize, ToSchema)]
pub struct InventoryResponse {
    pub success: bool,
    pub message: String,
    pub book: Book,
}

/// Generic success message
#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

/// List books with search and pagination
#[utoipa::path(
    get,
    path = "/book",
    tag = "books",
    security(("bearer_auth" = [])),
    params(BookQuery),
    responses(
        (status = 200, description = "List of books", body = PaginatedResponse<Book>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_books(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Query(query): Query<BookQuery>,
) -> AppResult<Json<PaginatedResponse<Book>>> {
    let (items, total) = state.services.catalog.search_books(&query).await?;

    Ok(Json(PaginatedResponse {
        success: true,
        items,
        total,
        page: query.page.unwrap_or(1),
        per_page: query.per_page.unwrap_or(20),
    }))
}

/// Get book details by ID
#[utoipa::path(
    get,
    path = "/book/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book details", body = Book),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Book>> {
    let book = state.services.catalog.get_book(id).await?;
    Ok(Json(book))
}

/// Add a book to the catalog
#[utoipa::path(
    post,
    path = "/book",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = CreateBook,
    responses(
        (status = 201, description = "Book created", body = Book),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Staff role required")
    )
)]
pub async fn create_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(book): Json<CreateBook>,
) -> AppResult<(StatusCode, Json<Book>)> {
    claims.require_staff()?;
    book.validate()?;

    let created = state.services.catalog.create_book(book).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Update book metadata
#[utoipa::path(
    put,
    path = "/book/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    request_body = UpdateBook,
    responses(
        (status = 200, description = "Book updated", body = Book),
        (status = 404, description = "Book not found")
    )
)]
pub async fn update_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(book): Json<UpdateBook>,
) -> AppResult<Json<Book>> {
    claims.require_staff()?;
    book.validate()?;

    let updated = state.services.catalog.update_book(id, book).await?;
    Ok(Json(updated))
}

/// Remove a book from the catalog
#[utoipa::path(
    delete,
    path = "/book/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 204, description = "Book deleted"),
        (status = 404, description = "Book not found"),
        (status = 409, description = "Book has loan records")
    )
)]
pub async fn delete_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    claims.require_staff()?;

    state.services.catalog.delete_book(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Add one copy to both shelf and owned counts
#[utoipa::path(
    put,
    path = "/book/admin/increment/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Inventory incremented", body = InventoryResponse),
        (status = 403, description = "Staff role required"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn increment_inventory(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<InventoryResponse>> {
    claims.require_staff()?;

    let book = state.services.lending.adjust_inventory(id, 1).await?;
    Ok(Json(InventoryResponse {
        success: true,
        message: "Book quantity incremented".to_string(),
        book,
    }))
}

/// Remove one copy from both shelf and owned counts
#[utoipa::path(
    put,
    path = "/book/admin/decrement/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Inventory decremented", body = InventoryResponse),
        (status = 403, description = "Staff role required"),
        (status = 404, description = "Book not found"),
        (status = 409, description = "No copies on shelf or copies reserved")
    )
)]
pub async fn decrement_inventory(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<InventoryResponse>> {
    claims.require_staff()?;

    let book = state.services.lending.adjust_inventory(id, -1).await?;
    Ok(Json(InventoryResponse {
        success: true,
        message: "Book quantity decremented".to_string(),
        book,
    }))
}

/// Join a book's restock waitlist
#[utoipa::path(
    post,
    path = "/book/{id}/subscribe",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Subscribed", body = MessageResponse),
        (status = 404, description = "Book not found"),
        (status = 409, description = "Already subscribed")
    )
)]
pub async fn subscribe(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<MessageResponse>> {
    state.services.catalog.subscribe(id, claims.sub).await?;
    Ok(Json(MessageResponse {
        success: true,
        message: "Subscribed to restock notifications".to_string(),
    }))
}

/// Leave a book's restock waitlist
#[utoipa::path(
    delete,
    path = "/book/{id}/subscribe",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Unsubscribed", body = MessageResponse),
        (status = 404, description = "No subscription for this book")
    )
)]
pub async fn unsubscribe(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<MessageResponse>> {
    state.services.catalog.unsubscribe(id, claims.sub).await?;
    Ok(Json(MessageResponse {
        success: true,
        message: "Unsubscribed from restock notifications".to_string(),
    }))
}

/// Users waiting for a restock of this book
#[utoipa::path(
    get,
    path = "/book/{id}/subscribers",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Waitlisted users", body = Vec<User>),
        (status = 403, description = "Staff role required"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn list_subscribers(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Vec<User>>> {
    claims.require_staff()?;

    let users = state.services.catalog.subscribers(id).await?;
    Ok(Json(users))
}
