//! Pre-booking (reservation) endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{error::AppResult, models::prebooking::PrebookingEntry};

use super::AuthenticatedUser;

/// Pre-booking confirmation
#[derive(Serialize, ToSchema)]
pub struct PrebookResponse {
    pub success: bool,
    pub message: String,
    pub prebooking_id: i32,
    pub expires_at: DateTime<Utc>,
}

/// Generic success message
#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

/// Reserve a future copy of a book for the caller.
///
/// Requires a verified identity; the reservation is advisory (shelf count is
/// untouched) and expires after the configured TTL unless converted to a
/// loan by staff.
#[utoipa::path(
    post,
    path = "/prebook/{book_id}",
    tag = "prebookings",
    security(("bearer_auth" = [])),
    params(
        ("book_id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 201, description = "Pre-booking created", body = PrebookResponse),
        (status = 403, description = "Identity not verified"),
        (status = 404, description = "Book not found"),
        (status = 409, description = "Already borrowed, already pre-booked, out of stock or fully reserved")
    )
)]
pub async fn create_prebooking(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(book_id): Path<i32>,
) -> AppResult<(StatusCode, Json<PrebookResponse>)> {
    let prebooking = state.services.lending.prebook(book_id, claims.sub).await?;
    let ttl_hours = state.config.lending.prebooking_ttl_hours;

    Ok((
        StatusCode::CREATED,
        Json(PrebookResponse {
            success: true,
            message: format!("Book pre-booked for {} hours", ttl_hours),
            prebooking_id: prebooking.id,
            expires_at: prebooking.expires_at(ttl_hours),
        }),
    ))
}

/// Cancel the caller's reservation for a book
#[utoipa::path(
    delete,
    path = "/prebook/{book_id}",
    tag = "prebookings",
    security(("bearer_auth" = [])),
    params(
        ("book_id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Pre-booking cancelled", body = MessageResponse),
        (status = 404, description = "No pre-booking for this book")
    )
)]
pub async fn cancel_prebooking(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(book_id): Path<i32>,
) -> AppResult<Json<MessageResponse>> {
    state
        .services
        .lending
        .cancel_prebooking(book_id, claims.sub)
        .await?;

    Ok(Json(MessageResponse {
        success: true,
        message: "Pre-booking cancelled".to_string(),
    }))
}

/// Active reservation queue for a book, oldest first
#[utoipa::path(
    get,
    path = "/prebook/book/{book_id}",
    tag = "prebookings",
    security(("bearer_auth" = [])),
    params(
        ("book_id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Active reservations", body = Vec<PrebookingEntry>),
        (status = 403, description = "Staff role required"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn prebooking_queue(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(book_id): Path<i32>,
) -> AppResult<Json<Vec<PrebookingEntry>>> {
    claims.require_staff()?;

    let queue = state.services.lending.prebooking_queue(book_id).await?;
    Ok(Json(queue))
}
