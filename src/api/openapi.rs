//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{books, borrows, health, prebookings, users};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "BookNest API",
        version = "0.1.0",
        description = "BookNest Lending Ledger Service REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Books
        books::list_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        books::increment_inventory,
        books::decrement_inventory,
        books::subscribe,
        books::unsubscribe,
        books::list_subscribers,
        // Borrows
        borrows::record_borrow,
        borrows::return_borrowed,
        borrows::my_borrowed_books,
        borrows::book_loans,
        borrows::overdue_loans,
        borrows::mark_notified,
        // Pre-bookings
        prebookings::create_prebooking,
        prebookings::cancel_prebooking,
        prebookings::prebooking_queue,
        // Users
        users::me,
        users::list_users,
        users::get_user,
        users::create_user,
        users::update_kyc_status,
    ),
    components(
        schemas(
            // Books
            crate::models::book::Book,
            crate::models::book::CreateBook,
            crate::models::book::UpdateBook,
            books::InventoryResponse,
            books::MessageResponse,
            // Borrows
            crate::models::loan::Loan,
            crate::models::loan::LoanDetails,
            crate::models::loan::BorrowedBook,
            borrows::RecordBorrowRequest,
            borrows::BorrowResponse,
            borrows::ReturnResponse,
            // Pre-bookings
            crate::models::prebooking::Prebooking,
            crate::models::prebooking::PrebookingEntry,
            prebookings::PrebookResponse,
            // Users
            crate::models::user::User,
            crate::models::user::Role,
            crate::models::user::KycStatus,
            crate::models::user::CreateUser,
            crate::models::user::UpdateKycStatus,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "books", description = "Catalog and inventory management"),
        (name = "borrows", description = "Borrow and return operations"),
        (name = "prebookings", description = "Book reservations"),
        (name = "users", description = "User directory and KYC")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
