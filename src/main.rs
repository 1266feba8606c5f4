//! BookNest Server - Lending Ledger Service
//!
//! REST API server for book cataloging, borrowing and pre-booking.

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use booknest_server::{
    api,
    config::AppConfig,
    repository::Repository,
    services::Services,
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("booknest_server={},tower_http=debug", config.logging.level).into());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting BookNest Server v{}", env!("CARGO_PKG_VERSION"));

    // Create database connection pool
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    tracing::info!("Database migrations completed");

    // Save server address before moving config
    let server_host = config.server.host.clone();
    let server_port = config.server.port;

    // Create repository and services
    let repository = Repository::new(pool);
    let services = Services::new(repository, config.lending.clone());

    // Create application state
    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    };

    // Purge expired pre-booking rows in the background
    spawn_prebooking_reaper(state.clone());

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(
        server_host.parse().expect("Invalid host address"),
        server_port,
    );

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Periodically delete expired prebooking rows. Expiry is already enforced
/// by every query's `created_at` cutoff; the reaper only reclaims storage.
fn spawn_prebooking_reaper(state: AppState) {
    let interval = Duration::from_secs(state.config.lending.reaper_interval_secs);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            match state.services.lending.purge_expired_prebookings().await {
                Ok(0) => {}
                Ok(purged) => tracing::info!("Purged {} expired pre-bookings", purged),
                Err(e) => tracing::warn!("Pre-booking reaper failed: {}", e),
            }
        }
    });
}

/// Create the application router with all routes
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let routes = Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        .route("/ready", get(api::health::readiness_check))
        // Books (catalog)
        .route("/book", get(api::books::list_books))
        .route("/book", post(api::books::create_book))
        .route("/book/:id", get(api::books::get_book))
        .route("/book/:id", put(api::books::update_book))
        .route("/book/:id", delete(api::books::delete_book))
        .route("/book/admin/increment/:id", put(api::books::increment_inventory))
        .route("/book/admin/decrement/:id", put(api::books::decrement_inventory))
        .route("/book/:id/subscribe", post(api::books::subscribe))
        .route("/book/:id/subscribe", delete(api::books::unsubscribe))
        .route("/book/:id/subscribers", get(api::books::list_subscribers))
        // Borrows
        .route("/borrow/record-borrow-book/:book_id", post(api::borrows::record_borrow))
        .route("/borrow/return-borrowed-book/:loan_id", put(api::borrows::return_borrowed))
        .route("/borrow/my-borrowed-books", get(api::borrows::my_borrowed_books))
        .route("/borrow/book/:book_id", get(api::borrows::book_loans))
        .route("/borrow/overdue", get(api::borrows::overdue_loans))
        .route("/borrow/mark-notified/:loan_id", put(api::borrows::mark_notified))
        // Pre-bookings
        .route("/prebook/:book_id", post(api::prebookings::create_prebooking))
        .route("/prebook/:book_id", delete(api::prebookings::cancel_prebooking))
        .route("/prebook/book/:book_id", get(api::prebookings::prebooking_queue))
        // Users
        .route("/users", get(api::users::list_users))
        .route("/users", post(api::users::create_user))
        .route("/users/me", get(api::users::me))
        .route("/users/:id", get(api::users::get_user))
        .route("/users/:id/kyc", put(api::users::update_kyc_status))
        .with_state(state);

    // OpenAPI documentation
    let openapi = api::openapi::create_openapi_router();

    routes
        .merge(openapi)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
