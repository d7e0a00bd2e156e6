//! Booklend Server - lending API server
//!
//! HTTP surface over [`booklend_core::Library`]. Every response body is a JSON
//! object with a `success` flag and a `message`, plus the entity it concerns.

pub mod admin;
pub mod auth;
pub mod error;
pub mod http;

use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use booklend_core::Library;

pub use error::{ApiError, ApiResult};

/// Shared application state
pub struct AppState {
    library: Mutex<Library>,
}

impl AppState {
    pub fn new(library: Library) -> Self {
        Self {
            library: Mutex::new(library),
        }
    }

    /// Lock the library for one request
    pub fn library(&self) -> Result<MutexGuard<'_, Library>, ApiError> {
        self.library
            .lock()
            .map_err(|e| ApiError::Internal(format!("Mutex poisoned: {}", e)))
    }
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Session endpoints
        .route("/api/auth/login", post(http::login))
        .route("/api/auth/me", get(http::me))
        // Catalog endpoints
        .route("/api/books", get(http::list_books).post(admin::create_book))
        .route("/api/books/{id}", get(http::get_book).put(admin::update_book))
        .route("/api/books/{id}/status", put(admin::set_book_status))
        .route(
            "/api/books/{id}/reviews",
            get(http::list_reviews).post(http::create_review),
        )
        // Borrow endpoints
        .route(
            "/api/borrows",
            get(http::my_borrows).post(http::request_borrow),
        )
        .route("/api/borrows/{id}/return", put(http::request_return))
        // Donor endpoints
        .route("/api/donor/confirms", get(http::pending_confirms))
        .route("/api/donor/confirms/{id}/approve", put(http::approve_confirm))
        .route("/api/donor/confirms/{id}/reject", put(http::reject_confirm))
        // Donation endpoints
        .route(
            "/api/donations",
            get(http::my_donations).post(http::create_donation),
        )
        // Wishlist endpoints
        .route(
            "/api/wishlists",
            get(http::my_wishes).post(http::create_wish),
        )
        .route("/api/wishlists/{id}", delete(http::delete_wish))
        // Admin endpoints
        .route("/api/admin/borrows", get(admin::list_borrows))
        .route("/api/admin/borrows/{id}/approve", put(admin::approve_borrow))
        .route("/api/admin/borrows/{id}/reject", put(admin::reject_borrow))
        .route(
            "/api/admin/borrows/{id}/confirm-return",
            put(admin::confirm_return),
        )
        .route("/api/admin/donations", get(admin::list_donations))
        .route(
            "/api/admin/donations/{id}/approve",
            put(admin::approve_donation),
        )
        .route(
            "/api/admin/donations/{id}/reject",
            put(admin::reject_donation),
        )
        .route(
            "/api/admin/users",
            get(admin::list_users).post(admin::create_user),
        )
        .route("/api/admin/users/{id}", delete(admin::delete_user))
        .route("/api/admin/dashboard", get(admin::dashboard))
        .route(
            "/api/admin/settings",
            get(admin::get_settings).put(admin::update_settings),
        )
        .route(
            "/api/admin/overdue/send-reminder",
            post(admin::send_reminders),
        )
        .route("/api/admin/wishlists", get(admin::list_wishes))
        .route(
            "/api/admin/wishlists/{id}/fulfill",
            put(admin::fulfill_wish),
        )
        .route("/api/admin/wishlists/{id}/reject", put(admin::reject_wish))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the server
pub async fn serve(addr: &str, state: Arc<AppState>) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Booklend server listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
