//! HTTP endpoint handlers for readers and donors

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use booklend_core::{
    BookFilter, BookId, BookMetadata, BookStatus, BorrowRecordId, DonorConfirmId, NewReview,
    NewWish, WishId,
};

use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::AppState;

// ==================== Session ====================

/// Request to log in
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub student_id: String,
    pub access_token: String,
}

/// Exchange a student id and access token for the user record
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Json<Value>> {
    let user = state
        .library()?
        .login(request.student_id.trim(), request.access_token.trim())?;
    Ok(Json(json!({
        "success": true,
        "message": "Logged in",
        "user": user,
    })))
}

pub async fn me(current: CurrentUser) -> Json<Value> {
    Json(json!({
        "success": true,
        "user": current.0,
    }))
}

// ==================== Catalog ====================

/// Catalog search parameters
#[derive(Debug, Default, Deserialize)]
pub struct BookQuery {
    pub keyword: Option<String>,
    pub status: Option<String>,
}

/// List books, newest first
pub async fn list_books(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BookQuery>,
) -> ApiResult<Json<Value>> {
    let mut filter = BookFilter::all();
    if let Some(keyword) = query.keyword.filter(|k| !k.trim().is_empty()) {
        filter = filter.keyword(keyword.trim());
    }
    if let Some(status) = query.status.filter(|s| !s.is_empty()) {
        filter = filter.status(status.parse::<BookStatus>()?);
    }
    let books = state.library()?.books(&filter)?;
    Ok(Json(json!({
        "success": true,
        "count": books.len(),
        "books": books,
    })))
}

pub async fn get_book(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let book = state.library()?.book(BookId::parse(&id)?)?;
    Ok(Json(json!({
        "success": true,
        "book": book,
    })))
}

// ==================== Reviews ====================

pub async fn list_reviews(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let reviews = state.library()?.reviews(BookId::parse(&id)?)?;
    Ok(Json(json!({
        "success": true,
        "reviews": reviews,
    })))
}

pub async fn create_review(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(id): Path<String>,
    Json(request): Json<NewReview>,
) -> ApiResult<Json<Value>> {
    let review = state
        .library()?
        .add_review(&current.actor(), BookId::parse(&id)?, request)?;
    Ok(Json(json!({
        "success": true,
        "message": "Review submitted",
        "review": review,
    })))
}

// ==================== Borrowing ====================

/// Request to borrow a book
#[derive(Debug, Deserialize)]
pub struct BorrowRequest {
    pub book_id: String,
}

pub async fn my_borrows(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
) -> ApiResult<Json<Value>> {
    let records = state.library()?.my_records(&current.actor())?;
    Ok(Json(json!({
        "success": true,
        "records": records,
    })))
}

/// File a borrow request; donated books wait for their donor first
pub async fn request_borrow(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Json(request): Json<BorrowRequest>,
) -> ApiResult<Json<Value>> {
    let book_id = BookId::parse(&request.book_id)?;
    let record = state
        .library()?
        .request_borrow(&current.actor(), book_id)?;
    let message = if record.status == booklend_core::BorrowStatus::DonorPending {
        "Borrow request sent to the donor for consent"
    } else {
        "Borrow request submitted"
    };
    Ok(Json(json!({
        "success": true,
        "message": message,
        "record": record,
    })))
}

pub async fn request_return(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let record = state
        .library()?
        .request_return(&current.actor(), BorrowRecordId::parse(&id)?)?;
    Ok(Json(json!({
        "success": true,
        "message": "Return requested",
        "record": record,
    })))
}

// ==================== Donor consent ====================

pub async fn pending_confirms(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
) -> ApiResult<Json<Value>> {
    let confirms = state.library()?.pending_confirms(&current.actor())?;
    Ok(Json(json!({
        "success": true,
        "confirms": confirms,
    })))
}

pub async fn approve_confirm(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let confirm = state
        .library()?
        .approve_confirm(&current.actor(), DonorConfirmId::parse(&id)?)?;
    Ok(Json(json!({
        "success": true,
        "message": "Loan consented; waiting for administrator approval",
        "confirm": confirm,
    })))
}

pub async fn reject_confirm(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let confirm = state
        .library()?
        .reject_confirm(&current.actor(), DonorConfirmId::parse(&id)?)?;
    Ok(Json(json!({
        "success": true,
        "message": "Loan declined",
        "confirm": confirm,
    })))
}

// ==================== Donations ====================

/// Request to donate a book
#[derive(Debug, Deserialize)]
pub struct DonationBody {
    #[serde(flatten)]
    pub metadata: BookMetadata,
    #[serde(default)]
    pub reason: String,
}

/// The caller's donation requests and the books they have donated
pub async fn my_donations(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
) -> ApiResult<Json<Value>> {
    let overview = state.library()?.my_donations(&current.actor())?;
    Ok(Json(json!({
        "success": true,
        "donations": overview.donations,
        "donated_books": overview.donated_books,
    })))
}

pub async fn create_donation(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Json(body): Json<DonationBody>,
) -> ApiResult<Json<Value>> {
    let donation = state
        .library()?
        .create_donation(&current.actor(), body.metadata, body.reason)?;
    Ok(Json(json!({
        "success": true,
        "message": "Donation request submitted",
        "donation": donation,
    })))
}

// ==================== Wishlist ====================

pub async fn my_wishes(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
) -> ApiResult<Json<Value>> {
    let wishes = state.library()?.my_wishes(&current.actor())?;
    Ok(Json(json!({
        "success": true,
        "wishlists": wishes,
    })))
}

pub async fn create_wish(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Json(request): Json<NewWish>,
) -> ApiResult<Json<Value>> {
    let wish = state.library()?.add_wish(&current.actor(), request)?;
    Ok(Json(json!({
        "success": true,
        "message": "Added to wishlist",
        "wishlist": wish,
    })))
}

pub async fn delete_wish(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    state
        .library()?
        .delete_wish(&current.actor(), WishId::parse(&id)?)?;
    Ok(Json(json!({
        "success": true,
        "message": "Removed from wishlist",
    })))
}
