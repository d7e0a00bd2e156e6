//! HTTP endpoint handlers for administrators
//!
//! Each handler passes the caller through to the library, which refuses
//! non-administrators with `Forbidden`.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use booklend_core::{
    BookId, BookMetadata, BookStatus, BorrowRecordId, BorrowStatus, DonationId, DonationStatus,
    LendingError, NewUser, UserId, WishId, WishStatus,
};

use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::AppState;

/// Optional `?status=` narrowing for admin listings
#[derive(Debug, Default, Deserialize)]
pub struct StatusQuery {
    pub status: Option<String>,
}

impl StatusQuery {
    fn parse<T>(&self) -> ApiResult<Option<T>>
    where
        T: std::str::FromStr<Err = booklend_core::ParseStatusError>,
    {
        match self.status.as_deref().filter(|s| !s.is_empty()) {
            Some(s) => Ok(Some(s.parse::<T>()?)),
            None => Ok(None),
        }
    }
}

// ==================== Catalog ====================

/// Request to add a book; `donor_id` makes it a donated book
#[derive(Debug, Deserialize)]
pub struct BookBody {
    #[serde(flatten)]
    pub metadata: BookMetadata,
    #[serde(default)]
    pub donor_id: Option<String>,
}

pub async fn create_book(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Json(body): Json<BookBody>,
) -> ApiResult<Json<Value>> {
    let donor_id = body
        .donor_id
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(UserId::parse)
        .transpose()?;
    let book = state
        .library()?
        .add_book(&current.actor(), body.metadata, donor_id)?;
    Ok(Json(json!({
        "success": true,
        "message": "Book added",
        "book": book,
    })))
}

pub async fn update_book(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(id): Path<String>,
    Json(metadata): Json<BookMetadata>,
) -> ApiResult<Json<Value>> {
    let book = state
        .library()?
        .update_book(&current.actor(), BookId::parse(&id)?, metadata)?;
    Ok(Json(json!({
        "success": true,
        "message": "Book updated",
        "book": book,
    })))
}

/// Request to mark a book available or unavailable
#[derive(Debug, Deserialize)]
pub struct BookStatusBody {
    pub status: String,
}

pub async fn set_book_status(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(id): Path<String>,
    Json(body): Json<BookStatusBody>,
) -> ApiResult<Json<Value>> {
    let status: BookStatus = body.status.parse()?;
    let book = state
        .library()?
        .set_book_status(&current.actor(), BookId::parse(&id)?, status)?;
    Ok(Json(json!({
        "success": true,
        "message": format!("Book marked {}", book.status),
        "book": book,
    })))
}

// ==================== Borrows ====================

pub async fn list_borrows(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Query(query): Query<StatusQuery>,
) -> ApiResult<Json<Value>> {
    let status = query.parse::<BorrowStatus>()?;
    let records = state.library()?.all_records(&current.actor(), status)?;
    Ok(Json(json!({
        "success": true,
        "records": records,
    })))
}

pub async fn approve_borrow(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let record = state
        .library()?
        .approve_borrow(&current.actor(), BorrowRecordId::parse(&id)?)?;
    Ok(Json(json!({
        "success": true,
        "message": "Borrow approved",
        "record": record,
    })))
}

pub async fn reject_borrow(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let record = state
        .library()?
        .reject_borrow(&current.actor(), BorrowRecordId::parse(&id)?)?;
    Ok(Json(json!({
        "success": true,
        "message": "Borrow rejected",
        "record": record,
    })))
}

pub async fn confirm_return(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let record = state
        .library()?
        .confirm_return(&current.actor(), BorrowRecordId::parse(&id)?)?;
    Ok(Json(json!({
        "success": true,
        "message": "Return confirmed",
        "record": record,
    })))
}

// ==================== Donations ====================

pub async fn list_donations(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Query(query): Query<StatusQuery>,
) -> ApiResult<Json<Value>> {
    let status = query.parse::<DonationStatus>()?;
    let donations = state.library()?.all_donations(&current.actor(), status)?;
    Ok(Json(json!({
        "success": true,
        "donations": donations,
    })))
}

/// Approve a donation; the response carries the request and the new book
pub async fn approve_donation(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let (donation, book) = state
        .library()?
        .approve_donation(&current.actor(), DonationId::parse(&id)?)?;
    Ok(Json(json!({
        "success": true,
        "message": "Donation approved and added to the catalog",
        "donation": donation,
        "book": book,
    })))
}

pub async fn reject_donation(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let donation = state
        .library()?
        .reject_donation(&current.actor(), DonationId::parse(&id)?)?;
    Ok(Json(json!({
        "success": true,
        "message": "Donation rejected",
        "donation": donation,
    })))
}

// ==================== Users ====================

pub async fn list_users(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
) -> ApiResult<Json<Value>> {
    let users = state.library()?.users(&current.actor())?;
    Ok(Json(json!({
        "success": true,
        "users": users,
    })))
}

/// Register a user; the access token is returned only here
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Json(request): Json<NewUser>,
) -> ApiResult<Json<Value>> {
    let user = state.library()?.create_user(&current.actor(), request)?;
    Ok(Json(json!({
        "success": true,
        "message": "User created",
        "access_token": user.access_token,
        "user": user,
    })))
}

pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    state
        .library()?
        .delete_user(&current.actor(), UserId::parse(&id)?)?;
    Ok(Json(json!({
        "success": true,
        "message": "User deleted",
    })))
}

// ==================== Dashboard ====================

pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
) -> ApiResult<Json<Value>> {
    let dashboard = state.library()?.dashboard(&current.actor())?;
    Ok(Json(json!({
        "success": true,
        "stats": dashboard.stats,
        "popular_books": dashboard.popular_books,
        "top_readers": dashboard.top_readers,
        "overdue": dashboard.overdue,
    })))
}

// ==================== Settings ====================

pub async fn get_settings(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
) -> ApiResult<Json<Value>> {
    let settings = state.library()?.settings(&current.actor())?;
    Ok(Json(json!({
        "success": true,
        "settings": settings,
    })))
}

/// Store settings; values may be sent as JSON numbers or strings
pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Json(body): Json<BTreeMap<String, Value>>,
) -> ApiResult<Json<Value>> {
    let updates = body
        .into_iter()
        .map(|(key, value)| -> Result<(String, String), LendingError> {
            let value = match value {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                other => {
                    return Err(LendingError::Validation(format!(
                        "setting {} must be a number, got {}",
                        key, other
                    )))
                }
            };
            Ok((key, value))
        })
        .collect::<Result<BTreeMap<_, _>, LendingError>>()?;
    let settings = state
        .library()?
        .update_settings(&current.actor(), updates)?;
    Ok(Json(json!({
        "success": true,
        "message": "Settings saved",
        "settings": settings,
    })))
}

// ==================== Reminders ====================

/// Request to remind the borrowers of overdue loans
#[derive(Debug, Deserialize)]
pub struct ReminderBody {
    #[serde(default)]
    pub record_ids: Vec<String>,
}

pub async fn send_reminders(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Json(body): Json<ReminderBody>,
) -> ApiResult<Json<Value>> {
    let ids = body
        .record_ids
        .iter()
        .map(|id| BorrowRecordId::parse(id))
        .collect::<Result<Vec<_>, _>>()?;
    let reminders = state
        .library()?
        .send_overdue_reminders(&current.actor(), &ids)?;
    Ok(Json(json!({
        "success": true,
        "message": format!("Sent {} reminder(s)", reminders.len()),
        "reminders": reminders,
    })))
}

// ==================== Wishlist ====================

pub async fn list_wishes(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Query(query): Query<StatusQuery>,
) -> ApiResult<Json<Value>> {
    let status = query.parse::<WishStatus>()?;
    let wishes = state.library()?.all_wishes(&current.actor(), status)?;
    Ok(Json(json!({
        "success": true,
        "wishlists": wishes,
    })))
}

pub async fn fulfill_wish(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let wish = state
        .library()?
        .fulfill_wish(&current.actor(), WishId::parse(&id)?)?;
    Ok(Json(json!({
        "success": true,
        "message": "Wish marked fulfilled",
        "wishlist": wish,
    })))
}

pub async fn reject_wish(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let wish = state
        .library()?
        .reject_wish(&current.actor(), WishId::parse(&id)?)?;
    Ok(Json(json!({
        "success": true,
        "message": "Wish rejected",
        "wishlist": wish,
    })))
}
