//! Domain entities and their status transition tables

mod book;
mod borrow;
mod confirm;
mod donation;
mod ids;
mod review;
mod user;
mod wish;

pub use book::{normalize_tags, Book, BookMetadata, BookSource, BookStatus};
pub use borrow::{BorrowRecord, BorrowStatus};
pub use confirm::{ConfirmStatus, DonorConfirm};
pub use donation::{DonationRequest, DonationStatus};
pub use ids::{BookId, BorrowRecordId, DonationId, DonorConfirmId, ReviewId, UserId, WishId};
pub use review::{NewReview, Review, ReviewKind};
pub use user::{Actor, User};
pub use wish::{NewWish, WishItem, WishStatus};

use thiserror::Error;

/// A stored or supplied status string that names no known status
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind} status: {value}")]
pub struct ParseStatusError {
    kind: &'static str,
    value: String,
}

impl ParseStatusError {
    pub(crate) fn new(kind: &'static str, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}

impl From<ParseStatusError> for crate::error::LendingError {
    fn from(err: ParseStatusError) -> Self {
        crate::error::LendingError::Validation(err.to_string())
    }
}
