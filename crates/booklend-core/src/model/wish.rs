//! Wishlist entries: books readers would like the library to acquire

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ParseStatusError, UserId, WishId};
use crate::error::{LendingError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WishStatus {
    Pending,
    Fulfilled,
    Rejected,
}

impl WishStatus {
    pub fn can_transition_to(&self, target: &WishStatus) -> bool {
        matches!(
            (self, target),
            (WishStatus::Pending, WishStatus::Fulfilled) | (WishStatus::Pending, WishStatus::Rejected)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WishStatus::Pending => "pending",
            WishStatus::Fulfilled => "fulfilled",
            WishStatus::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for WishStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for WishStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(WishStatus::Pending),
            "fulfilled" => Ok(WishStatus::Fulfilled),
            "rejected" => Ok(WishStatus::Rejected),
            other => Err(ParseStatusError::new("wish", other)),
        }
    }
}

/// Wishlist entry as submitted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewWish {
    pub book_title: String,
    pub author: String,
    pub publisher: String,
    pub isbn: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WishItem {
    pub id: WishId,
    pub user_id: UserId,
    pub book_title: String,
    pub author: String,
    pub publisher: String,
    pub isbn: String,
    pub reason: String,
    pub status: WishStatus,
    pub created_at: DateTime<Utc>,
}

impl WishItem {
    pub fn new(user_id: UserId, input: NewWish, now: DateTime<Utc>) -> Result<Self> {
        let book_title = input.book_title.trim().to_string();
        if book_title.is_empty() {
            return Err(LendingError::Validation("book_title is required".to_string()));
        }
        Ok(Self {
            id: WishId::new(),
            user_id,
            book_title,
            author: input.author.trim().to_string(),
            publisher: input.publisher.trim().to_string(),
            isbn: input.isbn.trim().to_string(),
            reason: input.reason.trim().to_string(),
            status: WishStatus::Pending,
            created_at: now,
        })
    }

    pub fn transition_to(&mut self, next: WishStatus) -> Result<()> {
        if !self.status.can_transition_to(&next) {
            return Err(LendingError::InvalidTransition {
                entity: "WishItem",
                id: self.id.to_string(),
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        self.status = next;
        Ok(())
    }
}
