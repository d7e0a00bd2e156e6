//! Donation requests: proposed additions to the catalog

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Book, BookMetadata, DonationId, ParseStatusError, UserId};
use crate::error::{LendingError, Result};

const MAX_REASON_LEN: usize = 500;

/// Review status of a donation request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DonationStatus {
    Pending,
    Approved,
    Rejected,
}

impl DonationStatus {
    pub fn can_transition_to(&self, target: &DonationStatus) -> bool {
        matches!(
            (self, target),
            (DonationStatus::Pending, DonationStatus::Approved)
                | (DonationStatus::Pending, DonationStatus::Rejected)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DonationStatus::Pending => "pending",
            DonationStatus::Approved => "approved",
            DonationStatus::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for DonationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DonationStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(DonationStatus::Pending),
            "approved" => Ok(DonationStatus::Approved),
            "rejected" => Ok(DonationStatus::Rejected),
            other => Err(ParseStatusError::new("donation", other)),
        }
    }
}

/// A book a user offers to the library
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DonationRequest {
    pub id: DonationId,
    pub user_id: UserId,
    #[serde(flatten)]
    pub metadata: BookMetadata,
    pub reason: String,
    pub status: DonationStatus,
    pub created_at: DateTime<Utc>,
}

impl DonationRequest {
    pub fn new(
        user_id: UserId,
        metadata: BookMetadata,
        reason: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: DonationId::new(),
            user_id,
            metadata: metadata.normalized(),
            reason: reason.into().trim().to_string(),
            status: DonationStatus::Pending,
            created_at: now,
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.metadata.validate()?;
        if self.reason.chars().count() > MAX_REASON_LEN {
            return Err(LendingError::Validation(format!(
                "reason must be at most {} characters",
                MAX_REASON_LEN
            )));
        }
        Ok(())
    }

    fn transition_to(&mut self, next: DonationStatus) -> Result<()> {
        if !self.status.can_transition_to(&next) {
            return Err(LendingError::InvalidTransition {
                entity: "DonationRequest",
                id: self.id.to_string(),
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        self.status = next;
        Ok(())
    }

    /// Accept the donation and materialize the book it describes
    pub fn approve(&mut self, now: DateTime<Utc>) -> Result<Book> {
        self.transition_to(DonationStatus::Approved)?;
        let mut book = Book::donated(self.metadata.clone(), self.user_id);
        book.created_at = now;
        Ok(book)
    }

    pub fn reject(&mut self) -> Result<()> {
        self.transition_to(DonationStatus::Rejected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BookSource, BookStatus};

    fn donation() -> DonationRequest {
        DonationRequest::new(
            UserId::new(),
            BookMetadata::new("X", "Y", "Z").with_tags(["gift"]),
            "spare copy",
            Utc::now(),
        )
    }

    #[test]
    fn test_approve_creates_donated_book() {
        let mut d = donation();
        let book = d.approve(Utc::now()).unwrap();
        assert_eq!(d.status, DonationStatus::Approved);
        assert_eq!(book.metadata.title, "X");
        assert_eq!(book.metadata.tags, vec!["gift"]);
        assert_eq!(book.source, BookSource::Donated);
        assert_eq!(book.donor_id, Some(d.user_id));
        assert_eq!(book.status, BookStatus::Available);
    }

    #[test]
    fn test_only_pending_can_be_decided() {
        let mut d = donation();
        d.reject().unwrap();
        assert!(d.approve(Utc::now()).is_err());
        assert!(d.reject().is_err());
    }

    #[test]
    fn test_reason_length() {
        let mut d = donation();
        d.reason = "x".repeat(501);
        assert!(d.validate().is_err());
    }
}
