//! Borrow records
//!
//! State transitions:
//! ```text
//! DonorPending → Pending → Approved → ReturnPending → Completed
//!      ↓            ↓
//!   Rejected     Rejected
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{BookId, BorrowRecordId, ParseStatusError, UserId};
use crate::error::{LendingError, Result};

/// Lifecycle status of a borrow record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BorrowStatus {
    /// Awaiting an administrator decision
    Pending,
    /// Awaiting the donor's consent
    DonorPending,
    /// Loan is active
    Approved,
    /// Borrower asked to return the book
    ReturnPending,
    /// Loan closed
    Completed,
    /// Request denied
    Rejected,
}

impl BorrowStatus {
    /// Statuses that count against the borrow limit and hold the book
    pub const ACTIVE: [BorrowStatus; 4] = [
        BorrowStatus::Pending,
        BorrowStatus::DonorPending,
        BorrowStatus::Approved,
        BorrowStatus::ReturnPending,
    ];

    /// Check if a status transition is valid
    pub fn can_transition_to(&self, target: &BorrowStatus) -> bool {
        match (self, target) {
            (BorrowStatus::DonorPending, BorrowStatus::Pending) => true,
            (BorrowStatus::DonorPending, BorrowStatus::Rejected) => true,

            (BorrowStatus::Pending, BorrowStatus::Approved) => true,
            (BorrowStatus::Pending, BorrowStatus::Rejected) => true,

            (BorrowStatus::Approved, BorrowStatus::ReturnPending) => true,

            (BorrowStatus::ReturnPending, BorrowStatus::Completed) => true,

            // Completed and Rejected are terminal
            _ => false,
        }
    }

    /// Get valid next statuses from the current one
    pub fn valid_transitions(&self) -> Vec<BorrowStatus> {
        match self {
            BorrowStatus::DonorPending => vec![BorrowStatus::Pending, BorrowStatus::Rejected],
            BorrowStatus::Pending => vec![BorrowStatus::Approved, BorrowStatus::Rejected],
            BorrowStatus::Approved => vec![BorrowStatus::ReturnPending],
            BorrowStatus::ReturnPending => vec![BorrowStatus::Completed],
            BorrowStatus::Completed | BorrowStatus::Rejected => vec![],
        }
    }

    pub fn is_active(&self) -> bool {
        Self::ACTIVE.contains(self)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BorrowStatus::Completed | BorrowStatus::Rejected)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BorrowStatus::Pending => "pending",
            BorrowStatus::DonorPending => "donor_pending",
            BorrowStatus::Approved => "approved",
            BorrowStatus::ReturnPending => "return_pending",
            BorrowStatus::Completed => "completed",
            BorrowStatus::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for BorrowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BorrowStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BorrowStatus::Pending),
            "donor_pending" => Ok(BorrowStatus::DonorPending),
            "approved" => Ok(BorrowStatus::Approved),
            "return_pending" => Ok(BorrowStatus::ReturnPending),
            "completed" => Ok(BorrowStatus::Completed),
            "rejected" => Ok(BorrowStatus::Rejected),
            other => Err(ParseStatusError::new("borrow", other)),
        }
    }
}

/// A request to borrow a book and the loan that follows it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BorrowRecord {
    pub id: BorrowRecordId,
    pub book_id: BookId,
    pub borrower_id: UserId,
    pub status: BorrowStatus,
    pub requested_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub returned_at: Option<DateTime<Utc>>,
}

impl BorrowRecord {
    /// File a new request; donor-gated requests start in `DonorPending`
    pub fn request(
        book_id: BookId,
        borrower_id: UserId,
        donor_gated: bool,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: BorrowRecordId::new(),
            book_id,
            borrower_id,
            status: if donor_gated {
                BorrowStatus::DonorPending
            } else {
                BorrowStatus::Pending
            },
            requested_at: now,
            approved_at: None,
            returned_at: None,
        }
    }

    /// Attempt to move to a new status
    pub fn transition_to(&mut self, next: BorrowStatus) -> Result<()> {
        if !self.status.can_transition_to(&next) {
            return Err(LendingError::InvalidTransition {
                entity: "BorrowRecord",
                id: self.id.to_string(),
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        self.status = next;
        Ok(())
    }

    /// Donor consented; the request now awaits an administrator
    pub fn release_to_admin(&mut self) -> Result<()> {
        self.transition_to(BorrowStatus::Pending)
    }

    pub fn approve(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.transition_to(BorrowStatus::Approved)?;
        self.approved_at = Some(now);
        Ok(())
    }

    pub fn reject(&mut self) -> Result<()> {
        self.transition_to(BorrowStatus::Rejected)
    }

    pub fn request_return(&mut self) -> Result<()> {
        self.transition_to(BorrowStatus::ReturnPending)
    }

    pub fn complete(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.transition_to(BorrowStatus::Completed)?;
        self.returned_at = Some(now);
        Ok(())
    }

    pub fn is_borrowed_by(&self, user: UserId) -> bool {
        self.borrower_id == user
    }

    /// Whether an approved loan started before `threshold`
    pub fn is_overdue(&self, threshold: DateTime<Utc>) -> bool {
        self.status == BorrowStatus::Approved
            && self.approved_at.is_some_and(|approved| approved < threshold)
    }
}
