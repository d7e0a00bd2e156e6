//! Donor confirmations gate loans of donated books behind the donor's consent

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{BorrowRecordId, DonorConfirmId, ParseStatusError, UserId};
use crate::error::{LendingError, Result};

/// Status of a donor confirmation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmStatus {
    Pending,
    Approved,
    Rejected,
}

impl ConfirmStatus {
    /// Only a pending confirmation can be decided, and only once
    pub fn can_transition_to(&self, target: &ConfirmStatus) -> bool {
        matches!(
            (self, target),
            (ConfirmStatus::Pending, ConfirmStatus::Approved)
                | (ConfirmStatus::Pending, ConfirmStatus::Rejected)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfirmStatus::Pending => "pending",
            ConfirmStatus::Approved => "approved",
            ConfirmStatus::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for ConfirmStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ConfirmStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ConfirmStatus::Pending),
            "approved" => Ok(ConfirmStatus::Approved),
            "rejected" => Ok(ConfirmStatus::Rejected),
            other => Err(ParseStatusError::new("donor confirmation", other)),
        }
    }
}

/// The donor's answer to one borrow request for their book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DonorConfirm {
    pub id: DonorConfirmId,
    pub borrow_record_id: BorrowRecordId,
    pub donor_id: UserId,
    pub status: ConfirmStatus,
    pub created_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
}

impl DonorConfirm {
    pub fn new(borrow_record_id: BorrowRecordId, donor_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            id: DonorConfirmId::new(),
            borrow_record_id,
            donor_id,
            status: ConfirmStatus::Pending,
            created_at: now,
            confirmed_at: None,
        }
    }

    fn transition_to(&mut self, next: ConfirmStatus) -> Result<()> {
        if !self.status.can_transition_to(&next) {
            return Err(LendingError::InvalidTransition {
                entity: "DonorConfirm",
                id: self.id.to_string(),
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        self.status = next;
        Ok(())
    }

    /// Donor consents to the loan
    pub fn approve(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.transition_to(ConfirmStatus::Approved)?;
        self.confirmed_at = Some(now);
        Ok(())
    }

    /// Donor declines the loan
    pub fn reject(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.transition_to(ConfirmStatus::Rejected)?;
        self.confirmed_at = Some(now);
        Ok(())
    }

    /// Closed because an administrator rejected the request first; no donor decision is recorded
    pub fn withdraw(&mut self) -> Result<()> {
        self.transition_to(ConfirmStatus::Rejected)
    }

    pub fn is_pending(&self) -> bool {
        self.status == ConfirmStatus::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn confirm() -> DonorConfirm {
        DonorConfirm::new(BorrowRecordId::new(), UserId::new(), Utc::now())
    }

    #[test]
    fn test_approve_stamps_time() {
        let mut c = confirm();
        let now = Utc::now();
        c.approve(now).unwrap();
        assert_eq!(c.status, ConfirmStatus::Approved);
        assert_eq!(c.confirmed_at, Some(now));
    }

    #[test]
    fn test_decided_once() {
        let mut c = confirm();
        c.reject(Utc::now()).unwrap();
        assert!(c.approve(Utc::now()).is_err());
        assert!(c.reject(Utc::now()).is_err());
        assert_eq!(c.status, ConfirmStatus::Rejected);
    }

    #[test]
    fn test_withdraw_leaves_no_decision_time() {
        let mut c = confirm();
        c.withdraw().unwrap();
        assert_eq!(c.status, ConfirmStatus::Rejected);
        assert!(c.confirmed_at.is_none());
    }
}
