//! The set of entity writes one workflow operation produces

use serde::Serialize;

use crate::error::{PersistenceError, Result};
use crate::model::{Book, BorrowRecord, DonationRequest, DonorConfirm};

/// A single entity in its post-transition state
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "entity", rename_all = "snake_case")]
pub enum Change {
    Book(Book),
    BorrowRecord(BorrowRecord),
    DonorConfirm(DonorConfirm),
    Donation(DonationRequest),
}

impl Change {
    pub fn entity(&self) -> &'static str {
        match self {
            Change::Book(_) => "Book",
            Change::BorrowRecord(_) => "BorrowRecord",
            Change::DonorConfirm(_) => "DonorConfirm",
            Change::Donation(_) => "DonationRequest",
        }
    }

    pub fn id(&self) -> String {
        match self {
            Change::Book(b) => b.id.to_string(),
            Change::BorrowRecord(r) => r.id.to_string(),
            Change::DonorConfirm(c) => c.id.to_string(),
            Change::Donation(d) => d.id.to_string(),
        }
    }

    pub fn status(&self) -> &'static str {
        match self {
            Change::Book(b) => b.status.as_str(),
            Change::BorrowRecord(r) => r.status.as_str(),
            Change::DonorConfirm(c) => c.status.as_str(),
            Change::Donation(d) => d.status.as_str(),
        }
    }
}

/// Every write of one operation, applied together or not at all
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Changeset {
    summary: String,
    changes: Vec<Change>,
}

impl Changeset {
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            changes: Vec::new(),
        }
    }

    pub fn with(mut self, change: Change) -> Self {
        self.changes.push(change);
        self
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn book(&self) -> Option<&Book> {
        self.changes.iter().find_map(|c| match c {
            Change::Book(b) => Some(b),
            _ => None,
        })
    }

    pub fn record(&self) -> Option<&BorrowRecord> {
        self.changes.iter().find_map(|c| match c {
            Change::BorrowRecord(r) => Some(r),
            _ => None,
        })
    }

    pub fn confirm(&self) -> Option<&DonorConfirm> {
        self.changes.iter().find_map(|c| match c {
            Change::DonorConfirm(c) => Some(c),
            _ => None,
        })
    }

    pub fn donation(&self) -> Option<&DonationRequest> {
        self.changes.iter().find_map(|c| match c {
            Change::Donation(d) => Some(d),
            _ => None,
        })
    }

    pub fn take_book(self) -> Result<Book> {
        let missing = self.missing("Book");
        self.changes
            .into_iter()
            .find_map(|c| match c {
                Change::Book(b) => Some(b),
                _ => None,
            })
            .ok_or_else(|| missing.into())
    }

    pub fn take_record(self) -> Result<BorrowRecord> {
        let missing = self.missing("BorrowRecord");
        self.changes
            .into_iter()
            .find_map(|c| match c {
                Change::BorrowRecord(r) => Some(r),
                _ => None,
            })
            .ok_or_else(|| missing.into())
    }

    pub fn take_confirm(self) -> Result<DonorConfirm> {
        let missing = self.missing("DonorConfirm");
        self.changes
            .into_iter()
            .find_map(|c| match c {
                Change::DonorConfirm(c) => Some(c),
                _ => None,
            })
            .ok_or_else(|| missing.into())
    }

    pub fn take_donation(self) -> Result<DonationRequest> {
        let missing = self.missing("DonationRequest");
        self.changes
            .into_iter()
            .find_map(|c| match c {
                Change::Donation(d) => Some(d),
                _ => None,
            })
            .ok_or_else(|| missing.into())
    }

    /// Split out a donation together with the book its approval created
    pub fn take_donation_with_book(self) -> Result<(DonationRequest, Book)> {
        let missing_donation = self.missing("DonationRequest");
        let missing_book = self.missing("Book");
        let mut donation = None;
        let mut book = None;
        for change in self.changes {
            match change {
                Change::Donation(d) if donation.is_none() => donation = Some(d),
                Change::Book(b) if book.is_none() => book = Some(b),
                _ => {}
            }
        }
        let donation = donation.ok_or(missing_donation)?;
        let book = book.ok_or(missing_book)?;
        Ok((donation, book))
    }

    fn missing(&self, entity: &str) -> PersistenceError {
        PersistenceError::Inconsistent(format!("{} produced no {}", self.summary, entity))
    }
}
