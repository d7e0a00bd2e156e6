//! Record and settings storage
//!
//! The workflow engine only sees the [`RecordStore`] and [`SettingsStore`]
//! traits. [`Session`] implements both on top of one SQLite connection or
//! transaction owned by a [`Repository`].

mod repository;
mod schema;
mod session;

use std::collections::BTreeMap;

pub use repository::Repository;
pub use schema::{Schema, SCHEMA_VERSION};
pub use session::{BookStats, RankEntry, Session};

use crate::error::Result;
use crate::model::{
    Book, BookId, BookStatus, BorrowRecord, BorrowRecordId, DonationId, DonationRequest,
    DonorConfirm, DonorConfirmId, User, UserId,
};
use crate::workflow::Changeset;

/// Entity persistence as seen by the workflow engine
pub trait RecordStore {
    fn book(&self, id: BookId) -> Result<Option<Book>>;

    fn borrow_record(&self, id: BorrowRecordId) -> Result<Option<BorrowRecord>>;

    /// The record currently holding `book`, if any
    fn active_record_for_book(&self, book: BookId) -> Result<Option<BorrowRecord>>;

    /// Number of records in an active status filed by `borrower`
    fn count_active_records(&self, borrower: UserId) -> Result<u32>;

    fn donor_confirm(&self, id: DonorConfirmId) -> Result<Option<DonorConfirm>>;

    /// The confirmation paired with a borrow record
    fn confirm_for_record(&self, record: BorrowRecordId) -> Result<Option<DonorConfirm>>;

    fn donation(&self, id: DonationId) -> Result<Option<DonationRequest>>;

    fn user(&self, id: UserId) -> Result<Option<User>>;

    /// Write every entity in the changeset
    fn apply(&self, changeset: &Changeset) -> Result<()>;
}

/// String-keyed settings
pub trait SettingsStore {
    fn setting(&self, key: &str) -> Result<Option<String>>;

    /// All stored settings
    fn settings(&self) -> Result<BTreeMap<String, String>>;
}

/// Catalog query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookFilter {
    /// Case-insensitive match on title, author or tag
    pub keyword: Option<String>,
    pub status: Option<BookStatus>,
    pub donor: Option<UserId>,
}

impl BookFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn keyword(mut self, keyword: impl Into<String>) -> Self {
        let keyword = keyword.into();
        self.keyword = Some(keyword.trim().to_string()).filter(|k| !k.is_empty());
        self
    }

    pub fn status(mut self, status: BookStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn donated_by(mut self, donor: UserId) -> Self {
        self.donor = Some(donor);
        self
    }

    pub(crate) fn matches(&self, book: &Book) -> bool {
        self.keyword
            .as_deref()
            .map_or(true, |k| book.metadata.matches_keyword(k))
    }
}

/// Query over entities that have an owning user and a status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusFilter<S> {
    pub owner: Option<UserId>,
    pub status: Option<S>,
}

impl<S> StatusFilter<S> {
    pub fn all() -> Self {
        Self {
            owner: None,
            status: None,
        }
    }

    pub fn owned_by(mut self, owner: UserId) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn status(mut self, status: S) -> Self {
        self.status = Some(status);
        self
    }

    /// Apply an optional status, as supplied by a query string
    pub fn status_opt(mut self, status: Option<S>) -> Self {
        self.status = status;
        self
    }
}

impl<S> Default for StatusFilter<S> {
    fn default() -> Self {
        Self::all()
    }
}
