//! Workflow commands and their planning
//!
//! [`Command::plan`] reads current state through the store traits, checks
//! every precondition and returns the [`Changeset`] of dependent writes. It
//! never writes; the engine applies the changeset inside the same
//! transaction the reads ran in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Change, Changeset};
use crate::config::PolicyConfig;
use crate::error::{LendingError, Result};
use crate::model::{
    Actor, Book, BookId, BookMetadata, BookStatus, BorrowRecord, BorrowRecordId, BorrowStatus,
    DonationId, DonationRequest, DonorConfirm, DonorConfirmId, UserId,
};
use crate::policy::Policy;
use crate::store::{RecordStore, SettingsStore};

/// Operations that move books, borrow records, donor confirmations and
/// donation requests between states
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    /// File a borrow request for an available book
    RequestBorrow { book_id: BookId },

    /// Admin approves a pending request; the loan starts
    ApproveBorrow { record_id: BorrowRecordId },

    /// Admin rejects a pending or donor-pending request
    RejectBorrow { record_id: BorrowRecordId },

    /// Borrower announces the return of an approved loan
    RequestReturn { record_id: BorrowRecordId },

    /// Admin confirms the book is back on the shelf
    ConfirmReturn { record_id: BorrowRecordId },

    /// Donor consents to a loan of their book
    ApproveConfirm { confirm_id: DonorConfirmId },

    /// Donor declines a loan of their book
    RejectConfirm { confirm_id: DonorConfirmId },

    /// Offer a book to the library
    CreateDonation {
        metadata: BookMetadata,
        #[serde(default)]
        reason: String,
    },

    /// Admin accepts a donation; the book enters the catalog
    ApproveDonation { donation_id: DonationId },

    /// Admin declines a donation
    RejectDonation { donation_id: DonationId },

    /// Admin adds a book to the catalog directly
    AddBook {
        metadata: BookMetadata,
        #[serde(default)]
        donor_id: Option<UserId>,
    },

    /// Admin edits a book's descriptive fields
    UpdateBook {
        book_id: BookId,
        metadata: BookMetadata,
    },

    /// Admin withdraws a book or puts it back on the shelf
    SetBookStatus { book_id: BookId, status: BookStatus },
}

impl Command {
    /// Short operation name used in logs and changeset summaries
    pub fn name(&self) -> &'static str {
        match self {
            Command::RequestBorrow { .. } => "request_borrow",
            Command::ApproveBorrow { .. } => "approve_borrow",
            Command::RejectBorrow { .. } => "reject_borrow",
            Command::RequestReturn { .. } => "request_return",
            Command::ConfirmReturn { .. } => "confirm_return",
            Command::ApproveConfirm { .. } => "approve_confirm",
            Command::RejectConfirm { .. } => "reject_confirm",
            Command::CreateDonation { .. } => "create_donation",
            Command::ApproveDonation { .. } => "approve_donation",
            Command::RejectDonation { .. } => "reject_donation",
            Command::AddBook { .. } => "add_book",
            Command::UpdateBook { .. } => "update_book",
            Command::SetBookStatus { .. } => "set_book_status",
        }
    }

    /// Check preconditions against `store` and compute the resulting writes
    pub fn plan<S>(
        self,
        actor: &Actor,
        store: &S,
        defaults: &PolicyConfig,
        now: DateTime<Utc>,
    ) -> Result<Changeset>
    where
        S: RecordStore + SettingsStore + ?Sized,
    {
        let name = self.name();
        debug!(command = name, user = %actor.user_id, "Planning command");
        let changeset = Changeset::new(name);

        match self {
            Command::RequestBorrow { book_id } => {
                let mut book = require_book(store, book_id)?;
                if !book.is_available() {
                    return Err(LendingError::InvalidState(format!(
                        "book {} is not available (status: {})",
                        book.id, book.status
                    )));
                }

                let policy = Policy::resolve(store, defaults)?;
                let active = store.count_active_records(actor.user_id)?;
                if active >= policy.max_books_per_user {
                    return Err(LendingError::LimitExceeded {
                        limit: policy.max_books_per_user,
                    });
                }

                book.transition_to(BookStatus::PendingBorrow)?;
                let donor = book.consenting_donor();
                let record = BorrowRecord::request(book.id, actor.user_id, donor.is_some(), now);

                let mut changeset = changeset.with(Change::BorrowRecord(record.clone()));
                if let Some(donor) = donor {
                    changeset =
                        changeset.with(Change::DonorConfirm(DonorConfirm::new(record.id, donor, now)));
                }
                Ok(changeset.with(Change::Book(book)))
            }

            Command::ApproveBorrow { record_id } => {
                actor.require_admin(name)?;
                let mut record = require_record(store, record_id)?;
                let mut book = require_book(store, record.book_id)?;
                record.approve(now)?;
                book.transition_to(BookStatus::Borrowed)?;
                Ok(changeset
                    .with(Change::BorrowRecord(record))
                    .with(Change::Book(book)))
            }

            Command::RejectBorrow { record_id } => {
                actor.require_admin(name)?;
                let mut record = require_record(store, record_id)?;
                let mut book = require_book(store, record.book_id)?;
                let was_donor_pending = record.status == BorrowStatus::DonorPending;
                record.reject()?;
                book.transition_to(BookStatus::Available)?;

                let mut changeset = changeset.with(Change::BorrowRecord(record.clone()));
                if was_donor_pending {
                    // Close the donor's outstanding question without recording a decision
                    if let Some(mut confirm) = store.confirm_for_record(record.id)? {
                        if confirm.is_pending() {
                            confirm.withdraw()?;
                            changeset = changeset.with(Change::DonorConfirm(confirm));
                        }
                    }
                }
                Ok(changeset.with(Change::Book(book)))
            }

            Command::RequestReturn { record_id } => {
                let mut record = require_record(store, record_id)?;
                if !record.is_borrowed_by(actor.user_id) {
                    return Err(LendingError::Forbidden(
                        "only the borrower can return this book".to_string(),
                    ));
                }
                let mut book = require_book(store, record.book_id)?;
                record.request_return()?;
                book.transition_to(BookStatus::PendingReturn)?;
                Ok(changeset
                    .with(Change::BorrowRecord(record))
                    .with(Change::Book(book)))
            }

            Command::ConfirmReturn { record_id } => {
                actor.require_admin(name)?;
                let mut record = require_record(store, record_id)?;
                let mut book = require_book(store, record.book_id)?;
                record.complete(now)?;
                book.transition_to(BookStatus::Available)?;
                Ok(changeset
                    .with(Change::BorrowRecord(record))
                    .with(Change::Book(book)))
            }

            Command::ApproveConfirm { confirm_id } => {
                let (mut confirm, mut record) = require_donor_decision(store, actor, confirm_id)?;
                confirm.approve(now)?;
                record.release_to_admin()?;
                Ok(changeset
                    .with(Change::DonorConfirm(confirm))
                    .with(Change::BorrowRecord(record)))
            }

            Command::RejectConfirm { confirm_id } => {
                let (mut confirm, mut record) = require_donor_decision(store, actor, confirm_id)?;
                let mut book = require_book(store, record.book_id)?;
                confirm.reject(now)?;
                record.reject()?;
                book.transition_to(BookStatus::Available)?;
                Ok(changeset
                    .with(Change::DonorConfirm(confirm))
                    .with(Change::BorrowRecord(record))
                    .with(Change::Book(book)))
            }

            Command::CreateDonation { metadata, reason } => {
                let donation = DonationRequest::new(actor.user_id, metadata, reason, now);
                donation.validate()?;
                Ok(changeset.with(Change::Donation(donation)))
            }

            Command::ApproveDonation { donation_id } => {
                actor.require_admin(name)?;
                let mut donation = require_donation(store, donation_id)?;
                let book = donation.approve(now)?;
                Ok(changeset
                    .with(Change::Donation(donation))
                    .with(Change::Book(book)))
            }

            Command::RejectDonation { donation_id } => {
                actor.require_admin(name)?;
                let mut donation = require_donation(store, donation_id)?;
                donation.reject()?;
                Ok(changeset.with(Change::Donation(donation)))
            }

            Command::AddBook { metadata, donor_id } => {
                actor.require_admin(name)?;
                let mut book = match donor_id {
                    Some(donor) => {
                        if store.user(donor)?.is_none() {
                            return Err(LendingError::not_found("User", donor));
                        }
                        Book::donated(metadata, donor)
                    }
                    None => Book::new(metadata),
                };
                book.metadata.validate()?;
                book.created_at = now;
                Ok(changeset.with(Change::Book(book)))
            }

            Command::UpdateBook { book_id, metadata } => {
                actor.require_admin(name)?;
                let mut book = require_book(store, book_id)?;
                let metadata = metadata.normalized();
                metadata.validate()?;
                book.metadata = metadata;
                Ok(changeset.with(Change::Book(book)))
            }

            Command::SetBookStatus { book_id, status } => {
                actor.require_admin(name)?;
                if !status.is_manual() {
                    return Err(LendingError::Validation(format!(
                        "status can only be set to available or unavailable, not {}",
                        status
                    )));
                }
                let mut book = require_book(store, book_id)?;
                if let Some(active) = store.active_record_for_book(book_id)? {
                    return Err(LendingError::InvalidState(format!(
                        "book {} is held by borrow record {} ({})",
                        book.id, active.id, active.status
                    )));
                }
                if book.status != status {
                    book.transition_to(status)?;
                }
                Ok(changeset.with(Change::Book(book)))
            }
        }
    }
}

fn require_book<S: RecordStore + ?Sized>(store: &S, id: BookId) -> Result<Book> {
    store
        .book(id)?
        .ok_or_else(|| LendingError::not_found("Book", id))
}

fn require_record<S: RecordStore + ?Sized>(store: &S, id: BorrowRecordId) -> Result<BorrowRecord> {
    store
        .borrow_record(id)?
        .ok_or_else(|| LendingError::not_found("BorrowRecord", id))
}

fn require_donation<S: RecordStore + ?Sized>(store: &S, id: DonationId) -> Result<DonationRequest> {
    store
        .donation(id)?
        .ok_or_else(|| LendingError::not_found("DonationRequest", id))
}

/// Load a confirmation the caller may decide, together with its record
///
/// Both sides must still be open: the confirmation pending and the record
/// donor-pending. An admin rejection that landed first closes both, so a late
/// donor decision fails here instead of resurrecting the request.
fn require_donor_decision<S: RecordStore + ?Sized>(
    store: &S,
    actor: &Actor,
    id: DonorConfirmId,
) -> Result<(DonorConfirm, BorrowRecord)> {
    let confirm = store
        .donor_confirm(id)?
        .ok_or_else(|| LendingError::not_found("DonorConfirm", id))?;
    if confirm.donor_id != actor.user_id {
        return Err(LendingError::Forbidden(
            "only the donor can decide this confirmation".to_string(),
        ));
    }
    if !confirm.is_pending() {
        return Err(LendingError::InvalidState(format!(
            "donor confirmation {} is already {}",
            confirm.id, confirm.status
        )));
    }
    let record = require_record(store, confirm.borrow_record_id)?;
    if record.status != BorrowStatus::DonorPending {
        return Err(LendingError::InvalidState(format!(
            "borrow record {} is {}, not awaiting the donor",
            record.id, record.status
        )));
    }
    Ok((confirm, record))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BookSource, ConfirmStatus, DonationStatus, User};
    use crate::store::SettingsStore;
    use std::cell::RefCell;
    use std::collections::{BTreeMap, HashMap};

    /// In-memory store for planning tests
    #[derive(Default)]
    struct Fixture {
        books: RefCell<HashMap<BookId, Book>>,
        records: RefCell<HashMap<BorrowRecordId, BorrowRecord>>,
        confirms: RefCell<HashMap<DonorConfirmId, DonorConfirm>>,
        donations: RefCell<HashMap<DonationId, DonationRequest>>,
        users: HashMap<UserId, User>,
        settings: BTreeMap<String, String>,
    }

    impl RecordStore for Fixture {
        fn book(&self, id: BookId) -> Result<Option<Book>> {
            Ok(self.books.borrow().get(&id).cloned())
        }

        fn borrow_record(&self, id: BorrowRecordId) -> Result<Option<BorrowRecord>> {
            Ok(self.records.borrow().get(&id).cloned())
        }

        fn active_record_for_book(&self, book: BookId) -> Result<Option<BorrowRecord>> {
            Ok(self
                .records
                .borrow()
                .values()
                .find(|r| r.book_id == book && r.status.is_active())
                .cloned())
        }

        fn count_active_records(&self, borrower: UserId) -> Result<u32> {
            Ok(self
                .records
                .borrow()
                .values()
                .filter(|r| r.borrower_id == borrower && r.status.is_active())
                .count() as u32)
        }

        fn donor_confirm(&self, id: DonorConfirmId) -> Result<Option<DonorConfirm>> {
            Ok(self.confirms.borrow().get(&id).cloned())
        }

        fn confirm_for_record(&self, record: BorrowRecordId) -> Result<Option<DonorConfirm>> {
            Ok(self
                .confirms
                .borrow()
                .values()
                .find(|c| c.borrow_record_id == record)
                .cloned())
        }

        fn donation(&self, id: DonationId) -> Result<Option<DonationRequest>> {
            Ok(self.donations.borrow().get(&id).cloned())
        }

        fn user(&self, id: UserId) -> Result<Option<User>> {
            Ok(self.users.get(&id).cloned())
        }

        fn apply(&self, changeset: &Changeset) -> Result<()> {
            for change in changeset.changes() {
                match change.clone() {
                    Change::Book(b) => {
                        self.books.borrow_mut().insert(b.id, b);
                    }
                    Change::BorrowRecord(r) => {
                        self.records.borrow_mut().insert(r.id, r);
                    }
                    Change::DonorConfirm(c) => {
                        self.confirms.borrow_mut().insert(c.id, c);
                    }
                    Change::Donation(d) => {
                        self.donations.borrow_mut().insert(d.id, d);
                    }
                }
            }
            Ok(())
        }
    }

    impl SettingsStore for Fixture {
        fn setting(&self, key: &str) -> Result<Option<String>> {
            Ok(self.settings.get(key).cloned())
        }

        fn settings(&self) -> Result<BTreeMap<String, String>> {
            Ok(self.settings.clone())
        }
    }

    impl Fixture {
        fn with_book(&self, book: Book) -> BookId {
            let id = book.id;
            self.books.borrow_mut().insert(id, book);
            id
        }

        fn run(&self, actor: &Actor, command: Command) -> Result<Changeset> {
            let changeset = command.plan(actor, self, &PolicyConfig::default(), Utc::now())?;
            self.apply(&changeset)?;
            Ok(changeset)
        }

        fn book_status(&self, id: BookId) -> BookStatus {
            self.books.borrow()[&id].status
        }
    }

    fn class_book() -> Book {
        Book::new(BookMetadata::new("Dune", "Herbert", "Chilton"))
    }

    fn admin() -> Actor {
        Actor::admin(UserId::new())
    }

    #[test]
    fn test_request_class_book() {
        let store = Fixture::default();
        let book_id = store.with_book(class_book());
        let reader = Actor::user(UserId::new());

        let changeset = store
            .run(&reader, Command::RequestBorrow { book_id })
            .unwrap();

        let record = changeset.record().unwrap();
        assert_eq!(record.status, BorrowStatus::Pending);
        assert_eq!(record.borrower_id, reader.user_id);
        assert!(changeset.confirm().is_none());
        assert_eq!(store.book_status(book_id), BookStatus::PendingBorrow);
    }

    #[test]
    fn test_request_donated_book_pairs_confirmation() {
        let store = Fixture::default();
        let donor = UserId::new();
        let book_id = store.with_book(Book::donated(
            BookMetadata::new("Gift", "A", "P"),
            donor,
        ));

        let changeset = store
            .run(&Actor::user(UserId::new()), Command::RequestBorrow { book_id })
            .unwrap();

        let record = changeset.record().unwrap();
        let confirm = changeset.confirm().unwrap();
        assert_eq!(record.status, BorrowStatus::DonorPending);
        assert_eq!(confirm.borrow_record_id, record.id);
        assert_eq!(confirm.donor_id, donor);
        assert_eq!(confirm.status, ConfirmStatus::Pending);
        assert_eq!(store.book_status(book_id), BookStatus::PendingBorrow);
    }

    #[test]
    fn test_request_unavailable_book_writes_nothing() {
        let store = Fixture::default();
        let book_id = store.with_book(class_book());
        store
            .run(&Actor::user(UserId::new()), Command::RequestBorrow { book_id })
            .unwrap();

        let err = store
            .run(&Actor::user(UserId::new()), Command::RequestBorrow { book_id })
            .unwrap_err();
        assert!(matches!(err, LendingError::InvalidState(_)));
        assert_eq!(store.records.borrow().len(), 1);
    }

    #[test]
    fn test_request_missing_book() {
        let store = Fixture::default();
        let err = store
            .run(
                &Actor::user(UserId::new()),
                Command::RequestBorrow {
                    book_id: BookId::new(),
                },
            )
            .unwrap_err();
        assert!(matches!(err, LendingError::NotFound { entity: "Book", .. }));
    }

    #[test]
    fn test_limit_uses_stored_setting() {
        let mut store = Fixture::default();
        store
            .settings
            .insert("max_books_per_user".to_string(), "1".to_string());
        let reader = Actor::user(UserId::new());
        let first = store.with_book(class_book());
        let second = store.with_book(class_book());

        store
            .run(&reader, Command::RequestBorrow { book_id: first })
            .unwrap();
        let err = store
            .run(&reader, Command::RequestBorrow { book_id: second })
            .unwrap_err();
        assert!(matches!(err, LendingError::LimitExceeded { limit: 1 }));
        assert_eq!(store.book_status(second), BookStatus::Available);
    }

    #[test]
    fn test_admin_operations_require_admin() {
        let store = Fixture::default();
        let book_id = store.with_book(class_book());
        let reader = Actor::user(UserId::new());
        let record = store
            .run(&reader, Command::RequestBorrow { book_id })
            .unwrap()
            .take_record()
            .unwrap();

        let err = store
            .run(&reader, Command::ApproveBorrow { record_id: record.id })
            .unwrap_err();
        assert!(matches!(err, LendingError::Forbidden(_)));
        assert_eq!(store.book_status(book_id), BookStatus::PendingBorrow);
    }

    #[test]
    fn test_approve_only_from_pending() {
        let store = Fixture::default();
        let book_id = store.with_book(Book::donated(class_book().metadata, UserId::new()));
        let record = store
            .run(&Actor::user(UserId::new()), Command::RequestBorrow { book_id })
            .unwrap()
            .take_record()
            .unwrap();

        let err = store
            .run(&admin(), Command::ApproveBorrow { record_id: record.id })
            .unwrap_err();
        assert!(matches!(err, LendingError::InvalidTransition { .. }));
        assert_eq!(store.book_status(book_id), BookStatus::PendingBorrow);
    }

    #[test]
    fn test_return_by_someone_else_is_forbidden() {
        let store = Fixture::default();
        let book_id = store.with_book(class_book());
        let record = store
            .run(&Actor::user(UserId::new()), Command::RequestBorrow { book_id })
            .unwrap()
            .take_record()
            .unwrap();
        store
            .run(&admin(), Command::ApproveBorrow { record_id: record.id })
            .unwrap();

        let err = store
            .run(
                &Actor::user(UserId::new()),
                Command::RequestReturn { record_id: record.id },
            )
            .unwrap_err();
        assert!(matches!(err, LendingError::Forbidden(_)));
        assert_eq!(store.book_status(book_id), BookStatus::Borrowed);
    }

    #[test]
    fn test_admin_reject_withdraws_pending_confirmation() {
        let store = Fixture::default();
        let donor = UserId::new();
        let book_id = store.with_book(Book::donated(class_book().metadata, donor));
        let changeset = store
            .run(&Actor::user(UserId::new()), Command::RequestBorrow { book_id })
            .unwrap();
        let record = changeset.record().unwrap().clone();
        let confirm = changeset.confirm().unwrap().clone();

        store
            .run(&admin(), Command::RejectBorrow { record_id: record.id })
            .unwrap();

        let stored = store.confirms.borrow()[&confirm.id].clone();
        assert_eq!(stored.status, ConfirmStatus::Rejected);
        assert!(stored.confirmed_at.is_none());
        assert_eq!(store.book_status(book_id), BookStatus::Available);

        // The donor's late decision finds nothing left to decide
        let err = store
            .run(
                &Actor::user(donor),
                Command::ApproveConfirm {
                    confirm_id: confirm.id,
                },
            )
            .unwrap_err();
        assert!(matches!(err, LendingError::InvalidState(_)));
    }

    #[test]
    fn test_confirmation_belongs_to_donor() {
        let store = Fixture::default();
        let book_id = store.with_book(Book::donated(class_book().metadata, UserId::new()));
        let confirm = store
            .run(&Actor::user(UserId::new()), Command::RequestBorrow { book_id })
            .unwrap()
            .take_confirm()
            .unwrap();

        // Not even an administrator may answer for the donor
        let err = store
            .run(
                &admin(),
                Command::RejectConfirm {
                    confirm_id: confirm.id,
                },
            )
            .unwrap_err();
        assert!(matches!(err, LendingError::Forbidden(_)));
    }

    #[test]
    fn test_donation_approval_creates_book() {
        let store = Fixture::default();
        let donor = Actor::user(UserId::new());
        let donation = store
            .run(
                &donor,
                Command::CreateDonation {
                    metadata: BookMetadata::new("X", "Y", "Z"),
                    reason: "spare".to_string(),
                },
            )
            .unwrap()
            .take_donation()
            .unwrap();
        assert!(store.books.borrow().is_empty());

        let changeset = store
            .run(
                &admin(),
                Command::ApproveDonation {
                    donation_id: donation.id,
                },
            )
            .unwrap();
        assert_eq!(changeset.donation().unwrap().status, DonationStatus::Approved);
        let book = changeset.book().unwrap();
        assert_eq!(book.source, BookSource::Donated);
        assert_eq!(book.donor_id, Some(donor.user_id));
        assert_eq!(book.status, BookStatus::Available);
    }

    #[test]
    fn test_set_status_refused_while_held() {
        let store = Fixture::default();
        let book_id = store.with_book(class_book());
        store
            .run(&Actor::user(UserId::new()), Command::RequestBorrow { book_id })
            .unwrap();

        let err = store
            .run(
                &admin(),
                Command::SetBookStatus {
                    book_id,
                    status: BookStatus::Unavailable,
                },
            )
            .unwrap_err();
        assert!(matches!(err, LendingError::InvalidState(_)));

        let err = store
            .run(
                &admin(),
                Command::SetBookStatus {
                    book_id,
                    status: BookStatus::Borrowed,
                },
            )
            .unwrap_err();
        assert!(matches!(err, LendingError::Validation(_)));
    }

    #[test]
    fn test_set_status_round_trip() {
        let store = Fixture::default();
        let book_id = store.with_book(class_book());
        for status in [BookStatus::Unavailable, BookStatus::Unavailable, BookStatus::Available] {
            store
                .run(&admin(), Command::SetBookStatus { book_id, status })
                .unwrap();
            assert_eq!(store.book_status(book_id), status);
        }
    }

    #[test]
    fn test_command_json_shape() {
        let id = BookId::new();
        let json = serde_json::to_value(Command::RequestBorrow { book_id: id }).unwrap();
        assert_eq!(json["command"], "request_borrow");
        assert_eq!(json["book_id"], id.to_string());
    }
}
