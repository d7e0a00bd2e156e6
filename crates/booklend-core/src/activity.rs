//! Borrow, confirmation and donation queries for readers, donors and admins

use serde::Serialize;

use crate::engine::Library;
use crate::error::Result;
use crate::model::{
    Actor, Book, BorrowRecord, BorrowStatus, ConfirmStatus, DonationRequest, DonationStatus,
    DonorConfirm,
};
use crate::store::{BookFilter, RecordStore, StatusFilter};

/// A donor confirmation awaiting an answer, with the request it gates
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingConfirm {
    #[serde(flatten)]
    pub confirm: DonorConfirm,
    pub borrow_record: Option<BorrowRecord>,
    pub book: Option<Book>,
}

/// A book the caller donated, flagged with any loan awaiting their consent
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DonatedBook {
    #[serde(flatten)]
    pub book: Book,
    pub has_pending_confirm: bool,
    pub pending_confirm: Option<PendingConfirm>,
}

/// Everything the caller has given or offered
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DonationOverview {
    pub donations: Vec<DonationRequest>,
    pub donated_books: Vec<DonatedBook>,
}

impl Library {
    /// The caller's borrow records, newest first
    pub fn my_records(&self, actor: &Actor) -> Result<Vec<BorrowRecord>> {
        self.repo().read(|session| {
            session.borrow_records(&StatusFilter::all().owned_by(actor.user_id))
        })
    }

    /// Every borrow record, optionally narrowed to one status
    pub fn all_records(
        &self,
        actor: &Actor,
        status: Option<BorrowStatus>,
    ) -> Result<Vec<BorrowRecord>> {
        actor.require_admin("list borrow records")?;
        self.repo()
            .read(|session| session.borrow_records(&StatusFilter::all().status_opt(status)))
    }

    /// Confirmations still waiting on the caller as donor
    pub fn pending_confirms(&self, actor: &Actor) -> Result<Vec<PendingConfirm>> {
        self.repo().read(|session| {
            let filter = StatusFilter::all()
                .owned_by(actor.user_id)
                .status(ConfirmStatus::Pending);
            session
                .donor_confirms(&filter)?
                .into_iter()
                .map(|confirm| -> Result<PendingConfirm> {
                    let borrow_record = session.borrow_record(confirm.borrow_record_id)?;
                    let book = match &borrow_record {
                        Some(record) => session.book(record.book_id)?,
                        None => None,
                    };
                    Ok(PendingConfirm {
                        confirm,
                        borrow_record,
                        book,
                    })
                })
                .collect()
        })
    }

    /// The caller's donation requests and the books they donated
    pub fn my_donations(&self, actor: &Actor) -> Result<DonationOverview> {
        let pending = self.pending_confirms(actor)?;
        self.repo().read(|session| {
            let donations =
                session.donations(&StatusFilter::all().owned_by(actor.user_id))?;
            let donated_books = session
                .books(&BookFilter::all().donated_by(actor.user_id))?
                .into_iter()
                .map(|book| {
                    let pending_confirm = pending
                        .iter()
                        .find(|p| {
                            p.borrow_record
                                .as_ref()
                                .is_some_and(|r| r.book_id == book.id)
                        })
                        .cloned();
                    DonatedBook {
                        has_pending_confirm: pending_confirm.is_some(),
                        pending_confirm,
                        book,
                    }
                })
                .collect();
            Ok(DonationOverview {
                donations,
                donated_books,
            })
        })
    }

    /// Every donation request, optionally narrowed to one status
    pub fn all_donations(
        &self,
        actor: &Actor,
        status: Option<DonationStatus>,
    ) -> Result<Vec<DonationRequest>> {
        actor.require_admin("list donations")?;
        self.repo()
            .read(|session| session.donations(&StatusFilter::all().status_opt(status)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LendingError;
    use crate::model::{BookMetadata, UserId};

    #[test]
    fn test_donor_sees_pending_request() {
        let mut lib = Library::in_memory().unwrap();
        let admin = Actor::admin(UserId::new());
        let donor = Actor::user(UserId::new());
        let reader = Actor::user(UserId::new());

        let donation = lib
            .create_donation(&donor, BookMetadata::new("Gift", "A", "P"), "")
            .unwrap();
        let (_, book) = lib.approve_donation(&admin, donation.id).unwrap();

        let overview = lib.my_donations(&donor).unwrap();
        assert_eq!(overview.donations.len(), 1);
        assert_eq!(overview.donated_books.len(), 1);
        assert!(!overview.donated_books[0].has_pending_confirm);

        let record = lib.request_borrow(&reader, book.id).unwrap();

        let pending = lib.pending_confirms(&donor).unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].borrow_record.as_ref().map(|r| r.id), Some(record.id));
        assert_eq!(pending[0].book.as_ref().map(|b| b.id), Some(book.id));

        let overview = lib.my_donations(&donor).unwrap();
        assert!(overview.donated_books[0].has_pending_confirm);
        assert!(lib.pending_confirms(&reader).unwrap().is_empty());
    }

    #[test]
    fn test_admin_listing_filters() {
        let mut lib = Library::in_memory().unwrap();
        let admin = Actor::admin(UserId::new());
        let reader = Actor::user(UserId::new());
        let book = lib
            .add_book(&admin, BookMetadata::new("Dune", "Herbert", "Chilton"), None)
            .unwrap();
        lib.request_borrow(&reader, book.id).unwrap();

        assert_eq!(lib.all_records(&admin, None).unwrap().len(), 1);
        assert_eq!(
            lib.all_records(&admin, Some(BorrowStatus::Pending))
                .unwrap()
                .len(),
            1
        );
        assert!(lib
            .all_records(&admin, Some(BorrowStatus::Approved))
            .unwrap()
            .is_empty());
        assert_eq!(lib.my_records(&reader).unwrap().len(), 1);

        let err = lib.all_records(&reader, None).unwrap_err();
        assert!(matches!(err, LendingError::Forbidden(_)));
        let err = lib.all_donations(&reader, None).unwrap_err();
        assert!(matches!(err, LendingError::Forbidden(_)));
    }
}
