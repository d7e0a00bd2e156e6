//! The lending engine: atomic execution of workflow commands

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use crate::config::{LendingConfig, PolicyConfig};
use crate::error::{ErrorKind, Result};
use crate::model::{
    Actor, Book, BookId, BookMetadata, BookStatus, BorrowRecord, BorrowRecordId, DonationId,
    DonationRequest, DonorConfirm, DonorConfirmId, UserId,
};
use crate::policy::Policy;
use crate::store::{RecordStore, Repository};
use crate::workflow::{Changeset, Command};

/// Entry point for every lending operation
///
/// Each command is planned and applied inside one `BEGIN IMMEDIATE`
/// transaction, so its precondition reads and its writes are serialized
/// against every other writer of the database.
pub struct Library {
    repo: Repository,
    defaults: PolicyConfig,
}

impl Library {
    pub fn new(repo: Repository, defaults: PolicyConfig) -> Self {
        Self { repo, defaults }
    }

    /// Open the configured database
    pub fn open(config: &LendingConfig) -> Result<Self> {
        let repo = Repository::open(&config.database)?;
        Ok(Self::new(repo, config.policy.clone()))
    }

    /// A library over a fresh in-memory database with default policy
    pub fn in_memory() -> Result<Self> {
        Ok(Self::new(Repository::in_memory()?, PolicyConfig::default()))
    }

    pub fn defaults(&self) -> &PolicyConfig {
        &self.defaults
    }

    pub(crate) fn repo(&self) -> &Repository {
        &self.repo
    }

    pub(crate) fn repo_mut(&mut self) -> &mut Repository {
        &mut self.repo
    }

    /// Plan and apply a command as of now
    pub fn execute(&mut self, actor: &Actor, command: Command) -> Result<Changeset> {
        self.execute_at(actor, command, Utc::now())
    }

    /// Plan and apply a command as of `now`
    pub fn execute_at(
        &mut self,
        actor: &Actor,
        command: Command,
        now: DateTime<Utc>,
    ) -> Result<Changeset> {
        let name = command.name();
        let defaults = &self.defaults;
        let result = self.repo.transaction(|session| {
            let changeset = command.plan(actor, session, defaults, now)?;
            session.apply(&changeset)?;
            Ok(changeset)
        });

        match &result {
            Ok(changeset) => {
                for change in changeset.changes() {
                    info!(
                        command = name,
                        user = %actor.user_id,
                        entity = change.entity(),
                        id = %change.id(),
                        status = change.status(),
                        "Applied transition"
                    );
                }
            }
            Err(e) if e.kind() == ErrorKind::Internal => {
                error!(command = name, user = %actor.user_id, error = %e, "Command failed");
            }
            Err(e) => {
                warn!(command = name, user = %actor.user_id, error = %e, "Command refused");
            }
        }
        result
    }

    // ==================== Borrow workflow ====================

    pub fn request_borrow(&mut self, actor: &Actor, book_id: BookId) -> Result<BorrowRecord> {
        self.execute(actor, Command::RequestBorrow { book_id })?
            .take_record()
    }

    pub fn approve_borrow(
        &mut self,
        actor: &Actor,
        record_id: BorrowRecordId,
    ) -> Result<BorrowRecord> {
        self.execute(actor, Command::ApproveBorrow { record_id })?
            .take_record()
    }

    pub fn reject_borrow(
        &mut self,
        actor: &Actor,
        record_id: BorrowRecordId,
    ) -> Result<BorrowRecord> {
        self.execute(actor, Command::RejectBorrow { record_id })?
            .take_record()
    }

    pub fn request_return(
        &mut self,
        actor: &Actor,
        record_id: BorrowRecordId,
    ) -> Result<BorrowRecord> {
        self.execute(actor, Command::RequestReturn { record_id })?
            .take_record()
    }

    pub fn confirm_return(
        &mut self,
        actor: &Actor,
        record_id: BorrowRecordId,
    ) -> Result<BorrowRecord> {
        self.execute(actor, Command::ConfirmReturn { record_id })?
            .take_record()
    }

    // ==================== Donor confirmation ====================

    pub fn approve_confirm(
        &mut self,
        actor: &Actor,
        confirm_id: DonorConfirmId,
    ) -> Result<DonorConfirm> {
        self.execute(actor, Command::ApproveConfirm { confirm_id })?
            .take_confirm()
    }

    pub fn reject_confirm(
        &mut self,
        actor: &Actor,
        confirm_id: DonorConfirmId,
    ) -> Result<DonorConfirm> {
        self.execute(actor, Command::RejectConfirm { confirm_id })?
            .take_confirm()
    }

    // ==================== Donations ====================

    pub fn create_donation(
        &mut self,
        actor: &Actor,
        metadata: BookMetadata,
        reason: impl Into<String>,
    ) -> Result<DonationRequest> {
        self.execute(
            actor,
            Command::CreateDonation {
                metadata,
                reason: reason.into(),
            },
        )?
        .take_donation()
    }

    /// Approve a donation; returns the approved request and the book it created
    pub fn approve_donation(
        &mut self,
        actor: &Actor,
        donation_id: DonationId,
    ) -> Result<(DonationRequest, Book)> {
        self.execute(actor, Command::ApproveDonation { donation_id })?
            .take_donation_with_book()
    }

    pub fn reject_donation(
        &mut self,
        actor: &Actor,
        donation_id: DonationId,
    ) -> Result<DonationRequest> {
        self.execute(actor, Command::RejectDonation { donation_id })?
            .take_donation()
    }

    // ==================== Catalog writes ====================

    pub fn add_book(
        &mut self,
        actor: &Actor,
        metadata: BookMetadata,
        donor_id: Option<UserId>,
    ) -> Result<Book> {
        self.execute(actor, Command::AddBook { metadata, donor_id })?
            .take_book()
    }

    pub fn update_book(
        &mut self,
        actor: &Actor,
        book_id: BookId,
        metadata: BookMetadata,
    ) -> Result<Book> {
        self.execute(actor, Command::UpdateBook { book_id, metadata })?
            .take_book()
    }

    pub fn set_book_status(
        &mut self,
        actor: &Actor,
        book_id: BookId,
        status: BookStatus,
    ) -> Result<Book> {
        self.execute(actor, Command::SetBookStatus { book_id, status })?
            .take_book()
    }

    // ==================== Policy ====================

    /// Effective policy: stored settings over configured defaults
    pub fn policy(&self) -> Result<Policy> {
        self.repo
            .read(|session| Policy::resolve(session, &self.defaults))
    }

    /// Approved loans older than the loan period
    pub fn overdue(&self) -> Result<Vec<BorrowRecord>> {
        self.overdue_as_of(Utc::now())
    }

    pub fn overdue_as_of(&self, now: DateTime<Utc>) -> Result<Vec<BorrowRecord>> {
        let threshold = self.policy()?.overdue_threshold(now);
        if threshold == DateTime::<Utc>::MIN_UTC {
            return Ok(Vec::new());
        }
        self.repo.read(|session| session.overdue_records(threshold))
    }
}
