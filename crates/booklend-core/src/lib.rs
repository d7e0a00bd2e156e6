//! Booklend Core - book lending workflow for a small class library
//!
//! This crate provides the core functionality for the booklend system:
//!
//! - **Model**: Books, borrow records, donor confirmations, donation requests,
//!   users, reviews and wishlist entries, each status a closed enum with an
//!   explicit transition table
//! - **Workflow**: Commands planned into changesets of dependent writes
//!   (borrow → approve → return, donor consent, donation → new book)
//! - **Engine**: [`Library`], which applies each changeset atomically
//! - **Store**: SQLite record and settings storage behind narrow traits
//! - **Policy**: Borrow limit and loan period, stored settings over
//!   configured defaults
//! - **Config**: Policy defaults, database location and server settings
//!
//! # Borrow lifecycle
//!
//! ```text
//! Book:   available → pending_borrow → borrowed → pending_return → available
//! Record:           donor_pending → pending → approved → return_pending → completed
//!                         ↓            ↓
//!                      rejected     rejected
//! ```
//!
//! A book is `available` exactly when no borrow record on it is in an active
//! status (pending, donor_pending, approved, return_pending).

pub mod activity;
pub mod admin;
pub mod catalog;
pub mod community;
pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod policy;
pub mod store;
pub mod workflow;

pub use activity::{DonatedBook, DonationOverview, PendingConfirm};
pub use admin::{Dashboard, DashboardStats, NewUser, Reminder};
pub use config::{ConfigError, DatabaseConfig, LendingConfig, PolicyConfig, ServerConfig};
pub use engine::Library;
pub use error::{ErrorKind, LendingError, PersistenceError, Result};
pub use model::{
    Actor, Book, BookId, BookMetadata, BookSource, BookStatus, BorrowRecord, BorrowRecordId,
    BorrowStatus, ConfirmStatus, DonationId, DonationRequest, DonationStatus, DonorConfirm,
    DonorConfirmId, NewReview, NewWish, ParseStatusError, Review, ReviewId, ReviewKind, User,
    UserId, WishId, WishItem, WishStatus,
};
pub use policy::Policy;
pub use store::{BookFilter, RecordStore, Repository, SettingsStore, StatusFilter};
pub use workflow::{Change, Changeset, Command};

/// Returns the version of booklend-core
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
