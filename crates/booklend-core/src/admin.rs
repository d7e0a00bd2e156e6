//! Users, sign-in, dashboard statistics, settings and overdue reminders

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::engine::Library;
use crate::error::{LendingError, Result};
use crate::model::{Actor, BorrowRecord, BorrowRecordId, BorrowStatus, DonationStatus, User, UserId};
use crate::policy::{self, effective_settings};
use crate::store::{RankEntry, RecordStore};

const RANKING_LIMIT: u32 = 10;

/// Fields an administrator supplies to register a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub student_id: String,
    pub name: String,
    #[serde(default)]
    pub is_admin: bool,
}

/// Headline counts for the admin dashboard
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total_books: u32,
    pub available_books: u32,
    pub borrowed_books: u32,
    /// Non-administrator accounts
    pub total_users: u32,
    /// Sum of the three pending counts below
    pub pending_reviews: u32,
    pub pending_borrows: u32,
    pub pending_returns: u32,
    pub pending_donations: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub stats: DashboardStats,
    pub popular_books: Vec<RankEntry>,
    pub top_readers: Vec<RankEntry>,
    pub overdue: Vec<BorrowRecord>,
}

/// An overdue loan whose borrower was reminded
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reminder {
    pub record_id: BorrowRecordId,
    pub borrower_name: Option<String>,
    pub book_title: Option<String>,
}

impl Library {
    // ==================== Users ====================

    pub fn users(&self, actor: &Actor) -> Result<Vec<User>> {
        actor.require_admin("list users")?;
        self.repo().read(|session| session.users())
    }

    /// Register a user; the returned user carries the issued access token
    pub fn create_user(&mut self, actor: &Actor, input: NewUser) -> Result<User> {
        actor.require_admin("create users")?;
        self.register(input, Utc::now())
    }

    fn register(&mut self, input: NewUser, now: DateTime<Utc>) -> Result<User> {
        let user = User::new(input.student_id, input.name, input.is_admin, now)?;
        self.repo_mut().transaction(|session| {
            if session.user_by_student_id(&user.student_id)?.is_some() {
                return Err(LendingError::Validation(format!(
                    "student_id {} is already registered",
                    user.student_id
                )));
            }
            session.save_user(&user)
        })?;
        info!(user = %user.id, student_id = %user.student_id, is_admin = user.is_admin, "User registered");
        Ok(user)
    }

    /// Delete a user who holds no active borrow record
    pub fn delete_user(&mut self, actor: &Actor, id: UserId) -> Result<()> {
        actor.require_admin("delete users")?;
        self.repo_mut().transaction(|session| {
            if session.user(id)?.is_none() {
                return Err(LendingError::not_found("User", id));
            }
            if session.count_active_records(id)? > 0 {
                return Err(LendingError::InvalidState(format!(
                    "user {} still has books out or requested",
                    id
                )));
            }
            session.delete_user(id)?;
            Ok(())
        })?;
        info!(user = %id, "User deleted");
        Ok(())
    }

    /// Exchange a student id and access token for the matching user
    pub fn login(&self, student_id: &str, access_token: &str) -> Result<User> {
        let user = self
            .repo()
            .read(|session| session.user_by_student_id(student_id.trim()))?;
        match user {
            Some(user) if user.access_token == access_token => Ok(user),
            _ => Err(LendingError::Forbidden(
                "invalid student id or access token".to_string(),
            )),
        }
    }

    /// Resolve a bearer token to its user
    pub fn authenticate(&self, access_token: &str) -> Result<Option<User>> {
        self.repo()
            .read(|session| session.user_by_token(access_token))
    }

    /// Create an administrator when no user exists yet
    ///
    /// Returns the new administrator, or `None` when the user table was
    /// already populated.
    pub fn ensure_admin(&mut self, student_id: &str, name: &str) -> Result<Option<User>> {
        let empty = self
            .repo()
            .read(|session| Ok(session.users()?.is_empty()))?;
        if !empty {
            return Ok(None);
        }
        let admin = self.register(
            NewUser {
                student_id: student_id.to_string(),
                name: name.to_string(),
                is_admin: true,
            },
            Utc::now(),
        )?;
        Ok(Some(admin))
    }

    // ==================== Dashboard ====================

    pub fn dashboard(&self, actor: &Actor) -> Result<Dashboard> {
        self.dashboard_as_of(actor, Utc::now())
    }

    pub fn dashboard_as_of(&self, actor: &Actor, now: DateTime<Utc>) -> Result<Dashboard> {
        actor.require_admin("view the dashboard")?;
        let overdue = self.overdue_as_of(now)?;
        self.repo().read(|session| {
            let books = session.book_stats()?;
            let pending_borrows =
                session.count_records(&[BorrowStatus::Pending, BorrowStatus::DonorPending])?;
            let pending_returns = session.count_records(&[BorrowStatus::ReturnPending])?;
            let pending_donations = session.count_donations(DonationStatus::Pending)?;
            Ok(Dashboard {
                stats: DashboardStats {
                    total_books: books.total,
                    available_books: books.available,
                    borrowed_books: books.borrowed,
                    total_users: session.count_users(false)?,
                    pending_reviews: pending_borrows + pending_returns + pending_donations,
                    pending_borrows,
                    pending_returns,
                    pending_donations,
                },
                popular_books: session.popular_books(RANKING_LIMIT)?,
                top_readers: session.top_readers(RANKING_LIMIT)?,
                overdue,
            })
        })
    }

    // ==================== Settings ====================

    /// Stored settings with defaults filled in for unset keys
    pub fn settings(&self, actor: &Actor) -> Result<BTreeMap<String, String>> {
        actor.require_admin("read settings")?;
        self.repo()
            .read(|session| effective_settings(session, self.defaults()))
    }

    /// Validate and store every pair; nothing is written if any pair is invalid
    pub fn update_settings(
        &mut self,
        actor: &Actor,
        updates: BTreeMap<String, String>,
    ) -> Result<BTreeMap<String, String>> {
        actor.require_admin("update settings")?;
        let validated = updates
            .iter()
            .map(|(key, value)| -> Result<(String, String)> {
                Ok((key.clone(), policy::validate_setting(key, value)?))
            })
            .collect::<Result<Vec<_>>>()?;
        self.repo_mut().transaction(|session| {
            for (key, value) in &validated {
                session.put_setting(key, value)?;
            }
            Ok(())
        })?;
        for (key, value) in &validated {
            info!(key = %key, value = %value, "Setting updated");
        }
        self.settings(actor)
    }

    // ==================== Reminders ====================

    /// Remind the borrowers of the given loans; only approved loans qualify
    pub fn send_overdue_reminders(
        &self,
        actor: &Actor,
        record_ids: &[BorrowRecordId],
    ) -> Result<Vec<Reminder>> {
        actor.require_admin("send reminders")?;
        if record_ids.is_empty() {
            return Err(LendingError::Validation(
                "select at least one record to remind".to_string(),
            ));
        }
        let reminders = self.repo().read(|session| {
            let mut reminders = Vec::new();
            for id in record_ids {
                let Some(record) = session.borrow_record(*id)? else {
                    continue;
                };
                if record.status != BorrowStatus::Approved {
                    continue;
                }
                reminders.push(Reminder {
                    record_id: record.id,
                    borrower_name: session.user(record.borrower_id)?.map(|u| u.name),
                    book_title: session.book(record.book_id)?.map(|b| b.metadata.title),
                });
            }
            Ok(reminders)
        })?;
        for reminder in &reminders {
            info!(record = %reminder.record_id, borrower = ?reminder.borrower_name, "Overdue reminder sent");
        }
        Ok(reminders)
    }
}
