//! Row-level queries over one connection or transaction

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;

use super::{BookFilter, RecordStore, SettingsStore, StatusFilter};
use crate::error::Result;
use crate::model::{
    Book, BookId, BookMetadata, BookStatus, BorrowRecord, BorrowRecordId, BorrowStatus,
    ConfirmStatus, DonationId, DonationRequest, DonationStatus, DonorConfirm, DonorConfirmId,
    Review, User, UserId, WishId, WishItem, WishStatus,
};
use crate::workflow::{Change, Changeset};

const BOOK_COLUMNS: &str =
    "id, title, author, publisher, isbn, tags, source, donor_id, status, created_at";
const RECORD_COLUMNS: &str =
    "id, book_id, borrower_id, status, requested_at, approved_at, returned_at";
const CONFIRM_COLUMNS: &str =
    "id, borrow_record_id, donor_id, status, created_at, confirmed_at";
const DONATION_COLUMNS: &str =
    "id, user_id, title, author, publisher, isbn, tags, reason, status, created_at";
const USER_COLUMNS: &str = "id, student_id, name, access_token, is_admin, created_at";
const REVIEW_COLUMNS: &str = "id, book_id, user_id, rating, content, kind, created_at";
const WISH_COLUMNS: &str =
    "id, user_id, book_title, author, publisher, isbn, reason, status, created_at";

const ACTIVE_STATUSES: &str = "('pending', 'donor_pending', 'approved', 'return_pending')";

/// Book counts by status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BookStats {
    pub total: u32,
    pub available: u32,
    pub borrowed: u32,
}

/// One row of a ranking such as most borrowed books
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankEntry {
    pub name: String,
    pub count: u32,
}

/// Queries and writes against a borrowed connection
///
/// Obtained from [`Repository::transaction`](super::Repository::transaction)
/// or [`Repository::read`](super::Repository::read).
pub struct Session<'c> {
    conn: &'c Connection,
}

impl<'c> Session<'c> {
    pub(crate) fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    // ==================== Books ====================

    pub fn save_book(&self, book: &Book) -> Result<()> {
        let tags = serde_json::to_string(&book.metadata.tags)?;
        self.conn.execute(
            r#"
            INSERT INTO books
            (id, title, author, publisher, isbn, tags, source, donor_id, status, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                author = excluded.author,
                publisher = excluded.publisher,
                isbn = excluded.isbn,
                tags = excluded.tags,
                source = excluded.source,
                donor_id = excluded.donor_id,
                status = excluded.status
            "#,
            params![
                book.id.to_string(),
                book.metadata.title,
                book.metadata.author,
                book.metadata.publisher,
                book.metadata.isbn,
                tags,
                book.source.as_str(),
                book.donor_id.map(|id| id.to_string()),
                book.status.as_str(),
                timestamp(&book.created_at),
            ],
        )?;
        Ok(())
    }

    /// Books matching the filter, newest first
    pub fn books(&self, filter: &BookFilter) -> Result<Vec<Book>> {
        let sql = format!(
            "SELECT {BOOK_COLUMNS} FROM books \
             WHERE (?1 IS NULL OR status = ?1) AND (?2 IS NULL OR donor_id = ?2) \
             ORDER BY created_at DESC, rowid DESC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let books = stmt
            .query_map(
                params![
                    filter.status.map(|s| s.as_str()),
                    filter.donor.map(|id| id.to_string()),
                ],
                row_to_book,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(books.into_iter().filter(|b| filter.matches(b)).collect())
    }

    pub fn book_stats(&self) -> Result<BookStats> {
        let mut stmt = self
            .conn
            .prepare("SELECT status, COUNT(*) FROM books GROUP BY status")?;
        let mut stats = BookStats::default();
        let rows = stmt.query_map([], |row| {
            Ok((column::<BookStatus>(row, 0)?, row.get::<_, u32>(1)?))
        })?;
        for row in rows {
            let (status, count) = row?;
            stats.total += count;
            match status {
                BookStatus::Available => stats.available += count,
                BookStatus::Borrowed => stats.borrowed += count,
                _ => {}
            }
        }
        Ok(stats)
    }

    /// Books ranked by how many borrow records name them
    pub fn popular_books(&self, limit: u32) -> Result<Vec<RankEntry>> {
        self.ranking(
            "SELECT b.title, COUNT(r.id) AS n FROM books b \
             JOIN borrow_records r ON r.book_id = b.id \
             GROUP BY b.id ORDER BY n DESC, b.title ASC LIMIT ?1",
            limit,
        )
    }

    /// Non-administrators ranked by how many borrow records they filed
    pub fn top_readers(&self, limit: u32) -> Result<Vec<RankEntry>> {
        self.ranking(
            "SELECT u.name, COUNT(r.id) AS n FROM users u \
             JOIN borrow_records r ON r.borrower_id = u.id \
             WHERE u.is_admin = 0 \
             GROUP BY u.id ORDER BY n DESC, u.name ASC LIMIT ?1",
            limit,
        )
    }

    fn ranking(&self, sql: &str, limit: u32) -> Result<Vec<RankEntry>> {
        let mut stmt = self.conn.prepare(sql)?;
        let entries = stmt
            .query_map([limit], |row| {
                Ok(RankEntry {
                    name: row.get(0)?,
                    count: row.get(1)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    // ==================== Borrow records ====================

    pub fn save_borrow_record(&self, record: &BorrowRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO borrow_records
            (id, book_id, borrower_id, status, requested_at, approved_at, returned_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(id) DO UPDATE SET
                status = excluded.status,
                approved_at = excluded.approved_at,
                returned_at = excluded.returned_at
            "#,
            params![
                record.id.to_string(),
                record.book_id.to_string(),
                record.borrower_id.to_string(),
                record.status.as_str(),
                timestamp(&record.requested_at),
                record.approved_at.as_ref().map(timestamp),
                record.returned_at.as_ref().map(timestamp),
            ],
        )?;
        Ok(())
    }

    /// Records matching the filter, newest first; `owner` is the borrower
    pub fn borrow_records(&self, filter: &StatusFilter<BorrowStatus>) -> Result<Vec<BorrowRecord>> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM borrow_records \
             WHERE (?1 IS NULL OR borrower_id = ?1) AND (?2 IS NULL OR status = ?2) \
             ORDER BY requested_at DESC, rowid DESC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let records = stmt
            .query_map(
                params![
                    filter.owner.map(|id| id.to_string()),
                    filter.status.map(|s| s.as_str()),
                ],
                row_to_record,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// Approved loans whose approval time is strictly before `threshold`
    pub fn overdue_records(&self, threshold: DateTime<Utc>) -> Result<Vec<BorrowRecord>> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM borrow_records \
             WHERE status = 'approved' AND approved_at < ?1 \
             ORDER BY approved_at ASC, rowid ASC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let records = stmt
            .query_map([timestamp(&threshold)], row_to_record)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(records)
    }

    pub fn count_records(&self, statuses: &[BorrowStatus]) -> Result<u32> {
        let mut total = 0;
        for status in statuses {
            let count: u32 = self.conn.query_row(
                "SELECT COUNT(*) FROM borrow_records WHERE status = ?1",
                [status.as_str()],
                |row| row.get(0),
            )?;
            total += count;
        }
        Ok(total)
    }

    // ==================== Donor confirmations ====================

    pub fn save_donor_confirm(&self, confirm: &DonorConfirm) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO donor_confirms
            (id, borrow_record_id, donor_id, status, created_at, confirmed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(id) DO UPDATE SET
                status = excluded.status,
                confirmed_at = excluded.confirmed_at
            "#,
            params![
                confirm.id.to_string(),
                confirm.borrow_record_id.to_string(),
                confirm.donor_id.to_string(),
                confirm.status.as_str(),
                timestamp(&confirm.created_at),
                confirm.confirmed_at.as_ref().map(timestamp),
            ],
        )?;
        Ok(())
    }

    /// Confirmations matching the filter, newest first; `owner` is the donor
    pub fn donor_confirms(&self, filter: &StatusFilter<ConfirmStatus>) -> Result<Vec<DonorConfirm>> {
        let sql = format!(
            "SELECT {CONFIRM_COLUMNS} FROM donor_confirms \
             WHERE (?1 IS NULL OR donor_id = ?1) AND (?2 IS NULL OR status = ?2) \
             ORDER BY created_at DESC, rowid DESC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let confirms = stmt
            .query_map(
                params![
                    filter.owner.map(|id| id.to_string()),
                    filter.status.map(|s| s.as_str()),
                ],
                row_to_confirm,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(confirms)
    }

    // ==================== Donations ====================

    pub fn save_donation(&self, donation: &DonationRequest) -> Result<()> {
        let tags = serde_json::to_string(&donation.metadata.tags)?;
        self.conn.execute(
            r#"
            INSERT INTO donation_requests
            (id, user_id, title, author, publisher, isbn, tags, reason, status, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT(id) DO UPDATE SET
                status = excluded.status
            "#,
            params![
                donation.id.to_string(),
                donation.user_id.to_string(),
                donation.metadata.title,
                donation.metadata.author,
                donation.metadata.publisher,
                donation.metadata.isbn,
                tags,
                donation.reason,
                donation.status.as_str(),
                timestamp(&donation.created_at),
            ],
        )?;
        Ok(())
    }

    /// Donation requests matching the filter, newest first
    pub fn donations(&self, filter: &StatusFilter<DonationStatus>) -> Result<Vec<DonationRequest>> {
        let sql = format!(
            "SELECT {DONATION_COLUMNS} FROM donation_requests \
             WHERE (?1 IS NULL OR user_id = ?1) AND (?2 IS NULL OR status = ?2) \
             ORDER BY created_at DESC, rowid DESC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let donations = stmt
            .query_map(
                params![
                    filter.owner.map(|id| id.to_string()),
                    filter.status.map(|s| s.as_str()),
                ],
                row_to_donation,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(donations)
    }

    pub fn count_donations(&self, status: DonationStatus) -> Result<u32> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM donation_requests WHERE status = ?1",
            [status.as_str()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    // ==================== Users ====================

    pub fn save_user(&self, user: &User) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO users (id, student_id, name, access_token, is_admin, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                access_token = excluded.access_token,
                is_admin = excluded.is_admin
            "#,
            params![
                user.id.to_string(),
                user.student_id,
                user.name,
                user.access_token,
                user.is_admin,
                timestamp(&user.created_at),
            ],
        )?;
        Ok(())
    }

    pub fn user_by_student_id(&self, student_id: &str) -> Result<Option<User>> {
        self.user_where("student_id = ?1", student_id)
    }

    pub fn user_by_token(&self, token: &str) -> Result<Option<User>> {
        self.user_where("access_token = ?1", token)
    }

    fn user_where(&self, predicate: &str, value: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {predicate}");
        let user = self
            .conn
            .query_row(&sql, [value], row_to_user)
            .optional()?;
        Ok(user)
    }

    /// All users in registration order
    pub fn users(&self) -> Result<Vec<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at ASC, rowid ASC");
        let mut stmt = self.conn.prepare(&sql)?;
        let users = stmt
            .query_map([], row_to_user)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(users)
    }

    pub fn count_users(&self, admins: bool) -> Result<u32> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM users WHERE is_admin = ?1",
            [admins],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn delete_user(&self, id: UserId) -> Result<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM users WHERE id = ?1", [id.to_string()])?;
        Ok(deleted > 0)
    }

    // ==================== Reviews ====================

    pub fn insert_review(&self, review: &Review) -> Result<()> {
        self.conn.execute(
            &format!("INSERT INTO reviews ({REVIEW_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"),
            params![
                review.id.to_string(),
                review.book_id.to_string(),
                review.user_id.to_string(),
                review.rating,
                review.content,
                review.kind.as_str(),
                timestamp(&review.created_at),
            ],
        )?;
        Ok(())
    }

    pub fn review_by(&self, book: BookId, user: UserId) -> Result<Option<Review>> {
        let sql = format!("SELECT {REVIEW_COLUMNS} FROM reviews WHERE book_id = ?1 AND user_id = ?2");
        let review = self
            .conn
            .query_row(&sql, [book.to_string(), user.to_string()], row_to_review)
            .optional()?;
        Ok(review)
    }

    /// Reviews of a book, newest first
    pub fn reviews_for_book(&self, book: BookId) -> Result<Vec<Review>> {
        let sql = format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE book_id = ?1 \
             ORDER BY created_at DESC, rowid DESC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let reviews = stmt
            .query_map([book.to_string()], row_to_review)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(reviews)
    }

    // ==================== Wishlist ====================

    pub fn save_wish(&self, wish: &WishItem) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO wishlists
            (id, user_id, book_title, author, publisher, isbn, reason, status, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(id) DO UPDATE SET
                status = excluded.status
            "#,
            params![
                wish.id.to_string(),
                wish.user_id.to_string(),
                wish.book_title,
                wish.author,
                wish.publisher,
                wish.isbn,
                wish.reason,
                wish.status.as_str(),
                timestamp(&wish.created_at),
            ],
        )?;
        Ok(())
    }

    pub fn wish(&self, id: WishId) -> Result<Option<WishItem>> {
        let sql = format!("SELECT {WISH_COLUMNS} FROM wishlists WHERE id = ?1");
        let wish = self
            .conn
            .query_row(&sql, [id.to_string()], row_to_wish)
            .optional()?;
        Ok(wish)
    }

    /// Wishlist entries matching the filter, newest first
    pub fn wishes(&self, filter: &StatusFilter<WishStatus>) -> Result<Vec<WishItem>> {
        let sql = format!(
            "SELECT {WISH_COLUMNS} FROM wishlists \
             WHERE (?1 IS NULL OR user_id = ?1) AND (?2 IS NULL OR status = ?2) \
             ORDER BY created_at DESC, rowid DESC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let wishes = stmt
            .query_map(
                params![
                    filter.owner.map(|id| id.to_string()),
                    filter.status.map(|s| s.as_str()),
                ],
                row_to_wish,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(wishes)
    }

    pub fn delete_wish(&self, id: WishId) -> Result<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM wishlists WHERE id = ?1", [id.to_string()])?;
        Ok(deleted > 0)
    }

    // ==================== Settings ====================

    pub fn put_setting(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO settings (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
            [key, value],
        )?;
        Ok(())
    }

    // ==================== Helpers ====================

    fn fetch<T, F>(&self, table: &str, columns: &str, id: String, f: F) -> Result<Option<T>>
    where
        F: FnOnce(&Row<'_>) -> rusqlite::Result<T>,
    {
        let sql = format!("SELECT {columns} FROM {table} WHERE id = ?1");
        let value = self.conn.query_row(&sql, [id], f).optional()?;
        Ok(value)
    }
}

impl RecordStore for Session<'_> {
    fn book(&self, id: BookId) -> Result<Option<Book>> {
        self.fetch("books", BOOK_COLUMNS, id.to_string(), row_to_book)
    }

    fn borrow_record(&self, id: BorrowRecordId) -> Result<Option<BorrowRecord>> {
        self.fetch("borrow_records", RECORD_COLUMNS, id.to_string(), row_to_record)
    }

    fn active_record_for_book(&self, book: BookId) -> Result<Option<BorrowRecord>> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM borrow_records \
             WHERE book_id = ?1 AND status IN {ACTIVE_STATUSES}"
        );
        let record = self
            .conn
            .query_row(&sql, [book.to_string()], row_to_record)
            .optional()?;
        Ok(record)
    }

    fn count_active_records(&self, borrower: UserId) -> Result<u32> {
        let sql = format!(
            "SELECT COUNT(*) FROM borrow_records WHERE borrower_id = ?1 AND status IN {ACTIVE_STATUSES}"
        );
        let count = self
            .conn
            .query_row(&sql, [borrower.to_string()], |row| row.get(0))?;
        Ok(count)
    }

    fn donor_confirm(&self, id: DonorConfirmId) -> Result<Option<DonorConfirm>> {
        self.fetch("donor_confirms", CONFIRM_COLUMNS, id.to_string(), row_to_confirm)
    }

    fn confirm_for_record(&self, record: BorrowRecordId) -> Result<Option<DonorConfirm>> {
        let sql = format!("SELECT {CONFIRM_COLUMNS} FROM donor_confirms WHERE borrow_record_id = ?1");
        let confirm = self
            .conn
            .query_row(&sql, [record.to_string()], row_to_confirm)
            .optional()?;
        Ok(confirm)
    }

    fn donation(&self, id: DonationId) -> Result<Option<DonationRequest>> {
        self.fetch("donation_requests", DONATION_COLUMNS, id.to_string(), row_to_donation)
    }

    fn user(&self, id: UserId) -> Result<Option<User>> {
        self.fetch("users", USER_COLUMNS, id.to_string(), row_to_user)
    }

    fn apply(&self, changeset: &Changeset) -> Result<()> {
        for change in changeset.changes() {
            match change {
                Change::Book(book) => self.save_book(book)?,
                Change::BorrowRecord(record) => self.save_borrow_record(record)?,
                Change::DonorConfirm(confirm) => self.save_donor_confirm(confirm)?,
                Change::Donation(donation) => self.save_donation(donation)?,
            }
        }
        Ok(())
    }
}

impl SettingsStore for Session<'_> {
    fn setting(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM settings WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn settings(&self) -> Result<BTreeMap<String, String>> {
        let mut stmt = self.conn.prepare("SELECT key, value FROM settings")?;
        let settings = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<std::result::Result<BTreeMap<_, _>, _>>()?;
        Ok(settings)
    }
}

// ==================== Row decoding ====================

fn timestamp(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse::<T>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn opt_column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| {
        s.parse::<T>()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    })
    .transpose()
}

fn tags_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Vec<String>> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn row_to_book(row: &Row<'_>) -> rusqlite::Result<Book> {
    Ok(Book {
        id: column(row, 0)?,
        metadata: BookMetadata {
            title: row.get(1)?,
            author: row.get(2)?,
            publisher: row.get(3)?,
            isbn: row.get(4)?,
            tags: tags_column(row, 5)?,
        },
        source: column(row, 6)?,
        donor_id: opt_column(row, 7)?,
        status: column(row, 8)?,
        created_at: column(row, 9)?,
    })
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<BorrowRecord> {
    Ok(BorrowRecord {
        id: column(row, 0)?,
        book_id: column(row, 1)?,
        borrower_id: column(row, 2)?,
        status: column(row, 3)?,
        requested_at: column(row, 4)?,
        approved_at: opt_column(row, 5)?,
        returned_at: opt_column(row, 6)?,
    })
}

fn row_to_confirm(row: &Row<'_>) -> rusqlite::Result<DonorConfirm> {
    Ok(DonorConfirm {
        id: column(row, 0)?,
        borrow_record_id: column(row, 1)?,
        donor_id: column(row, 2)?,
        status: column(row, 3)?,
        created_at: column(row, 4)?,
        confirmed_at: opt_column(row, 5)?,
    })
}

fn row_to_donation(row: &Row<'_>) -> rusqlite::Result<DonationRequest> {
    Ok(DonationRequest {
        id: column(row, 0)?,
        user_id: column(row, 1)?,
        metadata: BookMetadata {
            title: row.get(2)?,
            author: row.get(3)?,
            publisher: row.get(4)?,
            isbn: row.get(5)?,
            tags: tags_column(row, 6)?,
        },
        reason: row.get(7)?,
        status: column(row, 8)?,
        created_at: column(row, 9)?,
    })
}

fn row_to_user(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: column(row, 0)?,
        student_id: row.get(1)?,
        name: row.get(2)?,
        access_token: row.get(3)?,
        is_admin: row.get(4)?,
        created_at: column(row, 5)?,
    })
}

fn row_to_review(row: &Row<'_>) -> rusqlite::Result<Review> {
    Ok(Review {
        id: column(row, 0)?,
        book_id: column(row, 1)?,
        user_id: column(row, 2)?,
        rating: row.get(3)?,
        content: row.get(4)?,
        kind: column(row, 5)?,
        created_at: column(row, 6)?,
    })
}

fn row_to_wish(row: &Row<'_>) -> rusqlite::Result<WishItem> {
    Ok(WishItem {
        id: column(row, 0)?,
        user_id: column(row, 1)?,
        book_title: row.get(2)?,
        author: row.get(3)?,
        publisher: row.get(4)?,
        isbn: row.get(5)?,
        reason: row.get(6)?,
        status: column(row, 7)?,
        created_at: column(row, 8)?,
    })
}
