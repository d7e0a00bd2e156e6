//! SQLite schema for the library database

/// Schema version for migrations
pub const SCHEMA_VERSION: u32 = 1;

/// SQLite schema definition
pub struct Schema;

impl Schema {
    /// Get the complete schema SQL
    pub fn create_tables() -> &'static str {
        r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    student_id TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    access_token TEXT NOT NULL UNIQUE,
    is_admin INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS books (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    author TEXT NOT NULL,
    publisher TEXT NOT NULL,
    isbn TEXT,
    tags TEXT NOT NULL DEFAULT '[]',
    source TEXT NOT NULL,
    donor_id TEXT,
    status TEXT NOT NULL,
    created_at TEXT NOT NULL,
    FOREIGN KEY (donor_id) REFERENCES users(id)
);

CREATE INDEX IF NOT EXISTS idx_books_status ON books(status);
CREATE INDEX IF NOT EXISTS idx_books_donor ON books(donor_id);
CREATE INDEX IF NOT EXISTS idx_books_created ON books(created_at);

CREATE TABLE IF NOT EXISTS borrow_records (
    id TEXT PRIMARY KEY,
    book_id TEXT NOT NULL,
    borrower_id TEXT NOT NULL,
    status TEXT NOT NULL,
    requested_at TEXT NOT NULL,
    approved_at TEXT,
    returned_at TEXT,
    FOREIGN KEY (book_id) REFERENCES books(id),
    FOREIGN KEY (borrower_id) REFERENCES users(id)
);

CREATE INDEX IF NOT EXISTS idx_borrows_book ON borrow_records(book_id);
CREATE INDEX IF NOT EXISTS idx_borrows_borrower ON borrow_records(borrower_id);
CREATE INDEX IF NOT EXISTS idx_borrows_status ON borrow_records(status);

-- At most one active record per book
CREATE UNIQUE INDEX IF NOT EXISTS idx_borrows_active_book ON borrow_records(book_id)
    WHERE status IN ('pending', 'donor_pending', 'approved', 'return_pending');

CREATE TABLE IF NOT EXISTS donor_confirms (
    id TEXT PRIMARY KEY,
    borrow_record_id TEXT NOT NULL UNIQUE,
    donor_id TEXT NOT NULL,
    status TEXT NOT NULL,
    created_at TEXT NOT NULL,
    confirmed_at TEXT,
    FOREIGN KEY (borrow_record_id) REFERENCES borrow_records(id),
    FOREIGN KEY (donor_id) REFERENCES users(id)
);

CREATE INDEX IF NOT EXISTS idx_confirms_donor ON donor_confirms(donor_id, status);

CREATE TABLE IF NOT EXISTS donation_requests (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    title TEXT NOT NULL,
    author TEXT NOT NULL,
    publisher TEXT NOT NULL,
    isbn TEXT,
    tags TEXT NOT NULL DEFAULT '[]',
    reason TEXT NOT NULL,
    status TEXT NOT NULL,
    created_at TEXT NOT NULL,
    FOREIGN KEY (user_id) REFERENCES users(id)
);

CREATE INDEX IF NOT EXISTS idx_donations_user ON donation_requests(user_id);
CREATE INDEX IF NOT EXISTS idx_donations_status ON donation_requests(status);

CREATE TABLE IF NOT EXISTS reviews (
    id TEXT PRIMARY KEY,
    book_id TEXT NOT NULL,
    user_id TEXT NOT NULL,
    rating INTEGER NOT NULL,
    content TEXT NOT NULL,
    kind TEXT NOT NULL,
    created_at TEXT NOT NULL,
    UNIQUE (book_id, user_id),
    FOREIGN KEY (book_id) REFERENCES books(id),
    FOREIGN KEY (user_id) REFERENCES users(id)
);

CREATE TABLE IF NOT EXISTS wishlists (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    book_title TEXT NOT NULL,
    author TEXT NOT NULL,
    publisher TEXT NOT NULL,
    isbn TEXT NOT NULL,
    reason TEXT NOT NULL,
    status TEXT NOT NULL,
    created_at TEXT NOT NULL,
    FOREIGN KEY (user_id) REFERENCES users(id)
);

CREATE INDEX IF NOT EXISTS idx_wishlists_user ON wishlists(user_id);
CREATE INDEX IF NOT EXISTS idx_wishlists_status ON wishlists(status);

-- Policy settings
CREATE TABLE IF NOT EXISTS settings (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#
    }

    /// Get migration SQL for a specific version
    pub fn migration(from_version: u32, to_version: u32) -> Option<&'static str> {
        match (from_version, to_version) {
            // (1, 2) => Some("ALTER TABLE ..."),
            _ => None,
        }
    }
}
