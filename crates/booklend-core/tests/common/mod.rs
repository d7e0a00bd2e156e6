//! Shared builders for integration tests

use booklend_core::{
    Actor, Book, BookFilter, BookId, BookMetadata, BookStatus, BorrowRecord, Library, NewUser,
    User,
};

/// A library with one administrator and a handful of registered readers
pub struct TestLibrary {
    pub lib: Library,
    pub admin: Actor,
    pub readers: Vec<User>,
}

impl TestLibrary {
    pub fn new() -> Self {
        Self::with_readers(3)
    }

    pub fn with_readers(count: usize) -> Self {
        let mut lib = Library::in_memory().expect("in-memory library");
        let admin = lib
            .ensure_admin("admin", "Admin")
            .expect("bootstrap admin")
            .expect("empty user table")
            .actor();
        let readers = (0..count)
            .map(|i| {
                lib.create_user(
                    &admin,
                    NewUser {
                        student_id: format!("s{}", i),
                        name: format!("Reader {}", i),
                        is_admin: false,
                    },
                )
                .expect("create reader")
            })
            .collect();
        Self {
            lib,
            admin,
            readers,
        }
    }

    pub fn reader(&self, i: usize) -> Actor {
        self.readers[i].actor()
    }

    /// Add a class book
    pub fn class_book(&mut self, title: &str) -> Book {
        self.lib
            .add_book(&self.admin, BookMetadata::new(title, "Author", "Press"), None)
            .expect("add class book")
    }

    /// Add a book donated by reader `donor`
    pub fn donated_book(&mut self, title: &str, donor: usize) -> Book {
        let donor_id = self.readers[donor].id;
        self.lib
            .add_book(
                &self.admin,
                BookMetadata::new(title, "Author", "Press"),
                Some(donor_id),
            )
            .expect("add donated book")
    }

    pub fn status_of(&self, book: BookId) -> BookStatus {
        self.lib.book(book).expect("book exists").status
    }

    pub fn record(&self, id: booklend_core::BorrowRecordId) -> BorrowRecord {
        self.lib
            .all_records(&self.admin, None)
            .expect("list records")
            .into_iter()
            .find(|r| r.id == id)
            .expect("record exists")
    }

    /// Check that every book is available exactly when no active record holds it
    #[allow(dead_code)]
    pub fn assert_availability_invariant(&self) {
        let records = self.lib.all_records(&self.admin, None).expect("records");
        for book in self.lib.books(&BookFilter::all()).expect("books") {
            let held: Vec<_> = records
                .iter()
                .filter(|r| r.book_id == book.id && r.status.is_active())
                .collect();
            assert!(held.len() <= 1, "book {} held by {} records", book.id, held.len());
            if book.status == BookStatus::Unavailable {
                assert!(held.is_empty());
            } else {
                assert_eq!(
                    book.status == BookStatus::Available,
                    held.is_empty(),
                    "book {} is {} with {} active records",
                    book.id,
                    book.status,
                    held.len()
                );
            }
        }
    }
}
