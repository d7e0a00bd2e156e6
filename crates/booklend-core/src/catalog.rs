//! Catalog queries

use crate::engine::Library;
use crate::error::{LendingError, Result};
use crate::model::{Book, BookId};
use crate::store::{BookFilter, RecordStore};

impl Library {
    /// Books matching the filter, newest first
    pub fn books(&self, filter: &BookFilter) -> Result<Vec<Book>> {
        self.repo().read(|session| session.books(filter))
    }

    pub fn book(&self, id: BookId) -> Result<Book> {
        self.repo()
            .read(|session| session.book(id))?
            .ok_or_else(|| LendingError::not_found("Book", id))
    }
}
