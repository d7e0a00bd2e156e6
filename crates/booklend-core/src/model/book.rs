//! Books and their availability state machine
//!
//! State transitions:
//! ```text
//! Available → PendingBorrow → Borrowed → PendingReturn → Available
//!     ↑ ↓           ↓
//! Unavailable    Available (request rejected)
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{BookId, ParseStatusError, UserId};
use crate::error::{LendingError, Result};

const MAX_TITLE_LEN: usize = 100;
const MAX_AUTHOR_LEN: usize = 50;
const MAX_PUBLISHER_LEN: usize = 100;
const MAX_ISBN_LEN: usize = 20;
const MAX_TAGS_LEN: usize = 200;

/// Availability of a book
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookStatus {
    /// On the shelf, free to request
    #[default]
    Available,
    /// Held by a filed borrow request
    PendingBorrow,
    /// Out on an approved loan
    Borrowed,
    /// Borrower has asked to hand it back
    PendingReturn,
    /// Withdrawn by an administrator
    Unavailable,
}

impl BookStatus {
    /// Check if a status transition is valid
    pub fn can_transition_to(&self, target: &BookStatus) -> bool {
        matches!(
            (self, target),
            (BookStatus::Available, BookStatus::PendingBorrow)
                | (BookStatus::Available, BookStatus::Unavailable)
                | (BookStatus::PendingBorrow, BookStatus::Borrowed)
                | (BookStatus::PendingBorrow, BookStatus::Available)
                | (BookStatus::Borrowed, BookStatus::PendingReturn)
                | (BookStatus::PendingReturn, BookStatus::Available)
                | (BookStatus::Unavailable, BookStatus::Available)
        )
    }

    /// Get valid next statuses from the current one
    pub fn valid_transitions(&self) -> Vec<BookStatus> {
        match self {
            BookStatus::Available => vec![BookStatus::PendingBorrow, BookStatus::Unavailable],
            BookStatus::PendingBorrow => vec![BookStatus::Borrowed, BookStatus::Available],
            BookStatus::Borrowed => vec![BookStatus::PendingReturn],
            BookStatus::PendingReturn => vec![BookStatus::Available],
            BookStatus::Unavailable => vec![BookStatus::Available],
        }
    }

    /// Statuses an administrator may set directly
    pub fn is_manual(&self) -> bool {
        matches!(self, BookStatus::Available | BookStatus::Unavailable)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BookStatus::Available => "available",
            BookStatus::PendingBorrow => "pending_borrow",
            BookStatus::Borrowed => "borrowed",
            BookStatus::PendingReturn => "pending_return",
            BookStatus::Unavailable => "unavailable",
        }
    }
}

impl std::fmt::Display for BookStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BookStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "available" => Ok(BookStatus::Available),
            "pending_borrow" => Ok(BookStatus::PendingBorrow),
            "borrowed" => Ok(BookStatus::Borrowed),
            "pending_return" => Ok(BookStatus::PendingReturn),
            "unavailable" => Ok(BookStatus::Unavailable),
            other => Err(ParseStatusError::new("book", other)),
        }
    }
}

/// Where a book came from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookSource {
    /// Bought for the class library
    #[default]
    Class,
    /// Contributed by a user
    Donated,
}

impl BookSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookSource::Class => "class",
            BookSource::Donated => "donated",
        }
    }
}

impl std::fmt::Display for BookSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BookSource {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "class" => Ok(BookSource::Class),
            "donated" => Ok(BookSource::Donated),
            other => Err(ParseStatusError::new("book source", other)),
        }
    }
}

/// Descriptive fields shared by books and donation requests
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookMetadata {
    pub title: String,
    pub author: String,
    pub publisher: String,
    pub isbn: Option<String>,
    /// Ordered set of tags
    pub tags: Vec<String>,
}

impl BookMetadata {
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        publisher: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            publisher: publisher.into(),
            isbn: None,
            tags: Vec::new(),
        }
    }

    pub fn with_isbn(mut self, isbn: impl Into<String>) -> Self {
        self.isbn = Some(isbn.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Trim fields, drop an empty ISBN and normalize the tag set
    pub fn normalized(self) -> Self {
        let isbn = self
            .isbn
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        Self {
            title: self.title.trim().to_string(),
            author: self.author.trim().to_string(),
            publisher: self.publisher.trim().to_string(),
            isbn,
            tags: normalize_tags(self.tags),
        }
    }

    /// Check required fields and column limits
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(LendingError::Validation("title is required".to_string()));
        }
        check_len("title", &self.title, MAX_TITLE_LEN)?;
        check_len("author", &self.author, MAX_AUTHOR_LEN)?;
        check_len("publisher", &self.publisher, MAX_PUBLISHER_LEN)?;
        if let Some(ref isbn) = self.isbn {
            check_len("isbn", isbn, MAX_ISBN_LEN)?;
        }
        check_len("tags", &self.tags.join(","), MAX_TAGS_LEN)?;
        Ok(())
    }

    /// Case-insensitive substring match against title, author and tags
    pub fn matches_keyword(&self, keyword: &str) -> bool {
        let needle = keyword.to_lowercase();
        self.title.to_lowercase().contains(&needle)
            || self.author.to_lowercase().contains(&needle)
            || self.tags.iter().any(|t| t.to_lowercase().contains(&needle))
    }
}

fn check_len(field: &str, value: &str, max: usize) -> Result<()> {
    if value.chars().count() > max {
        return Err(LendingError::Validation(format!(
            "{} must be at most {} characters",
            field, max
        )));
    }
    Ok(())
}

/// Trim tags, drop empty ones and remove duplicates keeping the first occurrence
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.as_ref().trim();
        if !tag.is_empty() && !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}

/// A book in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    #[serde(flatten)]
    pub metadata: BookMetadata,
    pub source: BookSource,
    pub donor_id: Option<UserId>,
    pub status: BookStatus,
    pub created_at: DateTime<Utc>,
}

impl Book {
    /// Create an available class book
    pub fn new(metadata: BookMetadata) -> Self {
        Self {
            id: BookId::new(),
            metadata: metadata.normalized(),
            source: BookSource::Class,
            donor_id: None,
            status: BookStatus::Available,
            created_at: Utc::now(),
        }
    }

    /// Create an available book contributed by `donor`
    pub fn donated(metadata: BookMetadata, donor: UserId) -> Self {
        Self {
            source: BookSource::Donated,
            donor_id: Some(donor),
            ..Self::new(metadata)
        }
    }

    /// Donor whose consent gates loans of this book, if any
    pub fn consenting_donor(&self) -> Option<UserId> {
        match self.source {
            BookSource::Donated => self.donor_id,
            BookSource::Class => None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.status == BookStatus::Available
    }

    /// Attempt to move to a new status
    pub fn transition_to(&mut self, next: BookStatus) -> Result<()> {
        if !self.status.can_transition_to(&next) {
            return Err(LendingError::InvalidTransition {
                entity: "Book",
                id: self.id.to_string(),
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        self.status = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Book {
        Book::new(BookMetadata::new("Dune", "Frank Herbert", "Chilton"))
    }

    #[test]
    fn test_available_transitions() {
        let status = BookStatus::Available;
        assert!(status.can_transition_to(&BookStatus::PendingBorrow));
        assert!(status.can_transition_to(&BookStatus::Unavailable));
        assert!(!status.can_transition_to(&BookStatus::Borrowed));
        assert!(!status.can_transition_to(&BookStatus::PendingReturn));
        assert!(!status.can_transition_to(&BookStatus::Available));
    }

    #[test]
    fn test_valid_transitions_agree_with_table() {
        let all = [
            BookStatus::Available,
            BookStatus::PendingBorrow,
            BookStatus::Borrowed,
            BookStatus::PendingReturn,
            BookStatus::Unavailable,
        ];
        for from in all {
            for to in all {
                assert_eq!(
                    from.can_transition_to(&to),
                    from.valid_transitions().contains(&to),
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [BookStatus::PendingBorrow, BookStatus::PendingReturn] {
            assert_eq!(status.as_str().parse::<BookStatus>().unwrap(), status);
        }
        assert!("lost".parse::<BookStatus>().is_err());
    }

    #[test]
    fn test_loan_cycle() {
        let mut book = sample();
        book.transition_to(BookStatus::PendingBorrow).unwrap();
        book.transition_to(BookStatus::Borrowed).unwrap();
        book.transition_to(BookStatus::PendingReturn).unwrap();
        book.transition_to(BookStatus::Available).unwrap();
        assert!(book.is_available());
    }

    #[test]
    fn test_invalid_transition() {
        let mut book = sample();
        let err = book.transition_to(BookStatus::Borrowed).unwrap_err();
        assert!(matches!(err, LendingError::InvalidTransition { .. }));
        assert_eq!(book.status, BookStatus::Available);
    }

    #[test]
    fn test_normalize_tags() {
        let tags = normalize_tags([" scifi", "classic", "", "scifi ", "desert"]);
        assert_eq!(tags, vec!["scifi", "classic", "desert"]);
    }

    #[test]
    fn test_metadata_validation() {
        assert!(BookMetadata::new("  ", "a", "p").validate().is_err());
        assert!(BookMetadata::new("t".repeat(101), "a", "p").validate().is_err());
        assert!(BookMetadata::new("Title", "", "").validate().is_ok());
    }

    #[test]
    fn test_normalized_drops_blank_isbn() {
        let meta = BookMetadata::new(" Dune ", "Herbert", "Chilton")
            .with_isbn("   ")
            .normalized();
        assert_eq!(meta.title, "Dune");
        assert!(meta.isbn.is_none());
    }

    #[test]
    fn test_keyword_match() {
        let meta = BookMetadata::new("Dune", "Frank Herbert", "Chilton").with_tags(["SciFi"]);
        assert!(meta.matches_keyword("dune"));
        assert!(meta.matches_keyword("herb"));
        assert!(meta.matches_keyword("scifi"));
        assert!(!meta.matches_keyword("chilton"));
    }

    #[test]
    fn test_consenting_donor_only_for_donated() {
        let donor = UserId::new();
        let donated = Book::donated(BookMetadata::new("A", "B", "C"), donor);
        assert_eq!(donated.consenting_donor(), Some(donor));

        let mut class = sample();
        class.donor_id = Some(donor);
        assert_eq!(class.consenting_donor(), None);
    }

    #[test]
    fn test_serializes_flat() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(value["title"], "Dune");
        assert_eq!(value["status"], "available");
        assert_eq!(value["source"], "class");
    }
}
