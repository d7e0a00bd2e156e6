//! Entity identifiers

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{LendingError, Result};

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new random ID
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Create an ID from a UUID
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Parse an ID supplied by a caller
            pub fn parse(s: &str) -> Result<Self> {
                Uuid::parse_str(s.trim()).map(Self).map_err(|e| {
                    LendingError::Validation(format!("invalid {} id {:?}: {}", $label, s, e))
                })
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }
    };
}

entity_id!(
    /// Unique identifier for a book
    BookId,
    "book"
);
entity_id!(
    /// Unique identifier for a borrow record
    BorrowRecordId,
    "borrow record"
);
entity_id!(
    /// Unique identifier for a donor confirmation
    DonorConfirmId,
    "donor confirmation"
);
entity_id!(
    /// Unique identifier for a donation request
    DonationId,
    "donation"
);
entity_id!(
    /// Unique identifier for a user
    UserId,
    "user"
);
entity_id!(
    /// Unique identifier for a book review
    ReviewId,
    "review"
);
entity_id!(
    /// Unique identifier for a wishlist entry
    WishId,
    "wish"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_display() {
        let id = BookId::new();
        assert_eq!(BookId::parse(&id.to_string()).unwrap(), id);
        assert_eq!(id.to_string().parse::<BookId>().unwrap(), id);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = UserId::parse("42").unwrap_err();
        assert!(matches!(err, LendingError::Validation(_)));
        assert!(err.to_string().contains("user"));
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let id = DonationId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id));
    }
}
