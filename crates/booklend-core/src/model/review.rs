//! Book reviews

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{BookId, ParseStatusError, ReviewId, UserId};
use crate::error::{LendingError, Result};

/// Overall tone of a review
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewKind {
    Positive,
    #[default]
    Neutral,
    Negative,
}

impl ReviewKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewKind::Positive => "positive",
            ReviewKind::Neutral => "neutral",
            ReviewKind::Negative => "negative",
        }
    }
}

impl std::fmt::Display for ReviewKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ReviewKind {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "positive" => Ok(ReviewKind::Positive),
            "neutral" => Ok(ReviewKind::Neutral),
            "negative" => Ok(ReviewKind::Negative),
            other => Err(ParseStatusError::new("review", other)),
        }
    }
}

/// A review as submitted by a reader
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReview {
    #[serde(default = "default_rating")]
    pub rating: i64,
    #[serde(default)]
    pub content: String,
    #[serde(default, alias = "review_type")]
    pub kind: ReviewKind,
}

fn default_rating() -> i64 {
    5
}

/// A stored review; at most one per reader per book
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub book_id: BookId,
    pub user_id: UserId,
    pub rating: u8,
    pub content: String,
    pub kind: ReviewKind,
    pub created_at: DateTime<Utc>,
}

impl Review {
    /// Validate a submission and turn it into a review
    pub fn new(
        book_id: BookId,
        user_id: UserId,
        input: NewReview,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let rating = u8::try_from(input.rating)
            .ok()
            .filter(|r| (1..=5).contains(r))
            .ok_or_else(|| {
                LendingError::Validation(format!(
                    "rating must be between 1 and 5, got {}",
                    input.rating
                ))
            })?;
        Ok(Self {
            id: ReviewId::new(),
            book_id,
            user_id,
            rating,
            content: input.content.trim().to_string(),
            kind: input.kind,
            created_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submit(rating: i64) -> Result<Review> {
        Review::new(
            BookId::new(),
            UserId::new(),
            NewReview {
                rating,
                content: " good ".to_string(),
                kind: ReviewKind::Positive,
            },
            Utc::now(),
        )
    }

    #[test]
    fn test_rating_bounds() {
        assert!(submit(0).is_err());
        assert!(submit(6).is_err());
        assert!(submit(-300).is_err());
        assert_eq!(submit(1).unwrap().rating, 1);
        assert_eq!(submit(5).unwrap().content, "good");
    }

    #[test]
    fn test_defaults_when_deserializing() {
        let input: NewReview = serde_json::from_str("{}").unwrap();
        assert_eq!(input.rating, 5);
        assert_eq!(input.kind, ReviewKind::Neutral);

        let input: NewReview = serde_json::from_str(r#"{"review_type":"negative"}"#).unwrap();
        assert_eq!(input.kind, ReviewKind::Negative);
    }
}
