//! Users and the authenticated identity passed into workflow operations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::UserId;
use crate::error::{LendingError, Result};

const MAX_STUDENT_ID_LEN: usize = 20;
const MAX_NAME_LEN: usize = 50;

/// A registered library user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub student_id: String,
    pub name: String,
    /// Opaque bearer credential; never serialized
    #[serde(skip_serializing, default)]
    pub access_token: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Register a user and issue a fresh access token
    pub fn new(
        student_id: impl Into<String>,
        name: impl Into<String>,
        is_admin: bool,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let user = Self {
            id: UserId::new(),
            student_id: student_id.into().trim().to_string(),
            name: name.into().trim().to_string(),
            access_token: issue_token(),
            is_admin,
            created_at: now,
        };
        user.validate()?;
        Ok(user)
    }

    pub fn validate(&self) -> Result<()> {
        if self.student_id.is_empty() {
            return Err(LendingError::Validation("student_id is required".to_string()));
        }
        if self.name.is_empty() {
            return Err(LendingError::Validation("name is required".to_string()));
        }
        if self.student_id.chars().count() > MAX_STUDENT_ID_LEN {
            return Err(LendingError::Validation(format!(
                "student_id must be at most {} characters",
                MAX_STUDENT_ID_LEN
            )));
        }
        if self.name.chars().count() > MAX_NAME_LEN {
            return Err(LendingError::Validation(format!(
                "name must be at most {} characters",
                MAX_NAME_LEN
            )));
        }
        Ok(())
    }

    pub fn actor(&self) -> Actor {
        Actor {
            user_id: self.id,
            is_admin: self.is_admin,
        }
    }
}

fn issue_token() -> String {
    format!("booklend-{}", Uuid::new_v4().simple())
}

/// The authenticated caller of a workflow operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: UserId,
    pub is_admin: bool,
}

impl Actor {
    pub fn user(user_id: UserId) -> Self {
        Self {
            user_id,
            is_admin: false,
        }
    }

    pub fn admin(user_id: UserId) -> Self {
        Self {
            user_id,
            is_admin: true,
        }
    }

    /// Fail with `Forbidden` unless the caller is an administrator
    pub fn require_admin(&self, operation: &str) -> Result<()> {
        if self.is_admin {
            Ok(())
        } else {
            Err(LendingError::admin_only(operation))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_are_unique() {
        let a = User::new("s1", "Ann", false, Utc::now()).unwrap();
        let b = User::new("s2", "Bob", false, Utc::now()).unwrap();
        assert!(a.access_token.starts_with("booklend-"));
        assert_ne!(a.access_token, b.access_token);
    }

    #[test]
    fn test_token_not_serialized() {
        let user = User::new("s1", "Ann", false, Utc::now()).unwrap();
        let value = serde_json::to_value(&user).unwrap();
        assert!(value.get("access_token").is_none());
        assert_eq!(value["student_id"], "s1");
    }

    #[test]
    fn test_validation() {
        assert!(User::new("  ", "Ann", false, Utc::now()).is_err());
        assert!(User::new("s1", "", false, Utc::now()).is_err());
        assert!(User::new("s".repeat(21), "Ann", false, Utc::now()).is_err());
    }

    #[test]
    fn test_require_admin() {
        let id = UserId::new();
        assert!(Actor::admin(id).require_admin("approve").is_ok());
        let err = Actor::user(id).require_admin("approve").unwrap_err();
        assert!(matches!(err, LendingError::Forbidden(_)));
    }
}
