//! Error types for booklend-core

use thiserror::Error;

/// Result type alias for lending operations
pub type Result<T> = std::result::Result<T, LendingError>;

/// Main error type for lending operations
#[derive(Error, Debug)]
pub enum LendingError {
    /// A referenced entity does not exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The entity's current status does not allow the requested transition
    ///
    /// Raised by an entity's own transition table. Together with
    /// [`LendingError::InvalidState`] it forms the invalid-state class: both
    /// report [`ErrorKind::InvalidState`], so match on
    /// [`LendingError::is_invalid_state`] or [`LendingError::kind`] rather than
    /// on either variant alone.
    #[error("{entity} {id} cannot move from {from} to {to}")]
    InvalidTransition {
        entity: &'static str,
        id: String,
        from: String,
        to: String,
    },

    /// The operation is not legal in the current state
    ///
    /// Raised by workflow preconditions that span entities, such as
    /// requesting a book that is not available.
    #[error("{0}")]
    InvalidState(String),

    /// The caller lacks the required role or ownership
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The per-user borrow cap has been reached
    #[error("Borrow limit reached: at most {limit} active borrows per user")]
    LimitExceeded { limit: u32 },

    /// Malformed input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Persistence-related errors
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),
}

/// Persistence-specific errors
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A write did not produce the entity it was expected to produce
    #[error("Inconsistent changeset: {0}")]
    Inconsistent(String),

    /// Schema version mismatch
    #[error("Schema version mismatch: expected at most {expected}, got {actual}")]
    SchemaVersionMismatch { expected: u32, actual: u32 },
}

/// Coarse classification of [`LendingError`], used at the access boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    InvalidState,
    Forbidden,
    LimitExceeded,
    Validation,
    Internal,
}

impl LendingError {
    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        LendingError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub(crate) fn admin_only(operation: &str) -> Self {
        LendingError::Forbidden(format!("{} requires an administrator", operation))
    }

    /// Whether this is either form of illegal transition
    pub fn is_invalid_state(&self) -> bool {
        self.kind() == ErrorKind::InvalidState
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            LendingError::NotFound { .. } => ErrorKind::NotFound,
            LendingError::InvalidTransition { .. } | LendingError::InvalidState(_) => {
                ErrorKind::InvalidState
            }
            LendingError::Forbidden(_) => ErrorKind::Forbidden,
            LendingError::LimitExceeded { .. } => ErrorKind::LimitExceeded,
            LendingError::Validation(_) => ErrorKind::Validation,
            LendingError::Persistence(_) => ErrorKind::Internal,
        }
    }
}

impl From<rusqlite::Error> for PersistenceError {
    fn from(err: rusqlite::Error) -> Self {
        PersistenceError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(err: serde_json::Error) -> Self {
        PersistenceError::Serialization(err.to_string())
    }
}

impl From<rusqlite::Error> for LendingError {
    fn from(err: rusqlite::Error) -> Self {
        LendingError::Persistence(PersistenceError::from(err))
    }
}

impl From<serde_json::Error> for LendingError {
    fn from(err: serde_json::Error) -> Self {
        LendingError::Persistence(PersistenceError::from(err))
    }
}
