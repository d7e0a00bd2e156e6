//! Borrow, donor-confirmation and donation workflows
//!
//! Cross-entity cascades are computed as a [`Changeset`] by
//! [`Command::plan`] and written atomically by the engine.

mod changeset;
mod command;

pub use changeset::{Change, Changeset};
pub use command::Command;
