//! Lending policy resolved from the settings store
//!
//! Stored settings win; [`PolicyConfig`] supplies the fallback for every key
//! that has never been written.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::PolicyConfig;
use crate::error::{LendingError, Result};
use crate::store::SettingsStore;

/// Settings key for the loan period in days
pub const MAX_BORROW_DAYS: &str = "max_borrow_days";

/// Settings key for the per-user cap on active borrow records
pub const MAX_BOOKS_PER_USER: &str = "max_books_per_user";

/// Every key the settings store accepts
pub const KNOWN_KEYS: [&str; 2] = [MAX_BORROW_DAYS, MAX_BOOKS_PER_USER];

/// Longest loan period an administrator may set (one hundred years)
pub const BORROW_DAYS_LIMIT: u32 = 36_500;

/// Effective lending policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    pub max_books_per_user: u32,
    pub max_borrow_days: u32,
}

impl Policy {
    /// Read the policy, falling back to `defaults` for unset or unusable values
    pub fn resolve<S: SettingsStore + ?Sized>(store: &S, defaults: &PolicyConfig) -> Result<Self> {
        Ok(Self {
            max_books_per_user: lookup(
                store,
                MAX_BOOKS_PER_USER,
                defaults.default_max_books_per_user,
            )?,
            max_borrow_days: lookup(store, MAX_BORROW_DAYS, defaults.default_max_borrow_days)?,
        })
    }

    /// Approval times strictly before this instant are overdue
    ///
    /// A period reaching past the representable range yields the earliest
    /// instant, so nothing is overdue.
    pub fn overdue_threshold(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        Duration::try_days(i64::from(self.max_borrow_days))
            .and_then(|period| now.checked_sub_signed(period))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

fn lookup<S: SettingsStore + ?Sized>(store: &S, key: &str, default: u32) -> Result<u32> {
    match store.setting(key)? {
        None => Ok(default),
        Some(raw) => match parse_positive(&raw) {
            Some(value) => Ok(value),
            None => {
                warn!(key, value = %raw, default, "Ignoring unusable setting");
                Ok(default)
            }
        },
    }
}

fn parse_positive(raw: &str) -> Option<u32> {
    raw.trim().parse::<u32>().ok().filter(|v| *v > 0)
}

/// Check a settings write and return the value in canonical form
pub fn validate_setting(key: &str, value: &str) -> Result<String> {
    if !KNOWN_KEYS.contains(&key) {
        return Err(LendingError::Validation(format!("unknown setting: {}", key)));
    }
    let parsed = parse_positive(value).ok_or_else(|| {
        LendingError::Validation(format!("{} must be a positive integer, got {:?}", key, value))
    })?;
    if key == MAX_BORROW_DAYS && parsed > BORROW_DAYS_LIMIT {
        return Err(LendingError::Validation(format!(
            "{} must be at most {}, got {}",
            key, BORROW_DAYS_LIMIT, parsed
        )));
    }
    Ok(parsed.to_string())
}

/// All stored settings with the defaults filled in for unset known keys
pub fn effective_settings<S: SettingsStore + ?Sized>(
    store: &S,
    defaults: &PolicyConfig,
) -> Result<BTreeMap<String, String>> {
    let mut settings = store.settings()?;
    settings
        .entry(MAX_BORROW_DAYS.to_string())
        .or_insert_with(|| defaults.default_max_borrow_days.to_string());
    settings
        .entry(MAX_BOOKS_PER_USER.to_string())
        .or_insert_with(|| defaults.default_max_books_per_user.to_string());
    Ok(settings)
}
