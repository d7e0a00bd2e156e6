//! Configuration for booklend
//!
//! Centralized configuration for lending policy defaults, the database
//! location and the HTTP listener. Policy values stored in the settings table
//! take precedence over the defaults configured here.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// System-wide configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LendingConfig {
    /// Fallback lending policy
    pub policy: PolicyConfig,
    /// Record store location
    pub database: DatabaseConfig,
    /// HTTP listener settings
    pub server: ServerConfig,
}

/// Fallback values used when a policy key is absent from the settings store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Maximum number of active borrows per user
    pub default_max_books_per_user: u32,
    /// Loan length after which an approved borrow counts as overdue
    pub default_max_borrow_days: u32,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            default_max_books_per_user: 5,
            default_max_borrow_days: 30,
        }
    }
}

/// Record store configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file path, or `:memory:`
    pub path: String,
}

impl DatabaseConfig {
    pub const IN_MEMORY: &'static str = ":memory:";

    pub fn is_in_memory(&self) -> bool {
        self.path == Self::IN_MEMORY
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "library.db".to_string(),
        }
    }
}

/// HTTP listener configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address
    pub addr: String,
    /// Student id of the administrator created on first start
    pub bootstrap_admin: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:5000".to_string(),
            bootstrap_admin: Some("admin".to_string()),
        }
    }
}

impl LendingConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration backed by an in-memory database
    pub fn in_memory() -> Self {
        Self {
            database: DatabaseConfig {
                path: DatabaseConfig::IN_MEMORY.to_string(),
            },
            ..Self::default()
        }
    }

    /// Load configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Serialize configuration to TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load configuration from a JSON string
    pub fn from_json(json_str: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json_str)
    }

    /// Serialize configuration to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Read and validate a TOML configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        let config = Self::from_toml(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.policy.default_max_books_per_user == 0 {
            return Err(ConfigError::OutOfRange(
                "default_max_books_per_user must be positive".to_string(),
            ));
        }

        if self.policy.default_max_borrow_days == 0 {
            return Err(ConfigError::OutOfRange(
                "default_max_borrow_days must be positive".to_string(),
            ));
        }

        if self.policy.default_max_borrow_days > crate::policy::BORROW_DAYS_LIMIT {
            return Err(ConfigError::OutOfRange(format!(
                "default_max_borrow_days must be at most {}",
                crate::policy::BORROW_DAYS_LIMIT
            )));
        }

        if self.database.path.trim().is_empty() {
            return Err(ConfigError::MissingField("database.path".to_string()));
        }

        if self.server.addr.trim().is_empty() {
            return Err(ConfigError::MissingField("server.addr".to_string()));
        }

        Ok(())
    }
}

/// Configuration loading or validation error
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Value is out of valid range
    #[error("Value out of range: {0}")]
    OutOfRange(String),
    /// Required field is missing
    #[error("Missing field: {0}")]
    MissingField(String),
    /// The document could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),
    /// The file could not be read
    #[error("IO error: {0}")]
    Io(String),
}
