//! Connection ownership and transaction boundaries

use std::path::Path;
use std::time::Duration;

use rusqlite::{Connection, TransactionBehavior};
use tracing::{debug, info};

use super::schema::{Schema, SCHEMA_VERSION};
use super::Session;
use crate::config::DatabaseConfig;
use crate::error::{PersistenceError, Result};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Owner of the library database connection
pub struct Repository {
    conn: Connection,
}

impl Repository {
    /// Create a new repository with the given database path
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        let repo = Self { conn };
        repo.initialize()?;
        info!(path = %path.as_ref().display(), "Opened library database");
        Ok(repo)
    }

    /// Create an in-memory repository (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let repo = Self { conn };
        repo.initialize()?;
        Ok(repo)
    }

    /// Open the database named by the configuration
    pub fn open(config: &DatabaseConfig) -> Result<Self> {
        if config.is_in_memory() {
            Self::in_memory()
        } else {
            Self::new(&config.path)
        }
    }

    fn initialize(&self) -> Result<()> {
        let current_version = self.schema_version()?;

        if current_version == 0 {
            self.conn.execute_batch(Schema::create_tables())?;
            self.set_schema_version(SCHEMA_VERSION)?;
        } else if current_version < SCHEMA_VERSION {
            for version in current_version..SCHEMA_VERSION {
                if let Some(migration) = Schema::migration(version, version + 1) {
                    debug!(from = version, to = version + 1, "Applying migration");
                    self.conn.execute_batch(migration)?;
                }
            }
            self.set_schema_version(SCHEMA_VERSION)?;
        } else if current_version > SCHEMA_VERSION {
            return Err(PersistenceError::SchemaVersionMismatch {
                expected: SCHEMA_VERSION,
                actual: current_version,
            }
            .into());
        }

        Ok(())
    }

    /// Highest applied schema version, 0 for a fresh database
    pub fn schema_version(&self) -> Result<u32> {
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'schema_version')",
            [],
            |row| row.get(0),
        )?;
        if !exists {
            return Ok(0);
        }
        let version: Option<u32> =
            self.conn
                .query_row("SELECT MAX(version) FROM schema_version", [], |row| {
                    row.get(0)
                })?;
        Ok(version.unwrap_or(0))
    }

    fn set_schema_version(&self, version: u32) -> Result<()> {
        self.conn.execute(
            "INSERT INTO schema_version (version) VALUES (?1)",
            [version],
        )?;
        Ok(())
    }

    /// Run `f` inside a `BEGIN IMMEDIATE` transaction
    ///
    /// The transaction commits when `f` returns `Ok` and rolls back otherwise,
    /// so every precondition read by `f` still holds when its writes land.
    pub fn transaction<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&Session<'_>) -> Result<T>,
    {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let value = f(&Session::new(&tx))?;
        tx.commit()?;
        Ok(value)
    }

    /// Run read-only queries outside an explicit transaction
    pub fn read<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Session<'_>) -> Result<T>,
    {
        f(&Session::new(&self.conn))
    }
}
