//! Booklend Server Binary
//!
//! Standalone server for the booklend lending API.

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use booklend_core::{LendingConfig, Library};
use booklend_server::{serve, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = match std::env::var("BOOKLEND_CONFIG") {
        Ok(path) => LendingConfig::load(&path)?,
        Err(_) => LendingConfig::new(),
    };
    if let Ok(addr) = std::env::var("BOOKLEND_ADDR") {
        config.server.addr = addr;
    }

    let mut library = Library::open(&config)?;
    tracing::info!("Opened library database at {}", config.database.path);

    if let Some(student_id) = config.server.bootstrap_admin.as_deref() {
        if let Some(admin) = library.ensure_admin(student_id, "Administrator")? {
            tracing::info!(
                student_id = %admin.student_id,
                access_token = %admin.access_token,
                "Created bootstrap administrator"
            );
        }
    }

    let state = Arc::new(AppState::new(library));
    serve(&config.server.addr, state).await
}
