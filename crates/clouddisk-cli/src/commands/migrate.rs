//! Database migration command.

use clouddisk_core::config::AppConfig;
use clouddisk_core::error::AppError;

use crate::output;

/// Apply all pending migrations to the configured database.
pub async fn execute(config: &AppConfig) -> Result<(), AppError> {
    let db = super::open_database(config).await?;
    db.close().await;
    output::print_success("All migrations applied successfully.");
    Ok(())
}
