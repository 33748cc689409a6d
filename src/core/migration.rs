//! Startup migration - brings an older settings file up to the current shape once.

use crate::{
    core::{settings::BotService, store::DocumentStore},
    errors::Result,
};
use tracing::info;

/// Migrates the settings if a previous run has not done so yet.
///
/// Returns `true` when a migration ran. Afterwards `db_migrated` is set, so the
/// next start skips this step.
pub async fn run_startup_migration<S: DocumentStore>(settings: &BotService<S>) -> Result<bool> {
    let current = settings.load().await?;
    if current.db_migrated {
        info!("Settings already migrated, skipping");
        return Ok(false);
    }

    info!("Migrating settings to the current schema...");
    settings.migrate().await?;
    settings.set_db_migrated(true).await?;
    info!("Settings migration complete");
    Ok(true)
}
