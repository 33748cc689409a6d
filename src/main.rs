use dotenvy::dotenv;
use lbot::{
    bot,
    config::{AppConfig, logging},
    core::{migration, settings::BotService},
    errors::{Error, Result},
};
use std::{env, sync::Arc};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load .env file (non-fatal, env vars can be set externally)
    let dotenv_loaded = dotenv().is_ok();

    // 2. Initialize tracing, after .env so it can set RUST_LOG and the debug flags
    logging::init_tracing();
    info!("Attempted to load .env file (found: {}).", dotenv_loaded);

    // 3. Load the application configuration
    let app_config = AppConfig::load("config.toml")
        .inspect_err(|e| error!("Critical error loading application configuration: {}", e))?;
    info!(
        "Settings stored at {:?}, {} admin(s) configured.",
        app_config.storage_path,
        app_config.admin_ids.len()
    );

    // 4. Load the bot settings (seeds defaults on first run)
    let settings = Arc::new(BotService::new(&app_config.storage_path));
    settings
        .load()
        .await
        .inspect(|bot| info!("Bot settings loaded for '{}'.", bot.name))
        .inspect_err(|e| error!("Failed to load bot settings: {}", e))?;

    // 5. Bring older settings files up to the current schema
    migration::run_startup_migration(settings.as_ref())
        .await
        .inspect_err(|e| error!("Settings migration failed: {}", e))?;

    // 6. Run the bot
    // DISCORD_BOT_TOKEN is loaded here, directly before use, not stored in AppConfig
    let token = env::var("DISCORD_BOT_TOKEN")
        .inspect_err(|e| error!("DISCORD_BOT_TOKEN not found: {}", e))
        .map_err(Error::EnvVar)?;

    bot::run_bot(token, Arc::new(app_config), settings).await
}
