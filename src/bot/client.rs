//! Client construction and startup.

use crate::{
    bot::{BotData, commands, hooks},
    config::AppConfig,
    core::settings::BotService,
    errors::{Error, Result},
};
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use tracing::{info, instrument};

/// Builds the framework around `settings` and runs the client until it stops.
///
/// On ready the bot records its start in the settings and registers its
/// commands globally.
#[instrument(skip(token, config, settings))]
pub async fn run_bot(
    token: String,
    config: Arc<AppConfig>,
    settings: Arc<BotService>,
) -> Result<()> {
    let owners = config
        .admin_ids
        .iter()
        .map(|id| serenity::UserId::new(*id))
        .collect();

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: commands::all_commands(),
            prefix_options: poise::PrefixFrameworkOptions {
                dynamic_prefix: Some(|ctx| Box::pin(hooks::dynamic_prefix(ctx))),
                ..Default::default()
            },
            command_check: Some(|ctx| Box::pin(hooks::command_check(ctx))),
            post_command: |ctx| Box::pin(hooks::post_command(ctx)),
            on_error: |error| Box::pin(hooks::on_error(error)),
            owners,
            initialize_owners: false,
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);
                settings.start_bot(ready.user.id.to_string()).await?;
                info!("Registering commands globally...");
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                Ok(BotData::new(settings, config))
            })
        })
        .build();

    let intents = serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::DIRECT_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT;

    info!("Setting up Serenity client for Poise framework...");
    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await
        .inspect_err(|e| tracing::error!("Error creating client: {:?}", e))?;

    info!("Starting bot client...");
    client
        .start()
        .await
        .inspect_err(|e| tracing::error!("Client error: {:?}", e))
        .map_err(Error::from)
}
