//! Framework hooks wiring the settings into command dispatch.

use crate::{
    bot::BotData,
    core::{
        access::{self, Invocation},
        rate_limit::RateDecision,
    },
    errors::Error,
};
use std::time::Instant;
use tracing::{debug, error};

/// Command context shared by hooks and commands.
pub type Context<'a> = poise::Context<'a, BotData, Error>;

/// Prefix for text commands, read from the settings on every message.
pub async fn dynamic_prefix(
    ctx: poise::PartialContext<'_, BotData, Error>,
) -> Result<Option<String>, Error> {
    Ok(Some(ctx.framework.user_data.settings.get_bot().prefix))
}

/// Refuses commands the settings or the rate limiter do not allow, telling the author why.
pub async fn command_check(ctx: Context<'_>) -> Result<bool, Error> {
    let data = ctx.data();
    let settings = data.settings.get_bot();
    let invocation = Invocation {
        command: &ctx.command().name,
        is_admin: data.is_admin(ctx.author().id.get()),
        is_private: ctx.guild_id().is_none(),
    };

    let decision = access::evaluate(&settings, &invocation);
    if let Some(message) = decision.denial_message() {
        debug!(
            "Refused `{}` for user {}: {:?}",
            invocation.command,
            ctx.author().id,
            decision
        );
        ctx.say(message).await?;
        return Ok(false);
    }

    if invocation.is_admin {
        return Ok(true);
    }

    let user_id = ctx.author().id.to_string();
    match data
        .rate_limiter
        .check(&user_id, &settings.command_rate, Instant::now())
    {
        RateDecision::Allowed => Ok(true),
        RateDecision::Limited { retry_after } => {
            debug!("Rate limited user {} for {:?}", user_id, retry_after);
            ctx.say(format!(
                "You are sending commands too fast. Try again in {} seconds.",
                retry_after.as_secs().max(1)
            ))
            .await?;
            Ok(false)
        }
    }
}

/// Counts every successfully executed command.
pub async fn post_command(ctx: Context<'_>) {
    if let Err(e) = ctx.data().settings.increment_executed_commands().await {
        error!(
            "Failed to count execution of `{}`: {}",
            ctx.command().name,
            e
        );
    }
}

/// Logs framework errors and reports command failures to the author.
pub async fn on_error(error: poise::FrameworkError<'_, BotData, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            error!("Failed to start bot: {:?}", error);
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!("Error in command `{}`: {:?}", ctx.command().name, error);
            let message = match &error {
                Error::InvalidSetting { .. } => error.to_string(),
                _ => "Something went wrong while running that command.".to_string(),
            };
            if let Err(e) = ctx.say(message).await {
                error!("Failed to send error message: {}", e);
            }
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                error!("Error while handling error: {}", e);
            }
        }
    }
}
