//! Admin commands - change the bot settings.
//! Every command here is owners-only; the framework owners are the configured
//! admin IDs. Each one forwards to a single settings mutator and reports the result.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::BotData,
        core::settings::BlockOperation,
        errors::{Error, Result},
    };

    fn state(enabled: bool) -> &'static str {
        if enabled { "enabled" } else { "disabled" }
    }

    async fn update_block_list(
        ctx: poise::Context<'_, BotData, Error>,
        commands: &str,
        operation: BlockOperation,
    ) -> Result<()> {
        let settings = &ctx.data().settings;
        let prefix = settings.get_bot().prefix;
        let requested: Vec<&str> = commands.split_whitespace().collect();
        if requested.is_empty() {
            ctx.say("Tell me which commands, e.g. `sticker menu`.").await?;
            return Ok(());
        }

        let changed = settings
            .set_blocked_commands(&prefix, requested.as_slice(), operation)
            .await?;
        let reply = match (operation, changed.is_empty()) {
            (BlockOperation::Add, true) => "Those commands were already blocked.".to_string(),
            (BlockOperation::Remove, true) => "None of those commands were blocked.".to_string(),
            (BlockOperation::Add, false) => format!("🚫 Blocked: {}", changed.join(", ")),
            (BlockOperation::Remove, false) => format!("✅ Unblocked: {}", changed.join(", ")),
        };
        ctx.say(reply).await?;
        Ok(())
    }

    /// Changes the bot's display name.
    #[poise::command(slash_command, prefix_command, owners_only, category = "Admin")]
    pub async fn setname(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "New display name"]
        #[rest]
        name: String,
    ) -> Result<()> {
        let name = name.trim();
        ctx.data().settings.set_name(name).await?;
        ctx.say(format!("✅ Bot name changed to **{name}**.")).await?;
        Ok(())
    }

    /// Changes the prefix of text commands.
    #[poise::command(slash_command, prefix_command, owners_only, category = "Admin")]
    pub async fn setprefix(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "New command prefix"] prefix: String,
    ) -> Result<()> {
        let prefix = prefix.trim();
        ctx.data().settings.set_prefix(prefix).await?;
        ctx.say(format!("✅ Command prefix changed to `{prefix}`."))
            .await?;
        Ok(())
    }

    /// Turns automatic sticker conversion on or off.
    #[poise::command(slash_command, prefix_command, owners_only, category = "Admin")]
    pub async fn autosticker(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Convert every media message into a sticker"] enabled: bool,
    ) -> Result<()> {
        ctx.data().settings.set_autosticker(enabled).await?;
        ctx.say(format!("Auto-sticker {}.", state(enabled))).await?;
        Ok(())
    }

    /// Restricts every command to admins, or lifts the restriction.
    #[poise::command(slash_command, prefix_command, owners_only, category = "Admin")]
    pub async fn adminmode(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Only admins may use commands"] enabled: bool,
    ) -> Result<()> {
        ctx.data().settings.set_admin_mode(enabled).await?;
        ctx.say(format!("Admin mode {}.", state(enabled))).await?;
        Ok(())
    }

    /// Allows or refuses commands in private chats.
    #[poise::command(slash_command, prefix_command, owners_only, category = "Admin")]
    pub async fn commandspv(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Accept commands in private chats"] enabled: bool,
    ) -> Result<()> {
        ctx.data().settings.set_commands_pv(enabled).await?;
        ctx.say(format!("Private chat commands {}.", state(enabled)))
            .await?;
        Ok(())
    }

    /// Configures per-user command rate limiting.
    ///
    /// Omitted limits keep their current values.
    #[poise::command(slash_command, prefix_command, owners_only, category = "Admin")]
    pub async fn ratelimit(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Enforce the limit"] enabled: bool,
        #[description = "Commands allowed per minute"] max_per_minute: Option<u32>,
        #[description = "Seconds a user stays blocked"] block_seconds: Option<u64>,
    ) -> Result<()> {
        let settings = &ctx.data().settings;
        let current = settings.get_bot().command_rate;
        let max_per_minute = max_per_minute.unwrap_or(current.max_cmds_minute);
        let block_seconds = block_seconds.unwrap_or(current.block_time);

        settings
            .set_command_rate(enabled, max_per_minute, block_seconds)
            .await?;
        ctx.say(format!(
            "Rate limit {}: {max_per_minute} commands/min, {block_seconds}s block.",
            state(enabled)
        ))
        .await?;
        Ok(())
    }

    /// Blocks commands for everyone except admins.
    #[poise::command(slash_command, prefix_command, owners_only, category = "Admin")]
    pub async fn block(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Commands to block, separated by spaces"]
        #[rest]
        commands: String,
    ) -> Result<()> {
        update_block_list(ctx, &commands, BlockOperation::Add).await
    }

    /// Unblocks previously blocked commands.
    #[poise::command(slash_command, prefix_command, owners_only, category = "Admin")]
    pub async fn unblock(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Commands to unblock, separated by spaces"]
        #[rest]
        commands: String,
    ) -> Result<()> {
        update_block_list(ctx, &commands, BlockOperation::Remove).await
    }
}

// Re-export all commands
pub use inner::*;
