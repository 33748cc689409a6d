//! General commands - ping, help and bot info.
//! These only read the settings and are available to everyone the
//! command check lets through.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::BotData,
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;

    const fn on_off(flag: bool) -> &'static str {
        if flag { "✅ On" } else { "❌ Off" }
    }

    /// Responds with "Pong!" to test bot connectivity.
    #[poise::command(slash_command, prefix_command)]
    pub async fn ping(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.say("Pong!").await?;
        Ok(())
    }

    /// Displays help information about available commands.
    #[poise::command(slash_command, prefix_command)]
    pub async fn help(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let bot = ctx.data().settings.get_bot();
        let p = bot.prefix;
        let help_text = format!(
            "**{name} Help**\n\
            Text commands start with `{p}`; every command is also a slash command.\n\n\
            **General Commands**\n\
            • `{p}ping` - Checks if the bot is responsive.\n\
            • `{p}botinfo` - Shows the current bot settings.\n\
            • `{p}help` - Shows this help message.\n\n\
            **Admin Commands**\n\
            • `{p}setname <name>` - Changes the bot name.\n\
            • `{p}setprefix <prefix>` - Changes the command prefix.\n\
            • `{p}autosticker <on>` - Toggles automatic stickers.\n\
            • `{p}adminmode <on>` - Restricts commands to admins.\n\
            • `{p}commandspv <on>` - Toggles commands in private chats.\n\
            • `{p}ratelimit <on> [max] [seconds]` - Configures command rate limiting.\n\
            • `{p}block <commands...>` / `{p}unblock <commands...>` - Manages blocked commands.",
            name = bot.name,
        );

        ctx.say(help_text).await?;
        Ok(())
    }

    /// Shows the current bot settings.
    #[poise::command(slash_command, prefix_command)]
    pub async fn botinfo(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let bot = ctx.data().settings.get_bot();

        let started = bot.started_at().map_or_else(
            || "Never".to_string(),
            |at| at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        );
        let rate = if bot.command_rate.status {
            format!(
                "✅ {} commands/min, {}s block",
                bot.command_rate.max_cmds_minute, bot.command_rate.block_time
            )
        } else {
            on_off(false).to_string()
        };
        let blocked = if bot.block_cmds.is_empty() {
            "None".to_string()
        } else {
            bot.block_cmds
                .iter()
                .map(|command| format!("`{}{command}`", bot.prefix))
                .collect::<Vec<_>>()
                .join(", ")
        };

        let embed = serenity::CreateEmbed::default()
            .title(format!("🤖 {}", bot.name))
            .color(0x0058_65F2)
            .field("Prefix", format!("`{}`", bot.prefix), true)
            .field("Started", started, true)
            .field("Commands executed", bot.executed_cmds.to_string(), true)
            .field("Auto-sticker", on_off(bot.autosticker), true)
            .field("Admin mode", on_off(bot.admin_mode), true)
            .field("Private commands", on_off(bot.commands_pv), true)
            .field("Rate limit", rate, false)
            .field("Blocked commands", blocked, false);

        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
