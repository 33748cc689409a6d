//! Command implementations organized by category.

#![allow(clippy::too_long_first_doc_paragraph)]

/// Owner-only commands changing the bot settings
pub mod admin;

/// General utility commands
pub mod general;

use crate::{bot::BotData, errors::Error};

// Export commands
pub use admin::*;
pub use general::*;

/// Every command the framework registers.
#[must_use]
pub fn all_commands() -> Vec<poise::Command<BotData, Error>> {
    vec![
        ping(),
        help(),
        botinfo(),
        setname(),
        setprefix(),
        autosticker(),
        adminmode(),
        commandspv(),
        ratelimit(),
        block(),
        unblock(),
    ]
}
