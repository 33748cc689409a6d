//! Command gating derived from the bot settings.
//!
//! Pure policy with no framework types, so the dispatch layer only has to
//! describe the invocation and act on the decision.

use crate::core::document::BotSettings;

/// What the dispatch layer knows about a command about to run.
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
    /// Command name without prefix
    pub command: &'a str,
    /// Whether the author is a bot admin
    pub is_admin: bool,
    /// Whether the command came from a private chat
    pub is_private: bool,
}

/// Outcome of [`evaluate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    /// The command may run
    Allowed,
    /// Admin mode is on and the author is not an admin
    AdminOnly,
    /// Commands are disabled in private chats
    PrivateDisabled,
    /// The command is on the block list
    Blocked {
        /// Blocked command, with the current prefix
        command: String,
    },
}

impl AccessDecision {
    /// Reply shown to the author when the command is refused.
    #[must_use]
    pub fn denial_message(&self) -> Option<String> {
        match self {
            Self::Allowed => None,
            Self::AdminOnly => Some("The bot is in admin mode, only admins can use commands right now.".to_string()),
            Self::PrivateDisabled => Some("Commands are disabled in private chats.".to_string()),
            Self::Blocked { command } => Some(format!("The command **{command}** is blocked.")),
        }
    }
}

/// Decides whether `invocation` may run under `settings`. Admins always may.
#[must_use]
pub fn evaluate(settings: &BotSettings, invocation: &Invocation<'_>) -> AccessDecision {
    if invocation.is_admin {
        return AccessDecision::Allowed;
    }
    if settings.admin_mode {
        return AccessDecision::AdminOnly;
    }
    if invocation.is_private && !settings.commands_pv {
        return AccessDecision::PrivateDisabled;
    }
    if settings.is_blocked(invocation.command) {
        return AccessDecision::Blocked {
            command: format!("{}{}", settings.prefix, invocation.command),
        };
    }
    AccessDecision::Allowed
}
