//! Bot layer - chat-client interface, command handlers, and bot context
//!
//! This module connects the settings store to the poise command framework:
//! the framework hooks consult the settings before every command, and the
//! admin commands are thin wrappers over the settings mutators.

/// Client construction and startup
pub mod client;
/// Command implementations (general, admin)
pub mod commands;
/// Framework hooks: dynamic prefix, command gating, error reporting
pub mod hooks;

use crate::{
    config::AppConfig,
    core::{rate_limit::CommandRateLimiter, settings::BotService},
};
use std::sync::Arc;

/// Shared data available to all bot commands.
/// Holds the settings service and the per-user rate-limit state.
pub struct BotData {
    /// Bot-wide settings store
    pub settings: Arc<BotService>,
    /// Per-user command counters
    pub rate_limiter: CommandRateLimiter,
    /// Application configuration
    pub config: Arc<AppConfig>,
}

impl BotData {
    /// Creates the shared context for all commands.
    #[must_use]
    pub fn new(settings: Arc<BotService>, config: Arc<AppConfig>) -> Self {
        Self {
            settings,
            rate_limiter: CommandRateLimiter::new(),
            config,
        }
    }

    /// Whether `user_id` is a bot admin.
    #[must_use]
    pub fn is_admin(&self, user_id: u64) -> bool {
        self.config.is_admin(user_id)
    }
}

pub use client::run_bot;
pub use commands::*;
