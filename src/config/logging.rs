//! Tracing setup.
//!
//! `RUST_LOG` wins when set. Otherwise the filter is `info`, or
//! `info,lbot=debug` when a context-debug flag is enabled.

use tracing_subscriber::EnvFilter;

/// Environment keys that switch on verbose logging for the bot, checked in order.
pub const CONTEXT_DEBUG_ENV_KEYS: [&str; 2] = ["BOT_CONTEXT_DEBUG", "DEBUG_BOT_CONTEXT"];

/// Parses a boolean-ish environment value. Unknown values yield `None`.
#[must_use]
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Whether context debugging is enabled according to `lookup`.
///
/// The first key holding a recognizable value decides.
pub fn context_debug_enabled<F>(lookup: F) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    CONTEXT_DEBUG_ENV_KEYS
        .iter()
        .find_map(|&key| lookup(key).as_deref().and_then(parse_flag))
        .unwrap_or(false)
}

/// Default filter directive when `RUST_LOG` is not set.
#[must_use]
pub const fn default_directive(context_debug: bool) -> &'static str {
    if context_debug { "info,lbot=debug" } else { "info" }
}

/// Installs the global tracing subscriber.
pub fn init_tracing() {
    let context_debug = context_debug_enabled(|key| std::env::var(key).ok());
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_directive(context_debug))),
        )
        .init();
}
