//! The bot settings document and its canonical defaults.
//!
//! A single [`BotSettings`] value exists per process. Its [`Default`] impl is the
//! canonical schema: it seeds fresh installs, it is the base side of every
//! migration merge, and it fills in fields an older file on disk does not have.

use crate::core::merge::deep_merge;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Bot-wide settings persisted as one JSON document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotSettings {
    /// Milliseconds since the Unix epoch of the last start, 0 if never started
    pub started: i64,
    /// Identifier of the account the bot runs as, empty until first start
    pub host_number: String,
    /// Display name
    pub name: String,
    /// Prefix recognizing commands in chat messages
    pub prefix: String,
    /// Number of commands executed so far
    pub executed_cmds: u64,
    /// Whether the one-time startup migration has completed
    pub db_migrated: bool,
    /// Turn every media message into a sticker
    pub autosticker: bool,
    /// Accept commands in private chats
    pub commands_pv: bool,
    /// Only admins may run commands
    pub admin_mode: bool,
    /// Command names (without prefix) nobody but admins may run
    pub block_cmds: Vec<String>,
    /// Per-user command rate limiting
    pub command_rate: CommandRate,
}

/// Rate-limit parameters nested inside [`BotSettings`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandRate {
    /// Whether rate limiting is enforced
    pub status: bool,
    /// Commands a user may run within one minute
    pub max_cmds_minute: u32,
    /// Seconds a user stays blocked after exceeding the limit
    pub block_time: u64,
}

impl Default for CommandRate {
    fn default() -> Self {
        Self {
            status: false,
            max_cmds_minute: 5,
            block_time: 60,
        }
    }
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            started: 0,
            host_number: String::new(),
            name: "LBOT".to_string(),
            prefix: "!".to_string(),
            executed_cmds: 0,
            db_migrated: true,
            autosticker: false,
            commands_pv: true,
            admin_mode: false,
            block_cmds: Vec::new(),
            command_rate: CommandRate::default(),
        }
    }
}

impl BotSettings {
    /// The default settings as a JSON document, the base side of every merge.
    pub fn default_document() -> serde_json::Result<Value> {
        serde_json::to_value(Self::default())
    }

    /// Builds settings from a document read off disk.
    ///
    /// Fields missing from `document` take their default value and unknown
    /// fields are dropped. Fails when the document is not a JSON object or a
    /// present field has the wrong type.
    pub fn from_document(document: &Value) -> serde_json::Result<Self> {
        if !document.is_object() {
            return Err(<serde_json::Error as serde::de::Error>::custom(
                "settings document must be a JSON object",
            ));
        }
        let merged = deep_merge(&Self::default_document()?, document);
        serde_json::from_value(merged)
    }

    /// When the bot was last started, if ever.
    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        if self.started == 0 {
            return None;
        }
        DateTime::from_timestamp_millis(self.started)
    }

    /// Whether `command` (without prefix) is on the block list.
    #[must_use]
    pub fn is_blocked(&self, command: &str) -> bool {
        self.block_cmds.iter().any(|blocked| blocked == command)
    }
}
