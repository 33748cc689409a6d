//! Application configuration from `config.toml` and the environment.
//!
//! The file is optional; without it the defaults apply. Environment variables
//! override whatever the file sets:
//!
//! * `BOT_STORAGE_PATH` - location of the settings document
//! * `BOT_ADMIN_IDS` - comma-separated user IDs allowed to run admin commands

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default location of the settings document, relative to the working directory.
pub const DEFAULT_STORAGE_PATH: &str = "storage/bot.json";

/// Resolved application configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Where the bot settings document lives
    pub storage_path: PathBuf,
    /// Users allowed to run admin commands
    pub admin_ids: Vec<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage_path: PathBuf::from(DEFAULT_STORAGE_PATH),
            admin_ids: Vec::new(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    bot: BotSection,
}

#[derive(Debug, Default, Deserialize)]
struct BotSection {
    storage_path: Option<PathBuf>,
    #[serde(default)]
    admin_ids: Vec<u64>,
}

impl AppConfig {
    /// Loads `path` if it exists, then applies environment overrides.
    ///
    /// # Errors
    /// Returns `Error::Config` if the file cannot be read or parsed, or an
    /// override has an invalid value.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file_config = if path.exists() {
            tracing::debug!("Loading configuration from {:?}", path);
            let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
                message: format!("Failed to read config file {path:?}: {e}"),
            })?;
            Self::from_toml(&contents)?
        } else {
            tracing::debug!("No config file at {:?}, using defaults", path);
            Self::default()
        };
        file_config.with_overrides(|key| std::env::var(key).ok())
    }

    /// Parses the `[bot]` table of a TOML document.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(contents).map_err(|e| Error::Config {
            message: format!("Failed to parse config.toml: {e}"),
        })?;
        Ok(Self {
            storage_path: file
                .bot
                .storage_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STORAGE_PATH)),
            admin_ids: file.bot.admin_ids,
        })
    }

    /// Applies overrides looked up through `lookup` (normally the process environment).
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("BOT_STORAGE_PATH").filter(|p| !p.trim().is_empty()) {
            self.storage_path = PathBuf::from(path.trim());
        }
        if let Some(ids) = lookup("BOT_ADMIN_IDS") {
            self.admin_ids = parse_admin_ids(&ids)?;
        }
        Ok(self)
    }

    /// Whether `user_id` may run admin commands.
    #[must_use]
    pub fn is_admin(&self, user_id: u64) -> bool {
        self.admin_ids.contains(&user_id)
    }
}

fn parse_admin_ids(raw: &str) -> Result<Vec<u64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(|id| {
            id.parse::<u64>().map_err(|e| Error::Config {
                message: format!("Invalid user ID '{id}' in BOT_ADMIN_IDS: {e}"),
            })
        })
        .collect()
}
