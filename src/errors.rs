//! Unified error types and result handling.

use std::path::PathBuf;
use thiserror::Error;

/// Every failure the bot and its settings store can report.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration file or environment problems
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// The durable store holds no settings document yet
    #[error("Settings document not found at {path:?}")]
    NotFound {
        /// Location that was read
        path: PathBuf,
    },

    /// The settings file exists but cannot be turned into a settings document
    #[error("Settings document at {path:?} is corrupt: {source}")]
    CorruptDocument {
        /// Location of the corrupt file
        path: PathBuf,
        /// Parser or shape error
        source: serde_json::Error,
    },

    /// Writing the settings document (or its directory) failed
    #[error("Failed to persist settings to {path:?}: {source}")]
    Persistence {
        /// Location that could not be written
        path: PathBuf,
        /// Underlying I/O failure
        source: std::io::Error,
    },

    /// A merge produced something that is not a valid settings document
    #[error("Settings invariant violated: {message}")]
    InvariantViolation {
        /// Description of the violated invariant
        message: String,
    },

    /// A mutator received an argument it refuses to store
    #[error("Invalid value for `{field}`: {reason}")]
    InvalidSetting {
        /// Settings field being changed
        field: &'static str,
        /// Why the value was rejected
        reason: String,
    },

    /// Generic I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Missing or unreadable environment variable
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// Serenity/Poise framework error
    #[error("Serenity/Poise framework error: {0}")]
    Framework(Box<poise::serenity_prelude::Error>),
}

impl From<poise::serenity_prelude::Error> for Error {
    fn from(value: poise::serenity_prelude::Error) -> Self {
        Self::Framework(Box::new(value))
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
