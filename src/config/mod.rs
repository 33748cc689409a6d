/// Application configuration from config.toml and environment variables
pub mod app;

/// Tracing subscriber setup
pub mod logging;

pub use app::AppConfig;
