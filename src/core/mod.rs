//! Core business logic - framework-agnostic settings store and command policy.

/// Command gating derived from the settings
pub mod access;
/// Settings document types and canonical defaults
pub mod document;
/// Deep merge of persisted documents onto the defaults
pub mod merge;
/// One-time startup migration
pub mod migration;
/// Per-user command rate limiting
pub mod rate_limit;
/// Cache-aside settings service
pub mod settings;
/// Durable single-document storage
pub mod store;
