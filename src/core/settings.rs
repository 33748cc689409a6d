//! Bot settings service - cache-aside manager for the settings document.
//!
//! The service keeps the authoritative copy of [`BotSettings`] in memory and
//! mirrors it to a [`DocumentStore`]. Loading happens lazily and exactly once.
//! Every mutation runs the same cycle under one FIFO async lock: clone the
//! cache, apply the change to the clone, persist it, then swap it into the
//! cache. The disk write always completes before the swap, so a failed write
//! leaves the cache at its last persisted value.
//!
//! Reads ([`BotService::get_bot`]) skip the lock and return an owned copy of
//! whichever snapshot is current.

use crate::{
    core::{
        document::BotSettings,
        merge::deep_merge,
        store::{DocumentStore, JsonFileStore},
    },
    errors::{Error, Result},
};
use chrono::Utc;
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info, instrument, warn};

/// Direction of a [`BotService::set_blocked_commands`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockOperation {
    /// Put commands on the block list
    Add,
    /// Take commands off the block list
    Remove,
}

/// Concurrency-safe owner of the bot settings document.
#[derive(Debug)]
pub struct BotService<S = JsonFileStore> {
    store: S,
    cache: RwLock<Arc<BotSettings>>,
    loaded: OnceCell<()>,
    mutation_lock: Mutex<()>,
}

impl BotService<JsonFileStore> {
    /// Service persisting to the JSON file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_store(JsonFileStore::new(path))
    }
}

impl<S: DocumentStore> BotService<S> {
    /// Service on top of an arbitrary store. The cache starts at the defaults
    /// and nothing is read until the first [`load`](Self::load).
    pub fn with_store(store: S) -> Self {
        Self {
            store,
            cache: RwLock::new(Arc::new(BotSettings::default())),
            loaded: OnceCell::new(),
            mutation_lock: Mutex::new(()),
        }
    }

    /// The underlying store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Loads the settings into the cache on first call and returns a copy.
    ///
    /// Concurrent first callers share one bootstrap. A missing document is
    /// seeded with the defaults; an unreadable or invalid one is overwritten
    /// with the defaults. Only a failure to write those defaults is returned,
    /// in which case the next call tries again.
    pub async fn load(&self) -> Result<BotSettings> {
        self.loaded.get_or_try_init(|| self.bootstrap()).await?;
        Ok(self.get_bot())
    }

    #[instrument(skip(self))]
    async fn bootstrap(&self) -> Result<()> {
        self.store.ensure_directory().await?;
        let settings = match self.store.read().await {
            Ok(document) => match BotSettings::from_document(&document) {
                Ok(settings) => {
                    debug!("Loaded settings for '{}'", settings.name);
                    settings
                }
                Err(e) => {
                    warn!("Settings document is invalid, restoring defaults: {}", e);
                    self.seed_defaults().await?
                }
            },
            Err(Error::NotFound { path }) => {
                info!("No settings at {:?}, seeding defaults", path);
                self.seed_defaults().await?
            }
            Err(e) => {
                warn!("Failed to read settings, restoring defaults: {}", e);
                self.seed_defaults().await?
            }
        };
        self.swap(settings);
        Ok(())
    }

    async fn seed_defaults(&self) -> Result<BotSettings> {
        let defaults = BotSettings::default();
        self.persist(&defaults).await?;
        Ok(defaults)
    }

    /// An independent copy of the cached settings.
    ///
    /// Returns the defaults until the first [`load`](Self::load) completes.
    pub fn get_bot(&self) -> BotSettings {
        BotSettings::clone(&self.snapshot())
    }

    fn snapshot(&self) -> Arc<BotSettings> {
        Arc::clone(&self.cache.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn swap(&self, settings: BotSettings) {
        *self.cache.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(settings);
    }

    async fn persist(&self, settings: &BotSettings) -> Result<()> {
        let document = serde_json::to_value(settings)?;
        self.store.write(&document).await
    }

    /// Runs a fallible mutation through the serialized clone-apply-persist-swap cycle.
    ///
    /// If `mutator` fails nothing is written. If the write fails the cache keeps
    /// its previous value and the error is returned.
    pub async fn try_mutate<T, F>(&self, mutator: F) -> Result<T>
    where
        F: FnOnce(&mut BotSettings) -> Result<T> + Send,
        T: Send,
    {
        self.load().await?;
        let _guard = self.mutation_lock.lock().await;
        let mut working = self.get_bot();
        let output = mutator(&mut working)?;
        self.persist(&working).await?;
        self.swap(working);
        Ok(output)
    }

    /// Infallible form of [`try_mutate`](Self::try_mutate).
    pub async fn mutate<T, F>(&self, mutator: F) -> Result<T>
    where
        F: FnOnce(&mut BotSettings) -> T + Send,
        T: Send,
    {
        self.try_mutate(|settings| Ok(mutator(settings))).await
    }

    /// Rewrites the stored document as the defaults merged with the current settings.
    ///
    /// The stored document is erased before the merged one is written. A crash
    /// between the two steps leaves an empty document, which the next bootstrap
    /// reads as all defaults.
    #[instrument(skip(self))]
    pub async fn migrate(&self) -> Result<()> {
        self.load().await?;
        let _guard = self.mutation_lock.lock().await;
        let current = serde_json::to_value(self.get_bot())?;
        let merged = deep_merge(&BotSettings::default_document()?, &current);
        let migrated: BotSettings =
            serde_json::from_value(merged).map_err(|e| Error::InvariantViolation {
                message: format!("merged settings are not a valid document: {e}"),
            })?;
        self.erase().await?;
        self.persist(&migrated).await?;
        self.swap(migrated);
        info!("Settings migrated");
        Ok(())
    }

    async fn erase(&self) -> Result<()> {
        self.store.write(&Value::Object(Map::new())).await?;
        self.swap(BotSettings::default());
        Ok(())
    }

    /// Records a start: current time and the account the bot runs as.
    pub async fn start_bot(&self, host_number: impl Into<String>) -> Result<()> {
        let host_number = host_number.into();
        self.mutate(move |bot| {
            bot.started = Utc::now().timestamp_millis();
            bot.host_number = host_number;
        })
        .await
    }

    /// Changes the display name.
    pub async fn set_name(&self, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(Error::InvalidSetting {
                field: "name",
                reason: "name cannot be empty".to_string(),
            });
        }
        self.mutate(move |bot| bot.name = name).await
    }

    /// Changes the command prefix.
    pub async fn set_prefix(&self, prefix: impl Into<String>) -> Result<()> {
        let prefix = prefix.into();
        if prefix.trim().is_empty() {
            return Err(Error::InvalidSetting {
                field: "prefix",
                reason: "prefix cannot be empty".to_string(),
            });
        }
        self.mutate(move |bot| bot.prefix = prefix).await
    }

    /// Marks the startup migration as done or pending.
    pub async fn set_db_migrated(&self, status: bool) -> Result<()> {
        self.mutate(move |bot| bot.db_migrated = status).await
    }

    /// Counts one more executed command and returns the new total.
    pub async fn increment_executed_commands(&self) -> Result<u64> {
        self.mutate(|bot| {
            bot.executed_cmds = bot.executed_cmds.saturating_add(1);
            bot.executed_cmds
        })
        .await
    }

    /// Toggles automatic sticker conversion.
    pub async fn set_autosticker(&self, status: bool) -> Result<()> {
        self.mutate(move |bot| bot.autosticker = status).await
    }

    /// Toggles admin-only mode.
    pub async fn set_admin_mode(&self, status: bool) -> Result<()> {
        self.mutate(move |bot| bot.admin_mode = status).await
    }

    /// Toggles commands in private chats.
    pub async fn set_commands_pv(&self, status: bool) -> Result<()> {
        self.mutate(move |bot| bot.commands_pv = status).await
    }

    /// Replaces the rate-limit parameters as one group.
    pub async fn set_command_rate(
        &self,
        status: bool,
        max_cmds_minute: u32,
        block_time: u64,
    ) -> Result<()> {
        if max_cmds_minute == 0 {
            return Err(Error::InvalidSetting {
                field: "command_rate.max_cmds_minute",
                reason: "must be greater than zero".to_string(),
            });
        }
        if block_time == 0 {
            return Err(Error::InvalidSetting {
                field: "command_rate.block_time",
                reason: "must be greater than zero".to_string(),
            });
        }
        self.mutate(move |bot| {
            bot.command_rate.status = status;
            bot.command_rate.max_cmds_minute = max_cmds_minute;
            bot.command_rate.block_time = block_time;
        })
        .await
    }

    /// Adds commands to or removes them from the block list.
    ///
    /// `prefix` is stripped from each input before comparing. Returns the
    /// commands (re-prefixed) whose state actually changed; entries that were
    /// already blocked, or already absent, are skipped.
    pub async fn set_blocked_commands<C: AsRef<str>>(
        &self,
        prefix: &str,
        commands: &[C],
        operation: BlockOperation,
    ) -> Result<Vec<String>> {
        let names: Vec<String> = commands
            .iter()
            .map(|command| remove_prefix(prefix, command.as_ref()))
            .filter(|name| !name.is_empty())
            .collect();
        let prefix = prefix.to_string();

        self.mutate(move |bot| {
            let mut changed = Vec::new();
            for name in names {
                match operation {
                    BlockOperation::Add if !bot.is_blocked(&name) => {
                        bot.block_cmds.push(name.clone());
                        changed.push(format!("{prefix}{name}"));
                    }
                    BlockOperation::Remove if bot.is_blocked(&name) => {
                        bot.block_cmds.retain(|blocked| *blocked != name);
                        changed.push(format!("{prefix}{name}"));
                    }
                    _ => {}
                }
            }
            changed
        })
        .await
    }
}

/// Strips `prefix` from the start of `command`, if present.
#[must_use]
pub fn remove_prefix(prefix: &str, command: &str) -> String {
    let command = command.trim();
    command.strip_prefix(prefix).unwrap_or(command).to_string()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]
    use super::*;
    use crate::test_utils::{
        RecordingStore, init_test_tracing, read_persisted, setup_test_service, write_raw,
    };
    use serde_json::json;
    use std::sync::atomic::Ordering;
    use tokio::task::JoinSet;

    #[tokio::test]
    async fn test_load_creates_storage_and_defaults() -> Result<()> {
        init_test_tracing();
        let (dir, service) = setup_test_service();
        let path = dir.path().join("storage").join("bot.json");
        assert!(!path.exists());

        let loaded = service.load().await?;

        assert!(path.exists(), "bot.json should be created on first load");
        assert_eq!(read_persisted(&path)?, BotSettings::default());
        assert_eq!(loaded, BotSettings::default());
        assert_eq!(service.get_bot().name, "LBOT");
        assert_eq!(service.get_bot().prefix, "!");
        Ok(())
    }

    #[tokio::test]
    async fn test_concurrent_first_loads_bootstrap_once() -> Result<()> {
        init_test_tracing();
        let dir = tempfile::tempdir()?;
        let store = RecordingStore::new(dir.path().join("storage").join("bot.json"));
        let service = Arc::new(BotService::with_store(store));

        let mut tasks = JoinSet::new();
        for _ in 0..16 {
            let service = Arc::clone(&service);
            tasks.spawn(async move { service.load().await });
        }

        let mut observed = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            observed.push(joined.expect("load task panicked")?);
        }

        assert_eq!(service.store().writes.load(Ordering::SeqCst), 1);
        assert!(observed.iter().all(|bot| *bot == BotSettings::default()));
        Ok(())
    }

    #[tokio::test]
    async fn test_existing_document_is_loaded_without_rewrite() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("storage").join("bot.json");
        write_raw(&path, &json!({ "name": "Existing", "prefix": "#" }))?;
        let service = BotService::with_store(RecordingStore::new(&path));

        let loaded = service.load().await?;

        assert_eq!(loaded.name, "Existing");
        assert_eq!(loaded.prefix, "#");
        assert_eq!(loaded.command_rate.block_time, 60);
        assert_eq!(service.store().writes.load(Ordering::SeqCst), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_concurrent_updates_keep_cache_consistent() -> Result<()> {
        init_test_tracing();
        let (dir, service) = setup_test_service();
        service.load().await?;

        let (name, prefix, sticker, a, b, c) = tokio::join!(
            service.set_name("Concurrent"),
            service.set_prefix("$"),
            service.set_autosticker(true),
            service.increment_executed_commands(),
            service.increment_executed_commands(),
            service.increment_executed_commands(),
        );
        name?;
        prefix?;
        sticker?;
        a?;
        b?;
        c?;

        let bot = service.get_bot();
        assert_eq!(bot.name, "Concurrent");
        assert_eq!(bot.prefix, "$");
        assert!(bot.autosticker);
        assert_eq!(bot.executed_cmds, 3);
        assert_eq!(read_persisted(&dir.path().join("storage").join("bot.json"))?, bot);
        Ok(())
    }

    #[tokio::test]
    async fn test_spawned_increments_are_not_lost() -> Result<()> {
        let (_dir, service) = setup_test_service();
        let service = Arc::new(service);
        service.load().await?;

        let mut tasks = JoinSet::new();
        for _ in 0..50 {
            let service = Arc::clone(&service);
            tasks.spawn(async move { service.increment_executed_commands().await });
        }
        let mut counts = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            counts.push(joined.expect("increment task panicked")?);
        }

        assert_eq!(service.get_bot().executed_cmds, 50);
        counts.sort_unstable();
        assert_eq!(counts, (1..=50).collect::<Vec<u64>>());
        Ok(())
    }

    #[tokio::test]
    async fn test_cache_matches_disk_after_every_mutation() -> Result<()> {
        let (dir, service) = setup_test_service();
        let path = dir.path().join("storage").join("bot.json");

        service.start_bot("5511999999999").await?;
        assert_eq!(read_persisted(&path)?, service.get_bot());
        service.set_admin_mode(true).await?;
        assert_eq!(read_persisted(&path)?, service.get_bot());
        service.set_commands_pv(false).await?;
        assert_eq!(read_persisted(&path)?, service.get_bot());
        service.set_command_rate(true, 10, 120).await?;
        assert_eq!(read_persisted(&path)?, service.get_bot());
        service.set_db_migrated(false).await?;
        assert_eq!(read_persisted(&path)?, service.get_bot());
        service
            .set_blocked_commands("!", &["!sticker", "menu"], BlockOperation::Add)
            .await?;
        assert_eq!(read_persisted(&path)?, service.get_bot());

        let bot = service.get_bot();
        assert_eq!(bot.host_number, "5511999999999");
        assert!(bot.started > 0);
        assert!(bot.admin_mode);
        assert!(!bot.commands_pv);
        assert!(!bot.db_migrated);
        assert_eq!(bot.command_rate.max_cmds_minute, 10);
        assert_eq!(bot.command_rate.block_time, 120);
        Ok(())
    }

    #[tokio::test]
    async fn test_block_list_stays_unique() -> Result<()> {
        let (_dir, service) = setup_test_service();

        let added = service
            .set_blocked_commands("!", &["!sticker", "sticker", "!menu"], BlockOperation::Add)
            .await?;
        assert_eq!(added, vec!["!sticker", "!menu"]);

        let again = service
            .set_blocked_commands("!", &["sticker"], BlockOperation::Add)
            .await?;
        assert!(again.is_empty());
        assert_eq!(service.get_bot().block_cmds, vec!["sticker", "menu"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_unblocking_absent_command_is_noop() -> Result<()> {
        let (_dir, service) = setup_test_service();
        service
            .set_blocked_commands("!", &["menu"], BlockOperation::Add)
            .await?;

        let removed = service
            .set_blocked_commands("!", &["!play"], BlockOperation::Remove)
            .await?;
        assert!(removed.is_empty());

        let removed = service
            .set_blocked_commands("!", &["!menu", "menu"], BlockOperation::Remove)
            .await?;
        assert_eq!(removed, vec!["!menu"]);
        assert!(service.get_bot().block_cmds.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_blank_command_names_are_dropped() -> Result<()> {
        let (_dir, service) = setup_test_service();
        let added = service
            .set_blocked_commands("!", &["!", "  ", " !menu "], BlockOperation::Add)
            .await?;
        assert_eq!(added, vec!["!menu"]);
        assert_eq!(service.get_bot().block_cmds, vec!["menu"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_migration_preserves_overrides_and_fills_gaps() -> Result<()> {
        init_test_tracing();
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("storage").join("bot.json");
        write_raw(
            &path,
            &json!({
                "name": "Legacy",
                "block_cmds": ["legacy"],
                "command_rate": { "status": true, "max_cmds_minute": 7 },
                "db_migrated": false
            }),
        )?;
        let service = BotService::new(&path);

        service.migrate().await?;

        let bot = service.get_bot();
        assert_eq!(bot.name, "Legacy");
        assert_eq!(bot.block_cmds, vec!["legacy"]);
        assert!(bot.command_rate.status);
        assert_eq!(bot.command_rate.max_cmds_minute, 7);
        assert_eq!(bot.command_rate.block_time, 60);
        assert!(!bot.db_migrated);
        let defaults = BotSettings::default();
        assert_eq!(bot.prefix, defaults.prefix);
        assert_eq!(bot.host_number, defaults.host_number);
        assert_eq!(bot.executed_cmds, defaults.executed_cmds);
        assert_eq!(bot.commands_pv, defaults.commands_pv);

        let persisted: Value = serde_json::from_slice(&std::fs::read(&path)?)?;
        assert_eq!(persisted, serde_json::to_value(&bot)?);
        Ok(())
    }

    #[tokio::test]
    async fn test_migration_erases_before_rewriting() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("storage").join("bot.json");
        write_raw(&path, &json!({ "name": "Legacy", "db_migrated": false }))?;
        let service = BotService::with_store(RecordingStore::new(&path));

        service.migrate().await?;

        let merged = serde_json::to_value(service.get_bot())?;
        assert_eq!(merged["name"], "Legacy");
        assert_eq!(service.store().written(), vec![json!({}), merged]);
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_migration_rewrite_leaves_erased_state() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("storage").join("bot.json");
        write_raw(&path, &json!({ "name": "Legacy", "db_migrated": false }))?;
        let service = BotService::with_store(RecordingStore::new(&path));
        service.load().await?;
        service.store().fail_after_next(1);

        let result = service.migrate().await;

        assert!(matches!(result, Err(Error::Persistence { .. })));
        let on_disk: Value = serde_json::from_slice(&std::fs::read(&path)?)?;
        assert_eq!(on_disk, json!({}));
        assert_eq!(service.get_bot(), BotSettings::default());
        assert_eq!(service.store().written(), vec![json!({})]);

        // The erased file reloads as the same defaults the cache holds
        let reloaded = BotService::new(&path);
        assert_eq!(reloaded.load().await?, BotSettings::default());
        Ok(())
    }

    #[tokio::test]
    async fn test_corrupt_document_heals_to_defaults() -> Result<()> {
        init_test_tracing();
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("storage").join("bot.json");
        std::fs::create_dir_all(path.parent().unwrap())?;
        std::fs::write(&path, "{{{ definitely not json")?;
        let service = BotService::new(&path);

        let loaded = service.load().await?;

        assert_eq!(loaded, BotSettings::default());
        assert_eq!(read_persisted(&path)?, BotSettings::default());
        Ok(())
    }

    #[tokio::test]
    async fn test_wrongly_typed_document_heals_to_defaults() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("storage").join("bot.json");
        write_raw(&path, &json!({ "name": "Typed", "executed_cmds": "lots" }))?;
        let service = BotService::new(&path);

        assert_eq!(service.load().await?, BotSettings::default());
        assert_eq!(read_persisted(&path)?, BotSettings::default());
        Ok(())
    }

    #[tokio::test]
    async fn test_read_after_write() -> Result<()> {
        let (_dir, service) = setup_test_service();
        service.set_prefix("$").await?;
        assert_eq!(service.get_bot().prefix, "$");
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_write_leaves_cache_untouched() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("storage").join("bot.json");
        let service = BotService::with_store(RecordingStore::new(&path));
        service.set_name("Before").await?;

        service.store().fail_writes.store(true, Ordering::SeqCst);
        let result = service.set_name("After").await;
        assert!(matches!(result, Err(Error::Persistence { .. })));
        assert_eq!(service.get_bot().name, "Before");
        assert_eq!(read_persisted(&path)?.name, "Before");

        service.store().fail_writes.store(false, Ordering::SeqCst);
        service.set_name("After").await?;
        assert_eq!(service.get_bot().name, "After");
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_bootstrap_write_is_retried() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let store = RecordingStore::new(dir.path().join("storage").join("bot.json"));
        store.fail_writes.store(true, Ordering::SeqCst);
        let service = BotService::with_store(store);

        assert!(service.load().await.is_err());

        service.store().fail_writes.store(false, Ordering::SeqCst);
        assert_eq!(service.load().await?, BotSettings::default());
        assert_eq!(service.store().writes.load(Ordering::SeqCst), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_arguments_are_rejected_without_writing() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let service =
            BotService::with_store(RecordingStore::new(dir.path().join("storage").join("bot.json")));
        service.load().await?;

        assert!(matches!(
            service.set_prefix("  ").await,
            Err(Error::InvalidSetting { field: "prefix", .. })
        ));
        assert!(service.set_name("").await.is_err());
        assert!(service.set_command_rate(true, 0, 60).await.is_err());
        assert!(service.set_command_rate(true, 5, 0).await.is_err());
        assert_eq!(service.store().writes.load(Ordering::SeqCst), 1);
        assert_eq!(service.get_bot(), BotSettings::default());
        Ok(())
    }

    #[tokio::test]
    async fn test_get_bot_returns_independent_copy() -> Result<()> {
        let (_dir, service) = setup_test_service();
        service.load().await?;

        let mut copy = service.get_bot();
        copy.block_cmds.push("sneaky".to_string());
        copy.command_rate.status = true;
        copy.name = "Mutated".to_string();

        assert_eq!(service.get_bot(), BotSettings::default());
        Ok(())
    }

    #[test]
    fn test_remove_prefix() {
        assert_eq!(remove_prefix("!", "!sticker"), "sticker");
        assert_eq!(remove_prefix("!", "sticker"), "sticker");
        assert_eq!(remove_prefix("$$", " $$menu "), "menu");
    }
}
