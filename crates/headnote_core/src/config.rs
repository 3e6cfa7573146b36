//! Storage configuration for one note session.
//!
//! # Responsibility
//! - Name the note identity, database file, and recovery slot in one place.
//! - Open the configured primary store connection and scoped store.
//! - Degrade a recovery slot that cannot be opened instead of failing.
//!
//! # Invariants
//! - The note identity is an explicit value, never a hidden global.
//! - The recovery key is valid for every scoped store implementation.

use crate::cache::scoped_store::is_valid_key;
use crate::cache::{
    CacheError, CacheResult, FallbackCache, FileScopedStore, ScopedStore, UnavailableScopedStore,
};
use crate::db::{open_db, DbResult};
use crate::model::note::{NoteId, SINGLETON_NOTE_ID};
use crate::service::persistence::DEFAULT_STALE_CACHE_THRESHOLD;
use log::error;
use rusqlite::Connection;
use std::path::{Path, PathBuf};

pub const DB_FILE_NAME: &str = "headnote.sqlite3";
pub const CACHE_DIR_NAME: &str = "recovery";
pub const DEFAULT_CACHE_KEY: &str = "headnote_recovery_note_content";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub note_id: NoteId,
    pub db_path: PathBuf,
    pub cache_dir: PathBuf,
    pub cache_key: String,
    /// Consecutive cache mirror failures before a staleness warning.
    pub stale_cache_threshold: u32,
}

impl CoreConfig {
    /// Default layout under `data_dir`: `headnote.sqlite3` plus `recovery/`.
    pub fn for_data_dir(data_dir: impl AsRef<Path>) -> Self {
        let data_dir = data_dir.as_ref();
        Self {
            note_id: SINGLETON_NOTE_ID,
            db_path: data_dir.join(DB_FILE_NAME),
            cache_dir: data_dir.join(CACHE_DIR_NAME),
            cache_key: DEFAULT_CACHE_KEY.to_string(),
            stale_cache_threshold: DEFAULT_STALE_CACHE_THRESHOLD,
        }
    }

    pub fn with_note_id(mut self, note_id: NoteId) -> Self {
        self.note_id = note_id;
        self
    }

    /// Opens the primary store database with migrations applied.
    pub fn open_primary(&self) -> DbResult<Connection> {
        open_db(&self.db_path)
    }

    /// Opens the recovery slot in `cache_dir`.
    ///
    /// # Errors
    /// - `InvalidKey` when `cache_key` is not a valid scoped store key.
    /// - `Io` when the cache directory cannot be created.
    pub fn open_fallback(&self) -> CacheResult<FallbackCache<FileScopedStore>> {
        let store = self.open_cache_store()?;
        Ok(FallbackCache::new(store, self.cache_key.as_str()))
    }

    /// Opens the recovery slot, or one whose every access reports the open
    /// failure, so primary store calls still run.
    pub fn fallback_cache(&self) -> FallbackCache<Box<dyn ScopedStore>> {
        let store: Box<dyn ScopedStore> = match self.open_cache_store() {
            Ok(store) => Box::new(store),
            Err(err) => {
                error!("event=cache_open module=config status=error error={err}");
                Box::new(UnavailableScopedStore::new(err.to_string()))
            }
        };
        FallbackCache::new(store, self.cache_key.as_str())
    }

    fn open_cache_store(&self) -> CacheResult<FileScopedStore> {
        if !is_valid_key(&self.cache_key) {
            return Err(CacheError::InvalidKey(self.cache_key.clone()));
        }
        FileScopedStore::open(&self.cache_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::{CoreConfig, DB_FILE_NAME, DEFAULT_CACHE_KEY};
    use crate::cache::CacheError;
    use crate::model::note::SINGLETON_NOTE_ID;
    use std::path::Path;

    #[test]
    fn for_data_dir_uses_default_layout() {
        let config = CoreConfig::for_data_dir("/var/lib/headnote");
        assert_eq!(config.note_id, SINGLETON_NOTE_ID);
        assert_eq!(
            config.db_path,
            Path::new("/var/lib/headnote").join(DB_FILE_NAME)
        );
        assert_eq!(config.cache_key, DEFAULT_CACHE_KEY);
    }

    #[test]
    fn open_fallback_rejects_invalid_key() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = CoreConfig::for_data_dir(dir.path());
        config.cache_key = "../outside".to_string();

        let err = config.open_fallback().unwrap_err();
        assert!(matches!(err, CacheError::InvalidKey(_)));
    }

    #[test]
    fn fallback_cache_degrades_when_cache_dir_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = CoreConfig::for_data_dir(dir.path());
        std::fs::write(&config.cache_dir, b"not a directory").unwrap();

        let cache = config.fallback_cache();

        assert!(matches!(cache.read(), Err(CacheError::Unavailable(_))));
    }
}
