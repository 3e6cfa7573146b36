//! String-keyed scoped stores backing the fallback cache.
//!
//! # Responsibility
//! - Define the minimal get/set/remove contract of a scoped key/value store.
//! - Provide a directory-backed store and an in-memory store.
//! - Stand in for a store that failed to open, so callers still run.
//!
//! # Invariants
//! - Keys are validated before they touch the filesystem.
//! - File writes are atomic: readers see the old or the new value, never a
//!   partial one.
//! - Non-UTF-8 entries surface as `CacheError::Undecodable`, never as I/O
//!   failures.

use super::{CacheError, CacheResult};
use once_cell::sync::Lazy;
use regex::Regex;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

const ENTRY_EXTENSION: &str = "entry";

static KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.-]{0,127}$").expect("valid key regex"));

/// Scoped string key/value store.
pub trait ScopedStore {
    fn get_item(&self, key: &str) -> CacheResult<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> CacheResult<()>;
    /// Removes `key`; removing a missing key is not an error.
    fn remove_item(&self, key: &str) -> CacheResult<()>;
}

impl<S: ScopedStore + ?Sized> ScopedStore for &S {
    fn get_item(&self, key: &str) -> CacheResult<Option<String>> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> CacheResult<()> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> CacheResult<()> {
        (**self).remove_item(key)
    }
}

impl<S: ScopedStore + ?Sized> ScopedStore for Box<S> {
    fn get_item(&self, key: &str) -> CacheResult<Option<String>> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> CacheResult<()> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> CacheResult<()> {
        (**self).remove_item(key)
    }
}

/// Returns whether `key` is usable by every scoped store implementation.
pub fn is_valid_key(key: &str) -> bool {
    KEY_RE.is_match(key)
}

fn validate_key(key: &str) -> CacheResult<()> {
    if is_valid_key(key) {
        Ok(())
    } else {
        Err(CacheError::InvalidKey(key.to_string()))
    }
}

/// Scoped store keeping one file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileScopedStore {
    root: PathBuf,
}

impl FileScopedStore {
    /// Opens the store rooted at `root`, creating the directory if missing.
    pub fn open(root: impl AsRef<Path>) -> CacheResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, key: &str) -> CacheResult<PathBuf> {
        validate_key(key)?;
        Ok(self.root.join(format!("{key}.{ENTRY_EXTENSION}")))
    }
}

impl ScopedStore for FileScopedStore {
    fn get_item(&self, key: &str) -> CacheResult<Option<String>> {
        let path = self.entry_path(key)?;
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        String::from_utf8(bytes)
            .map(Some)
            .map_err(|err| CacheError::Undecodable {
                key: key.to_string(),
                reason: err.utf8_error().to_string(),
            })
    }

    fn set_item(&self, key: &str, value: &str) -> CacheResult<()> {
        let path = self.entry_path(key)?;
        let mut tmp = NamedTempFile::new_in(&self.root)?;
        tmp.write_all(value.as_bytes())?;
        tmp.persist(&path).map_err(|err| CacheError::Io(err.error))?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> CacheResult<()> {
        let path = self.entry_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// In-memory scoped store with an optional byte quota.
///
/// The quota counts the UTF-8 length of all keys and values, so callers can
/// reproduce "quota exceeded" failures without touching disk.
#[derive(Debug, Default)]
pub struct MemoryScopedStore {
    entries: RefCell<BTreeMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl MemoryScopedStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            entries: RefCell::default(),
            quota_bytes: Some(quota_bytes),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl ScopedStore for MemoryScopedStore {
    fn get_item(&self, key: &str) -> CacheResult<Option<String>> {
        validate_key(key)?;
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> CacheResult<()> {
        validate_key(key)?;
        let mut entries = self.entries.borrow_mut();
        if let Some(quota) = self.quota_bytes {
            let others: usize = entries
                .iter()
                .filter(|(existing, _)| existing.as_str() != key)
                .map(|(existing, stored)| existing.len() + stored.len())
                .sum();
            let needed = others + key.len() + value.len();
            if needed > quota {
                return Err(CacheError::QuotaExceeded { needed, quota });
            }
        }
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> CacheResult<()> {
        validate_key(key)?;
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

/// Store that failed to open; every call returns the open failure.
#[derive(Debug, Clone)]
pub struct UnavailableScopedStore {
    reason: String,
}

impl UnavailableScopedStore {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    fn error(&self) -> CacheError {
        CacheError::Unavailable(self.reason.clone())
    }
}

impl ScopedStore for UnavailableScopedStore {
    fn get_item(&self, _key: &str) -> CacheResult<Option<String>> {
        Err(self.error())
    }

    fn set_item(&self, _key: &str, _value: &str) -> CacheResult<()> {
        Err(self.error())
    }

    fn remove_item(&self, _key: &str) -> CacheResult<()> {
        Err(self.error())
    }
}

#[cfg(test)]
mod tests {
    use super::{
        is_valid_key, FileScopedStore, MemoryScopedStore, ScopedStore, UnavailableScopedStore,
    };
    use crate::cache::CacheError;

    #[test]
    fn key_validation_rejects_path_like_keys() {
        assert!(is_valid_key("headnote_recovery_note_content"));
        assert!(!is_valid_key(""));
        assert!(!is_valid_key("../escape"));
        assert!(!is_valid_key("nested/key"));
        assert!(!is_valid_key(".hidden"));
    }

    #[test]
    fn file_store_overwrites_and_removes_entries() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileScopedStore::open(dir.path().join("recovery")).unwrap();

        assert_eq!(store.get_item("slot").unwrap(), None);
        store.set_item("slot", "first").unwrap();
        store.set_item("slot", "second").unwrap();
        assert_eq!(store.get_item("slot").unwrap().as_deref(), Some("second"));

        store.remove_item("slot").unwrap();
        store.remove_item("slot").unwrap();
        assert_eq!(store.get_item("slot").unwrap(), None);
    }

    #[test]
    fn file_store_reports_non_utf8_entry_as_undecodable() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileScopedStore::open(dir.path()).unwrap();
        std::fs::write(dir.path().join("slot.entry"), [0xff, 0xfe, b'{']).unwrap();

        let err = store.get_item("slot").unwrap_err();
        assert!(matches!(err, CacheError::Undecodable { ref key, .. } if key == "slot"));
    }

    #[test]
    fn unavailable_store_fails_every_call() {
        let store = UnavailableScopedStore::new("recovery dir is a file");

        assert!(matches!(
            store.get_item("slot"),
            Err(CacheError::Unavailable(_))
        ));
        assert!(store.set_item("slot", "x").is_err());
        assert!(store.remove_item("slot").is_err());
    }

    #[test]
    fn file_store_rejects_invalid_keys_before_io() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileScopedStore::open(dir.path()).unwrap();

        let err = store.set_item("../outside", "value").unwrap_err();
        assert!(matches!(err, CacheError::InvalidKey(_)));
    }

    #[test]
    fn memory_store_enforces_quota_excluding_replaced_value() {
        let store = MemoryScopedStore::with_quota(12);
        store.set_item("key", "123456789").unwrap();
        store.set_item("key", "abcdefghi").unwrap();

        let err = store.set_item("key", "0123456789").unwrap_err();
        assert!(matches!(
            err,
            CacheError::QuotaExceeded {
                needed: 13,
                quota: 12
            }
        ));
        assert_eq!(store.get_item("key").unwrap().as_deref(), Some("abcdefghi"));
    }
}
