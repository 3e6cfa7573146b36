//! Fixed-key recovery slot holding serialized note content.
//!
//! # Responsibility
//! - Mirror the latest content into a scoped store (`put`).
//! - Recover content from that slot, discarding malformed entries (`read`).
//!
//! # Invariants
//! - The slot holds content JSON only: no title, no timestamp.
//! - Every `put` overwrites the slot; the cache never keeps history.
//! - A malformed entry is removed before `read` returns.

use super::{CacheError, CacheResult, ScopedStore};
use crate::model::document::Document;
use log::{error, warn};

/// Outcome of reading the recovery slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheRead {
    /// No entry under the key.
    Absent,
    /// Entry decoded into a document.
    Recovered(Document),
    /// Entry was not a document; it was removed when `cleared` is true.
    Discarded { reason: String, cleared: bool },
}

/// Recovery slot stored under one fixed key of a [`ScopedStore`].
#[derive(Debug)]
pub struct FallbackCache<S: ScopedStore> {
    store: S,
    key: String,
}

impl<S: ScopedStore> FallbackCache<S> {
    pub fn new(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Serializes `content` and overwrites the slot.
    pub fn put(&self, content: &Document) -> CacheResult<()> {
        let json = serde_json::to_string(content).map_err(CacheError::Serialize)?;
        self.store.set_item(&self.key, &json)
    }

    /// Reads the slot, returning `None` for a missing or malformed entry.
    pub fn get(&self) -> CacheResult<Option<Document>> {
        match self.read()? {
            CacheRead::Recovered(document) => Ok(Some(document)),
            CacheRead::Absent | CacheRead::Discarded { .. } => Ok(None),
        }
    }

    /// Reads the slot and reports which of the three outcomes occurred.
    ///
    /// # Errors
    /// - Returns the scoped store error when the slot cannot be read at all.
    pub fn read(&self) -> CacheResult<CacheRead> {
        let raw = match self.store.get_item(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Ok(CacheRead::Absent),
            Err(CacheError::Undecodable { reason, .. }) => {
                warn!("event=cache_read module=cache status=malformed error={reason}");
                return Ok(self.discard(reason));
            }
            Err(err) => return Err(err),
        };

        match serde_json::from_str::<Document>(&raw) {
            Ok(document) => Ok(CacheRead::Recovered(document)),
            Err(parse_err) => {
                warn!(
                    "event=cache_read module=cache status=malformed bytes={} error={}",
                    raw.len(),
                    parse_err
                );
                Ok(self.discard(parse_err.to_string()))
            }
        }
    }

    fn discard(&self, reason: String) -> CacheRead {
        let cleared = match self.store.remove_item(&self.key) {
            Ok(()) => true,
            Err(remove_err) => {
                error!(
                    "event=cache_clear module=cache status=error error={}",
                    remove_err
                );
                false
            }
        };
        CacheRead::Discarded { reason, cleared }
    }

    /// Removes the slot.
    pub fn clear(&self) -> CacheResult<()> {
        self.store.remove_item(&self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::{CacheRead, FallbackCache};
    use crate::cache::{FileScopedStore, MemoryScopedStore, ScopedStore};
    use crate::model::document::Document;

    #[test]
    fn put_stores_content_json_only() {
        let cache = FallbackCache::new(MemoryScopedStore::new(), "slot");
        cache.put(&Document::from_text("Title\nbody")).unwrap();

        let raw = cache.store().get_item("slot").unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value, serde_json::json!({"ops": [{"insert": "Title\nbody\n"}]}));
    }

    #[test]
    fn read_discards_malformed_entry() {
        let cache = FallbackCache::new(MemoryScopedStore::new(), "slot");
        cache.store().set_item("slot", "{not valid json").unwrap();

        let read = cache.read().unwrap();
        assert!(matches!(read, CacheRead::Discarded { cleared: true, .. }));
        assert_eq!(cache.store().get_item("slot").unwrap(), None);
        assert_eq!(cache.read().unwrap(), CacheRead::Absent);
    }

    #[test]
    fn read_discards_non_utf8_file_entry() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FallbackCache::new(FileScopedStore::open(dir.path()).unwrap(), "slot");
        let entry = dir.path().join("slot.entry");
        std::fs::write(&entry, [0xff, 0xfe, b'{']).unwrap();

        let read = cache.read().unwrap();

        assert!(matches!(read, CacheRead::Discarded { cleared: true, .. }));
        assert!(!entry.exists());
        assert_eq!(cache.read().unwrap(), CacheRead::Absent);
    }
}
