#![allow(dead_code)]

use headnote_core::db::DbError;
use headnote_core::{
    CacheError, CacheResult, MemoryScopedStore, NoteId, NoteRecord, NoteRepository, RepoError,
    RepoResult, ScopedStore,
};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::io::{Error as IoError, ErrorKind};

pub const FIXED_NOW_MS: i64 = 1_760_000_000_000;

pub fn fixed_clock() -> i64 {
    FIXED_NOW_MS
}

fn unavailable(what: &str) -> IoError {
    IoError::new(ErrorKind::Other, format!("{what} unavailable"))
}

/// In-memory primary store with switchable read/write failures.
#[derive(Default)]
pub struct FlakyRepository {
    rows: RefCell<BTreeMap<NoteId, NoteRecord>>,
    pub fail_reads: Cell<bool>,
    pub fail_writes: Cell<bool>,
    pub writes: Cell<usize>,
}

impl FlakyRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let repo = Self::default();
        repo.fail_reads.set(true);
        repo.fail_writes.set(true);
        repo
    }

    pub fn insert(&self, record: NoteRecord) {
        self.rows.borrow_mut().insert(record.id, record);
    }

    pub fn row(&self, id: NoteId) -> Option<NoteRecord> {
        self.rows.borrow().get(&id).cloned()
    }
}

impl NoteRepository for FlakyRepository {
    fn put_note(&self, note: &NoteRecord) -> RepoResult<()> {
        self.writes.set(self.writes.get() + 1);
        if self.fail_writes.get() {
            return Err(RepoError::Db(DbError::Io(unavailable("primary store"))));
        }
        self.insert(note.clone());
        Ok(())
    }

    fn get_note(&self, id: NoteId) -> RepoResult<Option<NoteRecord>> {
        if self.fail_reads.get() {
            return Err(RepoError::Db(DbError::Io(unavailable("primary store"))));
        }
        Ok(self.row(id))
    }
}

/// Scoped store wrapper counting writes, with a switchable write failure.
#[derive(Default)]
pub struct FlakyScopedStore {
    pub inner: MemoryScopedStore,
    pub fail_writes: Cell<bool>,
    pub fail_reads: Cell<bool>,
    pub writes: Cell<usize>,
}

impl FlakyScopedStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_writes() -> Self {
        let store = Self::default();
        store.fail_writes.set(true);
        store
    }
}

impl ScopedStore for FlakyScopedStore {
    fn get_item(&self, key: &str) -> CacheResult<Option<String>> {
        if self.fail_reads.get() {
            return Err(CacheError::Io(unavailable("scoped store")));
        }
        self.inner.get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> CacheResult<()> {
        self.writes.set(self.writes.get() + 1);
        if self.fail_writes.get() {
            return Err(CacheError::QuotaExceeded {
                needed: value.len(),
                quota: 0,
            });
        }
        self.inner.set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> CacheResult<()> {
        self.inner.remove_item(key)
    }
}
