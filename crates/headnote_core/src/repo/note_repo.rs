//! Primary note store contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist full note records keyed by `NoteId` (upsert semantics).
//! - Keep SQL and JSON column encoding inside the persistence boundary.
//! - Keep the store callable when its database failed to open.
//!
//! # Invariants
//! - One row per `NoteId`; `put_note` overwrites the whole record.
//! - Read paths reject undecodable persisted content instead of masking it.
//! - A row with a null `content` column is returned with `content = None`.

use crate::db::{DbError, DbResult};
use crate::model::document::Document;
use crate::model::note::{NoteId, NoteRecord};
use rusqlite::{params, Connection, OptionalExtension};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type RepoResult<T> = Result<T, RepoError>;

/// Error for primary store reads and writes.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    InvalidData(String),
    /// The database could not be opened; every call reports this.
    Unavailable(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted note data: {message}"),
            Self::Unavailable(reason) => write!(f, "note store unavailable: {reason}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidData(_) | Self::Unavailable(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Durable record store consulted first on load and written first on save.
pub trait NoteRepository {
    /// Inserts or fully replaces the record for `note.id`.
    fn put_note(&self, note: &NoteRecord) -> RepoResult<()>;
    /// Reads the record for `id`, `None` when no row exists.
    fn get_note(&self, id: NoteId) -> RepoResult<Option<NoteRecord>>;
}

impl<R: NoteRepository + ?Sized> NoteRepository for &R {
    fn put_note(&self, note: &NoteRecord) -> RepoResult<()> {
        (**self).put_note(note)
    }

    fn get_note(&self, id: NoteId) -> RepoResult<Option<NoteRecord>> {
        (**self).get_note(id)
    }
}

impl<R: NoteRepository + ?Sized> NoteRepository for Box<R> {
    fn put_note(&self, note: &NoteRecord) -> RepoResult<()> {
        (**self).put_note(note)
    }

    fn get_note(&self, id: NoteId) -> RepoResult<Option<NoteRecord>> {
        (**self).get_note(id)
    }
}

/// Returns a SQLite repository over `opened`, or one that reports the open
/// failure on every call.
pub fn primary_repository(opened: &DbResult<Connection>) -> Box<dyn NoteRepository + '_> {
    match opened {
        Ok(conn) => Box::new(SqliteNoteRepository::new(conn)),
        Err(err) => Box::new(UnavailableNoteRepository::new(err.to_string())),
    }
}

/// Primary store whose database failed to open.
#[derive(Debug, Clone)]
pub struct UnavailableNoteRepository {
    reason: String,
}

impl UnavailableNoteRepository {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl NoteRepository for UnavailableNoteRepository {
    fn put_note(&self, _note: &NoteRecord) -> RepoResult<()> {
        Err(RepoError::Unavailable(self.reason.clone()))
    }

    fn get_note(&self, _id: NoteId) -> RepoResult<Option<NoteRecord>> {
        Err(RepoError::Unavailable(self.reason.clone()))
    }
}

/// SQLite-backed primary note store.
pub struct SqliteNoteRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNoteRepository<'conn> {
    /// Wraps a connection returned by `open_db` / `open_db_in_memory`.
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl NoteRepository for SqliteNoteRepository<'_> {
    fn put_note(&self, note: &NoteRecord) -> RepoResult<()> {
        let content = note
            .content
            .as_ref()
            .map(encode_content)
            .transpose()?;

        self.conn.execute(
            "INSERT INTO notes (id, title, content, last_modified)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                content = excluded.content,
                last_modified = excluded.last_modified;",
            params![
                note.id.to_string(),
                note.title.as_str(),
                content,
                note.last_modified,
            ],
        )?;

        Ok(())
    }

    fn get_note(&self, id: NoteId) -> RepoResult<Option<NoteRecord>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, title, content, last_modified
                 FROM notes
                 WHERE id = ?1;",
                [id.to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>("id")?,
                        row.get::<_, String>("title")?,
                        row.get::<_, Option<String>>("content")?,
                        row.get::<_, i64>("last_modified")?,
                    ))
                },
            )
            .optional()?;

        let Some((id_text, title, content, last_modified)) = row else {
            return Ok(None);
        };

        let id = Uuid::parse_str(&id_text).map_err(|_| {
            RepoError::InvalidData(format!("invalid note id `{id_text}` in notes.id"))
        })?;
        let content = content.as_deref().map(decode_content).transpose()?;

        Ok(Some(NoteRecord {
            id,
            title,
            content,
            last_modified,
        }))
    }
}

fn encode_content(content: &Document) -> RepoResult<String> {
    serde_json::to_string(content)
        .map_err(|err| RepoError::InvalidData(format!("content is not serializable: {err}")))
}

fn decode_content(raw: &str) -> RepoResult<Document> {
    serde_json::from_str(raw)
        .map_err(|err| RepoError::InvalidData(format!("notes.content is not a document: {err}")))
}
