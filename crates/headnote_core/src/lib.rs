//! Core persistence and first-line heading logic for HeadNote.
//! This crate is the single source of truth for note invariants.

pub mod cache;
pub mod config;
pub mod db;
pub mod editor;
pub mod error;
pub mod heading;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod status;

pub use cache::{
    CacheError, CacheRead, CacheResult, FallbackCache, FileScopedStore, MemoryScopedStore,
    ScopedStore, UnavailableScopedStore,
};
pub use config::CoreConfig;
pub use editor::{ChangeEvent, EditorBuffer, EditorSurface, Origin};
pub use error::PersistenceError;
pub use heading::{enforce, enforce_surface};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::document::{
    Attribute, AttributeKind, AttributeSet, Document, DocumentError, Embed, HeadingLevel, Insert,
    Line, ListKind, Op,
};
pub use model::note::{NoteId, NoteRecord, SINGLETON_NOTE_ID};
pub use repo::note_repo::{
    primary_repository, NoteRepository, RepoError, RepoResult, SqliteNoteRepository,
    UnavailableNoteRepository,
};
pub use service::persistence::{LoadOutcome, PersistenceController, SaveOutcome};
pub use service::session::NoteSession;
pub use status::{LogReporter, StatusLine, StatusLog, StatusReporter};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
