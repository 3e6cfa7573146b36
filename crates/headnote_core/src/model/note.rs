//! Persisted note record.
//!
//! # Responsibility
//! - Define the record shape written to the primary store.
//! - Provide the fixed singleton identity.
//!
//! # Invariants
//! - `title` always equals `derive_title(content.plain_text())` for records
//!   built through [`NoteRecord::from_content`].
//! - `last_modified` is set by the writer at save time, never by the editor.

use crate::model::document::{derive_title, Document};
use uuid::Uuid;

/// Stable identifier of the persisted note.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type NoteId = Uuid;

/// Identity of the one note managed by this core.
pub const SINGLETON_NOTE_ID: NoteId = Uuid::from_u128(1);

/// Full record stored under one [`NoteId`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteRecord {
    pub id: NoteId,
    /// Trimmed first line of `content`.
    pub title: String,
    /// `None` when a row exists but its content column is null.
    pub content: Option<Document>,
    /// Unix epoch milliseconds of the last successful write.
    pub last_modified: i64,
}

impl NoteRecord {
    /// Builds a record for `content`, deriving the title from `plain_text`.
    ///
    /// `plain_text` is what the editing surface reports for `content`; the
    /// title is taken from it rather than re-rendered here.
    pub fn from_content(
        id: NoteId,
        content: Document,
        plain_text: &str,
        last_modified: i64,
    ) -> Self {
        Self {
            id,
            title: derive_title(plain_text),
            content: Some(content),
            last_modified,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{NoteRecord, SINGLETON_NOTE_ID};
    use crate::model::document::Document;

    #[test]
    fn singleton_id_is_fixed_and_not_nil() {
        assert!(!SINGLETON_NOTE_ID.is_nil());
        assert_eq!(
            SINGLETON_NOTE_ID.to_string(),
            "00000000-0000-0000-0000-000000000001"
        );
    }

    #[test]
    fn from_content_derives_title_from_plain_text() {
        let content = Document::from_text("  Shopping list \neggs\n");
        let record = NoteRecord::from_content(
            SINGLETON_NOTE_ID,
            content.clone(),
            &content.plain_text(),
            42,
        );
        assert_eq!(record.title, "Shopping list");
        assert_eq!(record.content, Some(content));
        assert_eq!(record.last_modified, 42);
    }
}
