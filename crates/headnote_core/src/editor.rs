//! Editing surface capability and an in-memory implementation.
//!
//! # Responsibility
//! - Define what the core needs from a rich-text editor: read/replace
//!   content, read plain text, read/format one line, and change events.
//! - Tag every mutation with its `Origin`.
//!
//! # Invariants
//! - Every mutation emits exactly one `ChangeEvent` carrying its origin.
//! - Only `Origin::User` events may route into enforce-then-save.

use crate::model::document::{Attribute, Document, DocumentResult, Line};
use std::collections::VecDeque;

/// Who caused a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Typed or formatted by the person editing the note.
    User,
    /// Applied by the core itself (load, heading enforcement).
    System,
}

/// Notification emitted after each mutation of the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeEvent {
    pub origin: Origin,
    /// Surface revision after the mutation.
    pub revision: u64,
}

/// Capability the core drives; implemented by the host editor.
pub trait EditorSurface {
    fn contents(&self) -> Document;
    fn set_contents(&mut self, content: Document, origin: Origin);
    fn text(&self) -> String;
    fn line(&self, index: usize) -> Option<Line>;
    fn format_line(
        &mut self,
        index: usize,
        attribute: Attribute,
        origin: Origin,
    ) -> DocumentResult<()>;
    /// Drains change events emitted since the previous call, oldest first.
    fn take_changes(&mut self) -> Vec<ChangeEvent>;
}

/// In-memory editing surface used by the CLI and tests.
#[derive(Debug, Clone, Default)]
pub struct EditorBuffer {
    document: Document,
    revision: u64,
    pending: VecDeque<ChangeEvent>,
}

impl EditorBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Types `text` at the end of the last line as the user.
    pub fn type_text(&mut self, text: &str) {
        self.document.append_text(text);
        self.notify(Origin::User);
    }

    fn notify(&mut self, origin: Origin) {
        self.revision += 1;
        self.pending.push_back(ChangeEvent {
            origin,
            revision: self.revision,
        });
    }
}

impl EditorSurface for EditorBuffer {
    fn contents(&self) -> Document {
        self.document.clone()
    }

    fn set_contents(&mut self, content: Document, origin: Origin) {
        self.document = content.normalized();
        self.notify(origin);
    }

    fn text(&self) -> String {
        self.document.plain_text()
    }

    fn line(&self, index: usize) -> Option<Line> {
        self.document.line(index)
    }

    fn format_line(
        &mut self,
        index: usize,
        attribute: Attribute,
        origin: Origin,
    ) -> DocumentResult<()> {
        self.document.format_line(index, attribute)?;
        self.notify(origin);
        Ok(())
    }

    fn take_changes(&mut self) -> Vec<ChangeEvent> {
        self.pending.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{EditorBuffer, EditorSurface, Origin};
    use crate::model::document::{Attribute, Document, HeadingLevel};

    #[test]
    fn mutations_emit_events_tagged_with_origin() {
        let mut editor = EditorBuffer::new();
        editor.set_contents(Document::from_text("Hi"), Origin::System);
        editor.type_text(" there");
        editor
            .format_line(0, Attribute::Header(HeadingLevel::H1), Origin::System)
            .unwrap();

        let origins: Vec<Origin> = editor
            .take_changes()
            .into_iter()
            .map(|event| event.origin)
            .collect();
        assert_eq!(origins, vec![Origin::System, Origin::User, Origin::System]);
        assert!(editor.take_changes().is_empty());
        assert_eq!(editor.text(), "Hi there\n");
    }

    #[test]
    fn failed_format_does_not_emit_event() {
        let mut editor = EditorBuffer::new();
        editor.set_contents(Document::from_text("one line"), Origin::System);
        editor.take_changes();

        assert!(editor
            .format_line(5, Attribute::Blockquote, Origin::User)
            .is_err());
        assert!(editor.take_changes().is_empty());
    }
}
