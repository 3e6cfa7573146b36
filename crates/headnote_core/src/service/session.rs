//! Editing session: load on open, enforce-then-save on user changes.
//!
//! # Responsibility
//! - Hand loaded (or fresh) content to the editing surface and normalize it.
//! - Turn user change events into queued save intents, one per drain.
//! - Drain the save queue sequentially through the persistence controller.
//!
//! # Invariants
//! - System-origin events never enqueue a save.
//! - The heading rule runs before every snapshot is taken.
//! - Saves are issued one at a time in event order.
//! - Events drained together produce at most one intent.

use crate::cache::ScopedStore;
use crate::editor::{EditorSurface, Origin};
use crate::heading::enforce_surface;
use crate::model::document::Document;
use crate::repo::note_repo::NoteRepository;
use crate::service::persistence::{LoadOutcome, PersistenceController, SaveOutcome};
use crate::service::save_queue::{SaveIntent, SaveQueue};
use crate::status::StatusReporter;
use log::debug;

/// One editor bound to one persisted note.
pub struct NoteSession<E, R, S, P>
where
    E: EditorSurface,
    R: NoteRepository,
    S: ScopedStore,
    P: StatusReporter,
{
    editor: E,
    controller: PersistenceController<R, S, P>,
    queue: SaveQueue,
}

impl<E, R, S, P> NoteSession<E, R, S, P>
where
    E: EditorSurface,
    R: NoteRepository,
    S: ScopedStore,
    P: StatusReporter,
{
    pub fn new(editor: E, controller: PersistenceController<R, S, P>) -> Self {
        Self {
            editor,
            controller,
            queue: SaveQueue::new(),
        }
    }

    /// Loads the note into the editor and applies the heading rule.
    ///
    /// Events emitted while opening are system events and are discarded.
    pub fn open(&mut self) -> LoadOutcome {
        let outcome = self.controller.load();
        let document = outcome.content().cloned().unwrap_or_else(Document::fresh);
        self.editor.set_contents(document, Origin::System);
        enforce_surface(&mut self.editor);
        self.editor.take_changes();
        outcome
    }

    /// Converts pending user change events into one save intent.
    ///
    /// Events drained together all describe the current surface state, so
    /// they coalesce into a single intent tagged with the newest user
    /// revision. Returns the number of intents enqueued (0 or 1).
    pub fn handle_changes(&mut self) -> usize {
        let user_revisions: Vec<u64> = self
            .editor
            .take_changes()
            .into_iter()
            .filter(|event| event.origin == Origin::User)
            .map(|event| event.revision)
            .collect();
        let Some(&revision) = user_revisions.last() else {
            return 0;
        };

        enforce_surface(&mut self.editor);
        self.editor.take_changes();
        self.queue.enqueue(SaveIntent {
            revision,
            content: self.editor.contents(),
            plain_text: self.editor.text(),
        });
        debug!(
            "event=save_enqueue module=session status=ok revision={} coalesced={} pending={}",
            revision,
            user_revisions.len(),
            self.queue.len()
        );
        1
    }

    /// Drains queued saves in order.
    pub fn flush(&mut self) -> Vec<SaveOutcome> {
        let mut outcomes = Vec::with_capacity(self.queue.len());
        while let Some(intent) = self.queue.next() {
            outcomes.push(self.controller.save(&intent.content, &intent.plain_text));
        }
        outcomes
    }

    /// Handles pending changes and drains the queue.
    pub fn pump(&mut self) -> Vec<SaveOutcome> {
        self.handle_changes();
        self.flush()
    }

    pub fn pending_saves(&self) -> usize {
        self.queue.len()
    }

    pub fn editor(&self) -> &E {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut E {
        &mut self.editor
    }

    pub fn controller(&self) -> &PersistenceController<R, S, P> {
        &self.controller
    }
}
