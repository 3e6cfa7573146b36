//! Single-consumer FIFO of pending saves.
//!
//! # Invariants
//! - Intents drain in enqueue order, one at a time.
//! - Each intent holds a full content snapshot (full overwrite, no patches).

use crate::model::document::Document;
use std::collections::VecDeque;

/// Snapshot captured when a user change is accepted for saving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveIntent {
    /// Editor revision the snapshot was taken at.
    pub revision: u64,
    pub content: Document,
    pub plain_text: String,
}

#[derive(Debug, Default)]
pub struct SaveQueue {
    intents: VecDeque<SaveIntent>,
}

impl SaveQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, intent: SaveIntent) {
        self.intents.push_back(intent);
    }

    pub fn next(&mut self) -> Option<SaveIntent> {
        self.intents.pop_front()
    }

    pub fn len(&self) -> usize {
        self.intents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }
}
