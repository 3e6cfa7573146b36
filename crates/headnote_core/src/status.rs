//! One-way status sink for persistence outcomes.
//!
//! # Invariants
//! - Reporting never fails and never feeds back into persistence decisions.

use log::{info, warn};
use std::cell::RefCell;

/// Receives human-readable outcome messages.
pub trait StatusReporter {
    fn report(&self, message: &str, is_error: bool);
}

impl<R: StatusReporter + ?Sized> StatusReporter for &R {
    fn report(&self, message: &str, is_error: bool) {
        (**self).report(message, is_error)
    }
}

/// Forwards status lines to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl StatusReporter for LogReporter {
    fn report(&self, message: &str, is_error: bool) {
        if is_error {
            warn!("event=status module=status status=error message={message:?}");
        } else {
            info!("event=status module=status status=ok message={message:?}");
        }
    }
}

/// One reported status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub message: String,
    pub is_error: bool,
}

/// In-memory status history, newest last. Mirrors what a status bar shows.
#[derive(Debug, Default)]
pub struct StatusLog {
    lines: RefCell<Vec<StatusLine>>,
}

impl StatusLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// The line a status bar would currently display.
    pub fn last(&self) -> Option<StatusLine> {
        self.lines.borrow().last().cloned()
    }

    pub fn lines(&self) -> Vec<StatusLine> {
        self.lines.borrow().clone()
    }

    pub fn clear(&self) {
        self.lines.borrow_mut().clear();
    }
}

impl StatusReporter for StatusLog {
    fn report(&self, message: &str, is_error: bool) {
        self.lines.borrow_mut().push(StatusLine {
            message: message.to_string(),
            is_error,
        });
    }
}
