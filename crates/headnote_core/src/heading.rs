//! First-line heading rule.
//!
//! # Responsibility
//! - Keep line 0 formatted as heading level 1 whenever it has visible text.
//!
//! # Invariants
//! - Enforcement is idempotent: a second pass never changes anything.
//! - An empty or whitespace-only first line is left untouched.
//! - Surface edits are tagged `Origin::System` and never count as user edits.

use crate::editor::{EditorSurface, Origin};
use crate::model::document::{Attribute, Document, HeadingLevel, Line};
use log::{debug, error};

const TITLE_LINE: usize = 0;

/// Returns whether `line` violates the first-line heading rule.
pub fn needs_heading(line: &Line) -> bool {
    !line.text.trim().is_empty() && line.formats.header() != Some(HeadingLevel::H1)
}

/// Applies the heading rule to a detached document.
///
/// Returns `true` when line 0 was reformatted.
pub fn enforce(document: &mut Document) -> bool {
    let Some(line) = document.line(TITLE_LINE) else {
        return false;
    };
    if !needs_heading(&line) {
        return false;
    }

    match document.format_line(TITLE_LINE, Attribute::Header(HeadingLevel::H1)) {
        Ok(()) => true,
        Err(err) => {
            error!("event=heading_enforce module=heading status=error error={err}");
            false
        }
    }
}

/// Applies the heading rule through an editing surface.
///
/// Returns `true` when line 0 was reformatted.
pub fn enforce_surface<E: EditorSurface + ?Sized>(surface: &mut E) -> bool {
    let Some(line) = surface.line(TITLE_LINE) else {
        return false;
    };
    if !needs_heading(&line) {
        return false;
    }

    match surface.format_line(
        TITLE_LINE,
        Attribute::Header(HeadingLevel::H1),
        Origin::System,
    ) {
        Ok(()) => {
            debug!("event=heading_enforce module=heading status=ok changed=true");
            true
        }
        Err(err) => {
            error!("event=heading_enforce module=heading status=error error={err}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{enforce, needs_heading};
    use crate::model::document::{Attribute, AttributeSet, Document, HeadingLevel, Line};

    fn line(text: &str, formats: AttributeSet) -> Line {
        Line {
            index: 0,
            text: text.to_string(),
            formats,
        }
    }

    #[test]
    fn blank_first_line_never_needs_heading() {
        assert!(!needs_heading(&line("", AttributeSet::new())));
        assert!(!needs_heading(&line(" \t ", AttributeSet::new())));
    }

    #[test]
    fn lower_heading_level_is_promoted() {
        let formats = AttributeSet::from_iter([Attribute::Header(HeadingLevel::H3)]);
        assert!(needs_heading(&line("Title", formats)));
    }

    #[test]
    fn enforce_reports_change_once() {
        let mut doc = Document::from_text("Title\nBody");
        assert!(enforce(&mut doc));
        assert!(!enforce(&mut doc));
        assert_eq!(
            doc.line(0).unwrap().formats.header(),
            Some(HeadingLevel::H1)
        );
        assert_eq!(doc.line(1).unwrap().formats.header(), None);
    }
}
