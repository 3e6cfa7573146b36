//! Domain model for the single persisted note.
//!
//! # Responsibility
//! - Define the structured document exchanged with the editing surface.
//! - Define the persisted note record and its fixed identity.
//!
//! # Invariants
//! - Exactly one note identity is used per store; it is never generated.
//! - `title` is a projection of `content`, recomputed on every save.
//!
//! # See also
//! - `crate::repo::note_repo` for the stored row layout.

pub mod document;
pub mod note;
