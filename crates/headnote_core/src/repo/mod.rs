//! Primary store abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the record-store contract the persistence controller writes to.
//! - Isolate SQLite query details from orchestration code.
//!
//! # Invariants
//! - Repository APIs surface every failure as `RepoError`; callers decide
//!   whether to fall back.

pub mod note_repo;
