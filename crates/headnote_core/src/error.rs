//! Persistence error kinds surfaced through outcomes and status reports.
//!
//! # Invariants
//! - These errors are values inside `SaveOutcome`/`load` reports; they are
//!   never returned as `Err` from `save` or `load`.

use crate::cache::CacheError;
use crate::repo::note_repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum PersistenceError {
    /// Primary store open/read/write failure.
    PrimaryUnavailable(RepoError),
    /// Scoped store read/write failure.
    FallbackUnavailable(CacheError),
    /// Recovery slot held data that is not a document.
    MalformedFallbackData(String),
}

impl Display for PersistenceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PrimaryUnavailable(err) => write!(f, "primary store unavailable: {err}"),
            Self::FallbackUnavailable(err) => write!(f, "fallback cache unavailable: {err}"),
            Self::MalformedFallbackData(reason) => {
                write!(f, "malformed fallback data: {reason}")
            }
        }
    }
}

impl Error for PersistenceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::PrimaryUnavailable(err) => Some(err),
            Self::FallbackUnavailable(err) => Some(err),
            Self::MalformedFallbackData(_) => None,
        }
    }
}

impl From<RepoError> for PersistenceError {
    fn from(value: RepoError) -> Self {
        Self::PrimaryUnavailable(value)
    }
}

impl From<CacheError> for PersistenceError {
    fn from(value: CacheError) -> Self {
        Self::FallbackUnavailable(value)
    }
}
