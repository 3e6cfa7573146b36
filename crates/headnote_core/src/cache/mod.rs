//! Best-effort fallback cache for note content.
//!
//! # Responsibility
//! - Provide a string-keyed scoped store independent of the primary store.
//! - Serialize note content into one fixed recovery slot.
//!
//! # Invariants
//! - Cache failures never block or alter primary store operations.
//! - Malformed recovery data is removed once detected.
//!
//! # See also
//! - `crate::service::persistence` for when the cache is read and written.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod fallback;
pub mod scoped_store;

pub use fallback::{CacheRead, FallbackCache};
pub use scoped_store::{
    FileScopedStore, MemoryScopedStore, ScopedStore, UnavailableScopedStore,
};

pub type CacheResult<T> = Result<T, CacheError>;

/// Error for scoped store access and recovery slot encoding.
#[derive(Debug)]
pub enum CacheError {
    Io(std::io::Error),
    InvalidKey(String),
    QuotaExceeded { needed: usize, quota: usize },
    Serialize(serde_json::Error),
    /// Stored bytes under `key` are not UTF-8 text.
    Undecodable { key: String, reason: String },
    /// The store could not be opened; every call reports this.
    Unavailable(String),
}

impl Display for CacheError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "scoped store I/O failed: {err}"),
            Self::InvalidKey(key) => write!(f, "invalid scoped store key `{key}`"),
            Self::QuotaExceeded { needed, quota } => write!(
                f,
                "scoped store quota exceeded: {needed} bytes needed, {quota} allowed"
            ),
            Self::Serialize(err) => write!(f, "content is not serializable: {err}"),
            Self::Undecodable { key, reason } => {
                write!(f, "scoped store entry `{key}` is not text: {reason}")
            }
            Self::Unavailable(reason) => write!(f, "scoped store unavailable: {reason}"),
        }
    }
}

impl Error for CacheError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Serialize(err) => Some(err),
            Self::InvalidKey(_)
            | Self::QuotaExceeded { .. }
            | Self::Undecodable { .. }
            | Self::Unavailable(_) => None,
        }
    }
}

impl From<std::io::Error> for CacheError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}
