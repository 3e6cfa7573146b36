//! Save/load orchestration across the primary store and the fallback cache.
//!
//! # Responsibility
//! - Load: primary store first, recovery cache second, fresh note last.
//! - Save: one primary write, then one mirror write into the cache.
//! - Report every branch through the status sink.
//!
//! # Invariants
//! - `save` performs exactly one primary write and exactly one cache write.
//! - `save` and `load` never return errors and never panic; failures become
//!   outcome values plus status reports.
//! - No retries: one attempt per store per call.
//! - Malformed recovery data is deleted when detected.
//!
//! # See also
//! - `crate::service::session` for how saves are triggered.

use crate::cache::{CacheRead, FallbackCache, ScopedStore};
use crate::error::PersistenceError;
use crate::model::document::Document;
use crate::model::note::{NoteId, NoteRecord};
use crate::repo::note_repo::NoteRepository;
use crate::status::StatusReporter;
use log::{error, info, warn};
use std::cell::Cell;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Consecutive failed mirror writes after which the cache is reported stale.
pub const DEFAULT_STALE_CACHE_THRESHOLD: u32 = 3;

/// Result of one `save` call.
#[derive(Debug)]
pub enum SaveOutcome {
    /// Primary write and cache mirror both succeeded.
    Saved { last_modified: i64 },
    /// Primary write succeeded; the cache mirror failed.
    SavedCacheFailed {
        last_modified: i64,
        error: PersistenceError,
    },
    /// Primary write failed; the content survived in the cache.
    CachedAfterPrimaryFailure { error: PersistenceError },
    /// Both writes failed; the content was not persisted anywhere.
    CacheAlsoFailed {
        primary: PersistenceError,
        fallback: PersistenceError,
    },
}

impl SaveOutcome {
    /// Returns whether the primary store accepted the write.
    pub fn is_saved(&self) -> bool {
        matches!(self, Self::Saved { .. } | Self::SavedCacheFailed { .. })
    }

    /// Returns whether the content is persisted in at least one store.
    pub fn is_persisted(&self) -> bool {
        !matches!(self, Self::CacheAlsoFailed { .. })
    }
}

/// Result of `load`.
#[derive(Debug)]
pub enum LoadOutcome {
    /// Content read from the primary store.
    Primary(Document),
    /// Content recovered from the cache after a primary miss
    /// (`primary_error == None`) or a primary failure.
    Fallback {
        content: Document,
        primary_error: Option<PersistenceError>,
    },
    /// Nothing usable was found; `issues` lists what went wrong on the way.
    Fresh { issues: Vec<PersistenceError> },
}

impl LoadOutcome {
    pub fn content(&self) -> Option<&Document> {
        match self {
            Self::Primary(content) | Self::Fallback { content, .. } => Some(content),
            Self::Fresh { .. } => None,
        }
    }

    pub fn is_fresh(&self) -> bool {
        matches!(self, Self::Fresh { .. })
    }

    /// Content to hand to the editing surface; a fresh note starts as an
    /// empty heading line.
    pub fn into_document(self) -> Document {
        match self {
            Self::Primary(content) | Self::Fallback { content, .. } => content,
            Self::Fresh { .. } => Document::fresh(),
        }
    }
}

/// Clock returning Unix epoch milliseconds.
pub type Clock = fn() -> i64;

/// Reads the system clock as Unix epoch milliseconds.
pub fn system_clock() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

/// Orchestrates the two-tier fallback chain for one note identity.
pub struct PersistenceController<R, S, P>
where
    R: NoteRepository,
    S: ScopedStore,
    P: StatusReporter,
{
    note_id: NoteId,
    repo: R,
    cache: FallbackCache<S>,
    reporter: P,
    clock: Clock,
    stale_threshold: u32,
    mirror_failures: Cell<u32>,
}

impl<R, S, P> PersistenceController<R, S, P>
where
    R: NoteRepository,
    S: ScopedStore,
    P: StatusReporter,
{
    pub fn new(note_id: NoteId, repo: R, cache: FallbackCache<S>, reporter: P) -> Self {
        Self {
            note_id,
            repo,
            cache,
            reporter,
            clock: system_clock,
            stale_threshold: DEFAULT_STALE_CACHE_THRESHOLD,
            mirror_failures: Cell::new(0),
        }
    }

    /// Replaces the timestamp source used for `last_modified`.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Sets how many consecutive mirror failures mark the cache stale.
    /// Zero disables the warning.
    pub fn with_stale_threshold(mut self, threshold: u32) -> Self {
        self.stale_threshold = threshold;
        self
    }

    pub fn note_id(&self) -> NoteId {
        self.note_id
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    pub fn cache(&self) -> &FallbackCache<S> {
        &self.cache
    }

    pub fn reporter(&self) -> &P {
        &self.reporter
    }

    /// Consecutive saves whose cache mirror failed while the primary write
    /// succeeded.
    pub fn mirror_failures(&self) -> u32 {
        self.mirror_failures.get()
    }

    /// Persists `content` as the full note.
    ///
    /// `plain_text` is the editor's plain rendering of `content`; the title
    /// is derived from it.
    pub fn save(&self, content: &Document, plain_text: &str) -> SaveOutcome {
        let started_at = Instant::now();
        let record =
            NoteRecord::from_content(self.note_id, content.clone(), plain_text, (self.clock)());

        match self.repo.put_note(&record) {
            Ok(()) => {
                info!(
                    "event=note_save module=persistence status=ok store=primary duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                self.reporter.report("Note saved.", false);
                self.mirror_after_save(content, record.last_modified)
            }
            Err(err) => {
                error!(
                    "event=note_save module=persistence status=error store=primary duration_ms={} error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                self.reporter
                    .report("Error saving note to primary store!", true);
                self.mirror_after_primary_failure(content, err.into())
            }
        }
    }

    fn mirror_after_save(&self, content: &Document, last_modified: i64) -> SaveOutcome {
        match self.cache.put(content) {
            Ok(()) => {
                self.mirror_failures.set(0);
                SaveOutcome::Saved { last_modified }
            }
            Err(err) => {
                warn!("event=cache_mirror module=persistence status=error error={err}");
                self.reporter
                    .report("Note saved, but caching to recovery store failed.", true);
                self.record_mirror_failure();
                SaveOutcome::SavedCacheFailed {
                    last_modified,
                    error: err.into(),
                }
            }
        }
    }

    fn mirror_after_primary_failure(
        &self,
        content: &Document,
        primary: PersistenceError,
    ) -> SaveOutcome {
        match self.cache.put(content) {
            Ok(()) => {
                info!("event=cache_mirror module=persistence status=ok after=primary_error");
                self.mirror_failures.set(0);
                self.reporter.report(
                    "Note cached to recovery store (primary store failed).",
                    true,
                );
                SaveOutcome::CachedAfterPrimaryFailure { error: primary }
            }
            Err(err) => {
                error!(
                    "event=cache_mirror module=persistence status=error after=primary_error error={err}"
                );
                self.reporter
                    .report("Recovery cache also failed; note was not saved.", true);
                SaveOutcome::CacheAlsoFailed {
                    primary,
                    fallback: err.into(),
                }
            }
        }
    }

    fn record_mirror_failure(&self) {
        let failures = self.mirror_failures.get().saturating_add(1);
        self.mirror_failures.set(failures);
        if self.stale_threshold > 0 && failures == self.stale_threshold {
            warn!("event=cache_stale module=persistence status=warn consecutive_failures={failures}");
            self.reporter.report(
                &format!("Recovery cache is stale: {failures} consecutive saves were not cached."),
                true,
            );
        }
    }

    /// Loads the note, walking primary store then recovery cache.
    pub fn load(&self) -> LoadOutcome {
        let started_at = Instant::now();
        self.reporter.report("Loading note...", false);

        let primary_error = match self.repo.get_note(self.note_id) {
            Ok(Some(NoteRecord {
                content: Some(content),
                ..
            })) => {
                info!(
                    "event=note_load module=persistence status=ok source=primary duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                self.reporter.report("Note loaded from primary store.", false);
                return LoadOutcome::Primary(content);
            }
            Ok(_) => None,
            Err(err) => {
                error!(
                    "event=note_load module=persistence status=error source=primary error={err}"
                );
                self.reporter.report(
                    "Error loading from primary store. Trying recovery cache...",
                    true,
                );
                Some(PersistenceError::from(err))
            }
        };

        let mut issues = Vec::new();
        match self.cache.read() {
            Ok(CacheRead::Recovered(content)) => {
                info!(
                    "event=note_load module=persistence status=ok source=fallback after_primary_error={} duration_ms={}",
                    primary_error.is_some(),
                    started_at.elapsed().as_millis()
                );
                let message = if primary_error.is_some() {
                    "Note loaded from recovery cache after primary store error."
                } else {
                    "Note loaded from recovery cache."
                };
                self.reporter.report(message, false);
                return LoadOutcome::Fallback {
                    content,
                    primary_error,
                };
            }
            Ok(CacheRead::Absent) => {}
            Ok(CacheRead::Discarded { reason, .. }) => {
                self.reporter
                    .report("Discarded malformed recovery cache data.", true);
                issues.push(PersistenceError::MalformedFallbackData(reason));
            }
            Err(err) => {
                error!(
                    "event=note_load module=persistence status=error source=fallback error={err}"
                );
                self.reporter.report("Recovery cache unavailable.", true);
                issues.push(PersistenceError::from(err));
            }
        }

        if let Some(err) = primary_error {
            issues.insert(0, err);
        }
        info!(
            "event=note_load module=persistence status=ok source=fresh issues={} duration_ms={}",
            issues.len(),
            started_at.elapsed().as_millis()
        );
        self.reporter.report("Started a new note.", false);
        LoadOutcome::Fresh { issues }
    }
}
