//! Schema migrations for the primary note store.
//!
//! # Invariants
//! - Versions start at 1 and increase by one per step.
//! - The schema version lives in `PRAGMA user_version`, written in the same
//!   transaction as the step it records.
//! - A database written by a newer build is rejected, never downgraded.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

/// Ordered schema steps; index `i` upgrades version `i` to `i + 1`.
const STEPS: &[(&str, &str)] = &[("init_notes", include_str!("0001_init.sql"))];

/// Returns the latest schema version known by this binary.
pub fn latest_version() -> u32 {
    u32::try_from(STEPS.len()).unwrap_or(u32::MAX)
}

/// Brings the connection's schema up to `latest_version()`.
///
/// # Errors
/// - `UnsupportedSchemaVersion` when the database is newer than this build.
/// - `Sqlite` when a step fails; the whole upgrade is rolled back.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let from = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    let latest = latest_version();
    if from > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: from,
            latest_supported: latest,
        });
    }

    let pending = STEPS.iter().zip(1u32..).skip(from as usize);
    let tx = conn.transaction()?;
    let mut applied = 0;
    for ((name, sql), version) in pending {
        tx.execute_batch(sql)?;
        tx.pragma_update(None, "user_version", version)?;
        info!("event=db_migrate module=db status=step step={name} version={version}");
        applied += 1;
    }
    tx.commit()?;

    if applied > 0 {
        info!("event=db_migrate module=db status=done from_version={from} to_version={latest}");
    }
    Ok(())
}
