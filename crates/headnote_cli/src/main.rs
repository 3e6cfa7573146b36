//! CLI probe for the note core.
//!
//! # Responsibility
//! - Open a data directory, load the note, optionally type and save text.
//! - Print every status line so the fallback chain can be observed.
//! - Keep running when a store cannot be opened; the fallback chain reports it.

use clap::Parser;
use headnote_core::{
    default_log_level, init_logging, primary_repository, CoreConfig, EditorBuffer, EditorSurface,
    NoteSession, PersistenceController, StatusLog,
};
use log::warn;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "headnote", version, about = "Open the note and optionally append text")]
struct Args {
    /// Directory holding the note database and recovery cache.
    data_dir: PathBuf,
    /// Text typed at the end of the note, then saved.
    #[arg(long)]
    append: Option<String>,
    /// Directory for rolling log files; logging is off when omitted.
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    if let Some(log_dir) = &args.log_dir {
        let log_dir = absolute(log_dir);
        if let Err(err) = init_logging(default_log_level(), &log_dir) {
            eprintln!("logging disabled: {err}");
        }
    }

    let config = CoreConfig::for_data_dir(&args.data_dir);
    let opened = config.open_primary();
    if let Err(err) = &opened {
        eprintln!("note database unavailable: {err}");
    }
    let cache = config.fallback_cache();

    let status = StatusLog::new();
    let controller = PersistenceController::new(
        config.note_id,
        primary_repository(&opened),
        cache,
        &status,
    )
    .with_stale_threshold(config.stale_cache_threshold);
    let mut session = NoteSession::new(EditorBuffer::new(), controller);

    session.open();
    let mut persisted = true;
    if let Some(text) = &args.append {
        session.editor_mut().type_text(text);
        for outcome in session.pump() {
            if !outcome.is_persisted() {
                warn!("event=cli_save module=cli status=error");
                persisted = false;
            }
        }
    }

    for line in status.lines() {
        let marker = if line.is_error { "!" } else { "-" };
        println!("{marker} {}", line.message);
    }
    println!("title: {}", session.editor().contents().title());
    if persisted {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}
