//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store and cache calls into save/load use-cases.
//! - Bind an editing surface to persistence through a save queue.

pub mod persistence;
pub mod save_queue;
pub mod session;
