//! tether - keep a git clone attached to exactly one remote bookmark
//!
//! A tether clone follows one named remote pointer, a bookmark stored as
//! `refs/bookmarks/<name>`. Three operations keep the clone and the remote
//! consistent with respect to that one bookmark: clone-to-bookmark,
//! pull-from-bookmark, and a conditional push that moves the remote
//! bookmark with compare-and-swap semantics.
//!
//! # Architecture
//!
//! The codebase follows a strict layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to engine)
//! - [`engine`] - The clone, pull and push protocols
//! - [`core`] - Domain types, the tracking file, locking and configuration
//! - [`git`] - Single interface for all Git operations, transports
//! - [`ui`] - Output and status reporting
//!
//! # Correctness Invariants
//!
//! 1. A clone tracks exactly one bookmark and holds no native bookmarks
//! 2. A push never overwrites a remote bookmark it did not observe
//! 3. Non-fast-forward updates require explicit force
//! 4. Rejected pushes leave local and remote bookmarks unchanged

pub mod cli;
pub mod core;
pub mod engine;
pub mod git;
pub mod ui;
