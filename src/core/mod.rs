//! core
//!
//! Core domain types and the clone-local state tether keeps.
//!
//! # Modules
//!
//! - [`types`] - Strong types: BookmarkName, Oid, RefName
//! - [`paths`] - Centralized path routing for tether storage
//! - [`lock`] - Exclusive working-area lock
//! - [`tracking`] - The tracking file (which bookmark a clone follows)
//! - [`guard`] - The single-bookmark precondition
//! - [`config`] - Configuration schema and loading

pub mod config;
pub mod guard;
pub mod lock;
pub mod paths;
pub mod tracking;
pub mod types;
