//! ui
//!
//! User interaction utilities.
//!
//! # Modules
//!
//! - [`output`] - Output formatting, verbosity and status sinks
//!
//! # Design
//!
//! All operator-facing output goes through this module to ensure consistent
//! formatting and proper handling of quiet and debug modes.

pub mod output;
