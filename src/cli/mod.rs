//! cli
//!
//! Command-line interface layer for tether.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Build the engine [`Context`](crate::engine::Context) from flags and config
//! - Delegate to command handlers and report their exit code
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap and dispatches to the
//! [`crate::engine`] for execution. Repository state only changes through
//! engine operations.

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};

use std::sync::Arc;

use anyhow::Result;

use crate::core::config::Config;
use crate::engine;
use crate::ui::output::{ConsoleSink, Verbosity};

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`. Returns the process
/// exit code for operations that ran to completion.
pub fn run() -> Result<i32> {
    let cli = Cli::parse_args();

    // The CLI flag only ever adds quietness on top of the config default
    let config = Config::load(None)?;
    let verbosity = Verbosity::from_flags(cli.quiet || config.quiet(), cli.debug);

    let ctx = engine::Context {
        cwd: cli.cwd.clone(),
        verbosity,
        sink: Arc::new(ConsoleSink::new(verbosity)),
        ..engine::Context::default()
    };

    if let Some(path) = config.global_config_loaded_from() {
        crate::ui::output::debug(
            format!("global config: {}", path.display()),
            verbosity,
        );
    }

    commands::dispatch(cli.command, &ctx)
}
