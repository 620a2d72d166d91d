//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Opens the clone (if the command needs one) and completes the context
//! 2. Calls the engine to execute the command
//! 3. Returns the exit code the outcome maps to
//!
//! Handlers do NOT perform repository mutations directly.

mod clone;
mod completion;
mod pull;
mod push;

pub use clone::clone;
pub use completion::completion;
pub use pull::pull;
pub use push::push;

use anyhow::Result;

use crate::cli::args::Command;
use crate::core::config::Config;
use crate::core::paths::TetherPaths;
use crate::engine::Context;
use crate::git::Git;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<i32> {
    match command {
        Command::Clone {
            source,
            bookmark,
            dest,
        } => clone(ctx, &source, &bookmark, dest.as_deref()),
        Command::Pull { bookmark } => pull(ctx, bookmark.as_ref()),
        Command::Push {
            force,
            new_bookmark,
            options,
            bookmark,
        } => push(ctx, bookmark, force, new_bookmark, options),
        Command::Completion { shell } => {
            completion(shell)?;
            Ok(0)
        }
    }
}

/// Open the clone the context points at, with its merged configuration.
fn open_clone(ctx: &Context) -> Result<(Git, Config)> {
    let cwd = ctx.cwd()?;
    let git = Git::open(&cwd)?;
    let paths = TetherPaths::from_repo_info(&git.info());
    let config = Config::load(Some(&paths))?;
    if let Some(path) = config.repo_config_loaded_from() {
        ctx.sink
            .debug(&format!("repo config: {}", path.display()));
    }
    Ok((git, config))
}
