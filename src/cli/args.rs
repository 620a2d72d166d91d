//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--cwd <path>`: Run as if in that directory
//! - `--debug`: Trace protocol steps
//! - `--quiet` / `-q`: Only warnings and errors

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::core::types::BookmarkName;

/// tether - keep a clone attached to exactly one remote bookmark
#[derive(Parser, Debug)]
#[command(name = "tether")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run as if tether was started in this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Trace protocol steps
    #[arg(long, global = true)]
    pub debug: bool,

    /// Only print warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Clone the source repository at a bookmark
    #[command(
        name = "clone",
        long_about = "Clone the source repository at a bookmark.\n\n\
            Only history reachable from the bookmark is transferred. The new clone \
            has no bookmarks of its own; it records the bookmark it tracks, which \
            later pulls and pushes use by default.",
        after_help = "\
EXAMPLES:
    # Clone bookmark 'main' into ./app
    tether clone /srv/repos/app.git main

    # Clone into a specific directory
    tether clone /srv/repos/app.git release work/app-release"
    )]
    Clone {
        /// Repository to clone from
        source: String,

        /// Bookmark to track
        bookmark: BookmarkName,

        /// Directory to clone into (default: the source's name)
        dest: Option<PathBuf>,
    },

    /// Pull changes from the tracked remote bookmark
    #[command(
        name = "pull",
        long_about = "Pull changes from the tracked remote bookmark.\n\n\
            Fetches the bookmark's history from remote 'default'. Refuses to run \
            if the clone has bookmarks of its own. The working copy is not updated.",
        after_help = "\
EXAMPLES:
    # Pull the tracked bookmark
    tether pull

    # Pull another bookmark once, without changing what is tracked
    tether pull release"
    )]
    Pull {
        /// Bookmark to pull instead of the tracked one
        bookmark: Option<BookmarkName>,
    },

    /// Push the working revision to the remote bookmark
    #[command(
        name = "push",
        long_about = "Push the working revision to the remote bookmark.\n\n\
            Subrepositories are pushed first, then the working revision's history. \
            The remote bookmark is then moved to the working revision if it is a \
            fast-forward, and only if nobody else moved it in the meantime.\n\n\
            Exit status is 0 when the remote bookmark ends up at the working \
            revision and 1 when the update was refused.",
        after_help = "\
EXAMPLES:
    # Push to the tracked bookmark
    tether push

    # Overwrite a diverged remote bookmark
    tether push --force

    # Create a bookmark the remote does not have yet
    tether push --new-bookmark feature/login"
    )]
    Push {
        /// Allow non-fast-forward pushes
        #[arg(short, long)]
        force: bool,

        /// Allow pushing a new bookmark
        #[arg(long)]
        new_bookmark: bool,

        /// Transport option forwarded to every connection (repeatable)
        #[arg(short = 'o', long = "option", value_name = "KEY=VALUE", value_parser = parse_option)]
        options: Vec<(String, String)>,

        /// Bookmark to push to instead of the tracked one
        bookmark: Option<BookmarkName>,
    },

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        after_help = "\
INSTALLATION:
    # Bash
    tether completion bash > ~/.local/share/bash-completion/completions/tether

    # Zsh
    tether completion zsh > ~/.zfunc/_tether

    # Fish
    tether completion fish > ~/.config/fish/completions/tether.fish

    # PowerShell
    tether completion powershell >> $PROFILE"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

fn parse_option(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{}'", raw)),
    }
}
