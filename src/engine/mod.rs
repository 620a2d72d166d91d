//! engine
//!
//! The bookmark sync protocol: clone, pull and push.
//!
//! # Architecture
//!
//! Every operation receives an explicit [`Context`]: where to push, which
//! transport options to forward, and where status messages go. Operations
//! never read process-global state and never print directly.
//!
//! ```text
//! clone:  fetch bookmark -> checkout -> clear bookmarks -> write tracking file
//! pull:   guard -> resolve bookmark -> fetch
//! push:   guard -> connect -> subrepos -> history -> list -> decide -> CAS
//! ```
//!
//! # Invariants
//!
//! - Pull and push refuse clones holding native bookmarks before any
//!   network activity
//! - A push performs at most one conditional update of the remote bookmark
//! - Rejections leave local and remote bookmark state unchanged

pub mod clone;
mod error;
pub mod pull;
pub mod push;
pub mod subrepo;

pub use clone::{clone, default_destination, CloneReport};
pub use error::{SyncError, EXIT_ABORT};
pub use pull::{pull, PullReport};
pub use push::{decide, push, PushDecision, PushOutcome, PushRequest, UpdateKind};

use std::path::PathBuf;
use std::sync::Arc;

use crate::core::config::Config;
use crate::git::{Git, GitError, TransportOptions};
use crate::ui::output::{ConsoleSink, StatusSink, Verbosity};

/// Name of the remote every clone pulls from.
pub const DEFAULT_REMOTE: &str = "default";

/// Name of the remote that overrides [`DEFAULT_REMOTE`] for pushes.
pub const DEFAULT_PUSH_REMOTE: &str = "default-push";

/// Execution context for operations.
#[derive(Clone)]
pub struct Context {
    /// Working directory override.
    pub cwd: Option<PathBuf>,
    /// Output verbosity.
    pub verbosity: Verbosity,
    /// Where pushes go.
    pub default_push: Option<String>,
    /// Forwarded to every transport connection.
    pub options: TransportOptions,
    /// Status output.
    pub sink: Arc<dyn StatusSink>,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("cwd", &self.cwd)
            .field("verbosity", &self.verbosity)
            .field("default_push", &self.default_push)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Default for Context {
    fn default() -> Self {
        Self {
            cwd: None,
            verbosity: Verbosity::Normal,
            default_push: None,
            options: TransportOptions::new(),
            sink: Arc::new(ConsoleSink::new(Verbosity::Normal)),
        }
    }
}

impl Context {
    /// Context reporting to `sink`, with nothing else configured.
    pub fn with_sink(sink: Arc<dyn StatusSink>) -> Self {
        Self {
            sink,
            ..Self::default()
        }
    }

    /// Directory operations run in.
    pub fn cwd(&self) -> Result<PathBuf, SyncError> {
        match &self.cwd {
            Some(cwd) => Ok(cwd.clone()),
            None => std::env::current_dir().map_err(|source| SyncError::Io {
                path: PathBuf::from("."),
                source,
            }),
        }
    }
}

/// Push destination of a clone.
///
/// Precedence: repo config `default_push`, then the `default-push` remote,
/// then the `default` remote.
pub fn resolve_push_destination(git: &Git, config: &Config) -> Result<Option<String>, GitError> {
    if let Some(dest) = config.default_push() {
        return Ok(Some(dest.to_string()));
    }
    if let Some(url) = git.remote_url(DEFAULT_PUSH_REMOTE)? {
        return Ok(Some(url));
    }
    git.remote_url(DEFAULT_REMOTE)
}
