//! engine::error
//!
//! The aggregate error for operations that abort.
//!
//! Rejections a push can end in (non-fast-forward, unknown bookmark, lost
//! race) are not errors; they are [`PushOutcome`](super::PushOutcome)
//! variants. Everything here aborts the operation.

use std::path::PathBuf;

use thiserror::Error;

use crate::core::config::ConfigError;
use crate::core::guard::GuardError;
use crate::core::lock::LockError;
use crate::core::tracking::TrackingError;
use crate::core::types::TypeError;
use crate::git::GitError;

/// Exit code for aborted operations.
pub const EXIT_ABORT: i32 = 255;

/// Errors that abort a sync operation.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The tracking file is missing or unreadable.
    #[error(transparent)]
    Tracking(#[from] TrackingError),

    /// The clone holds native bookmarks.
    #[error(transparent)]
    Guard(#[from] GuardError),

    /// Clone source unreachable, or the bookmark is not there.
    #[error("cannot clone bookmark {bookmark} from {source_url}: {message}")]
    UnreachableSource {
        source_url: String,
        bookmark: String,
        message: String,
    },

    /// The bookmark to pull does not exist on the remote.
    #[error("unknown remote bookmark: {bookmark}")]
    UnknownRemoteBookmark { bookmark: String },

    /// No push destination is configured.
    #[error("no push destination configured (set remote 'default-push' or 'default')")]
    NoPushDestination,

    /// Clone destination exists and is not empty.
    #[error("destination '{path}' already exists and is not empty")]
    DestinationExists { path: PathBuf },

    #[error("invalid name: {0}")]
    InvalidName(#[from] TypeError),

    #[error(transparent)]
    Git(#[from] GitError),

    #[error(transparent)]
    Lock(#[from] LockError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("i/o error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl SyncError {
    /// Process exit code for this error.
    ///
    /// A clone that cannot reach its source exits 1 like a failed push;
    /// every other abort exits 255.
    pub fn exit_code(&self) -> i32 {
        match self {
            SyncError::UnreachableSource { .. } => 1,
            _ => EXIT_ABORT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreachable_source_exits_one() {
        let err = SyncError::UnreachableSource {
            source_url: "/srv/missing".into(),
            bookmark: "main".into(),
            message: "not found".into(),
        };
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn other_aborts_exit_255() {
        assert_eq!(SyncError::NoPushDestination.exit_code(), EXIT_ABORT);

        let err: SyncError = GuardError::ForeignBookmarks {
            names: vec!["main".into()],
        }
        .into();
        assert_eq!(err.exit_code(), EXIT_ABORT);
        assert!(err.to_string().contains("must not have any bookmarks"));
    }
}
