//! core::guard
//!
//! The single-bookmark invariant.
//!
//! A tether clone follows exactly one remote bookmark, recorded in the
//! tracking file. Native bookmarks (`refs/bookmarks/*`) in the clone itself
//! would make it ambiguous which line of history `pull` and `push` act on,
//! so both refuse to run while any exist.

use thiserror::Error;

use crate::git::{Git, GitError};

/// Errors from the single-bookmark precondition.
#[derive(Debug, Error)]
pub enum GuardError {
    /// The clone carries local bookmarks besides the tracked one.
    #[error("local repo must not have any bookmarks (found: {})", names.join(", "))]
    ForeignBookmarks { names: Vec<String> },

    #[error(transparent)]
    Git(#[from] GitError),
}

/// Refuse to proceed if the clone has any local bookmarks.
///
/// This is a precondition of `pull` and `push`, checked before anything
/// touches the network.
pub fn ensure_no_foreign_bookmarks(git: &Git) -> Result<(), GuardError> {
    let names = git.list_local_bookmarks()?;
    if names.is_empty() {
        Ok(())
    } else {
        Err(GuardError::ForeignBookmarks { names })
    }
}
