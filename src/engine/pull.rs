//! engine::pull
//!
//! Fetch the tracked bookmark's history from remote `default`.
//!
//! The fetched tip is stored at `refs/remotes/default/bookmarks/<name>`;
//! pulling never creates native bookmarks and never touches the working
//! copy.

use super::{Context, SyncError, DEFAULT_REMOTE};
use crate::core::guard::ensure_no_foreign_bookmarks;
use crate::core::paths::TetherPaths;
use crate::core::tracking;
use crate::core::types::{BookmarkName, Oid, RefName};
use crate::git::{hide_password, Git, GitError};

/// Result of a successful pull.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullReport {
    /// The bookmark that was pulled.
    pub bookmark: BookmarkName,
    /// Where the bookmark was at the previous pull, if any.
    pub previous: Option<Oid>,
    /// Where the bookmark is now.
    pub current: Oid,
    /// Commits reachable from `current` that were not reachable from `previous`.
    pub new_commits: usize,
}

impl PullReport {
    pub fn is_up_to_date(&self) -> bool {
        self.previous.as_ref() == Some(&self.current)
    }
}

/// Pull `bookmark`, or the tracked bookmark when `None`.
///
/// An explicit bookmark applies to this pull only; the tracking file is
/// not rewritten.
///
/// # Errors
///
/// - [`SyncError::Guard`] if the clone holds native bookmarks (checked first)
/// - [`SyncError::Tracking`] if no bookmark is given and the tracking file
///   is missing or unreadable
/// - [`SyncError::UnknownRemoteBookmark`] if the remote has no such bookmark
pub fn pull(
    ctx: &Context,
    git: &Git,
    bookmark: Option<&BookmarkName>,
) -> Result<PullReport, SyncError> {
    ensure_no_foreign_bookmarks(git)?;

    let bookmark = match bookmark {
        Some(b) => b.clone(),
        None => tracking::read(&TetherPaths::from_repo_info(&git.info()))?,
    };

    let url = git
        .remote_url(DEFAULT_REMOTE)?
        .ok_or_else(|| GitError::RefNotFound {
            refname: format!("remote {}", DEFAULT_REMOTE),
        })?;
    ctx.sink
        .status(&format!("pulling from {}", hide_password(&url)));

    let source = RefName::for_bookmark(&bookmark);
    let target = RefName::for_pulled_bookmark(DEFAULT_REMOTE, &bookmark);
    let previous = git.try_resolve_ref(target.as_str())?;

    // Fetching a ref the remote lacks succeeds silently, so the target is
    // cleared first and its absence afterwards means the bookmark is gone.
    git.delete_ref(target.as_str())?;
    let refspec = format!("+{}:{}", source, target);
    ctx.sink.debug(&format!("fetching {}", refspec));
    let fetched = git.fetch_refspecs(DEFAULT_REMOTE, &[refspec]);

    let current = match fetched.and_then(|()| git.try_resolve_ref(target.as_str())) {
        Ok(Some(current)) => current,
        Ok(None) => {
            restore(git, &target, previous.as_ref())?;
            return Err(SyncError::UnknownRemoteBookmark {
                bookmark: bookmark.to_string(),
            });
        }
        Err(err) => {
            restore(git, &target, previous.as_ref())?;
            return Err(err.into());
        }
    };

    let new_commits = match &previous {
        Some(prev) if prev == &current => 0,
        Some(prev) if git.has_commit(prev)? => git.commit_count(Some(prev), &current)?,
        _ => git.commit_count(None, &current)?,
    };

    if new_commits == 0 {
        ctx.sink.status("no changes found");
    } else {
        ctx.sink.status(&format!(
            "added {} commit(s), bookmark {} now at {}",
            new_commits,
            bookmark,
            current.short(12)
        ));
    }

    Ok(PullReport {
        bookmark,
        previous,
        current,
        new_commits,
    })
}

fn restore(git: &Git, target: &RefName, previous: Option<&Oid>) -> Result<(), GitError> {
    match previous {
        Some(prev) => git.update_ref_cas(target.as_str(), prev, None, "tether: pull (restore)"),
        None => Ok(()),
    }
}
