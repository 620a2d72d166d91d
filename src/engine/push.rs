//! engine::push
//!
//! Push the working revision and move the remote bookmark to it.
//!
//! # Protocol
//!
//! ```text
//! guard -> connect -> subrepos (sorted, fail-fast) -> history
//!       -> list remote bookmarks -> decide -> one conditional update
//! ```
//!
//! The remote bookmark is moved with a single compare-and-swap whose
//! expected value is what the listing returned. If another writer moved the
//! bookmark in between, the swap fails and the push reports it instead of
//! overwriting their work. No lock is held across the window.
//!
//! # Decision table
//!
//! | remote bookmark       | flags            | decision                |
//! |-----------------------|------------------|-------------------------|
//! | absent                | -                | reject (unknown)        |
//! | absent                | `--new-bookmark` | create                  |
//! | equal to new          | any              | nothing to update       |
//! | ancestor of new       | any              | fast-forward            |
//! | anything else         | `--force`        | forced update           |
//! | anything else         | -                | reject (non-ff)         |

use super::subrepo::{self, SubrepoFailure};
use super::{Context, SyncError};
use crate::core::guard::ensure_no_foreign_bookmarks;
use crate::core::paths::TetherPaths;
use crate::core::tracking;
use crate::core::types::{BookmarkName, Oid, BOOKMARKS_NAMESPACE};
use crate::git::{hide_password, Git, HistoryPush, Transport};

/// What to push.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushRequest {
    /// Bookmark to update; the tracked bookmark when `None`.
    pub bookmark: Option<BookmarkName>,
    /// Allow non-fast-forward updates.
    pub force: bool,
    /// Allow creating a bookmark the remote does not have.
    pub new_bookmark: bool,
}

/// How the remote bookmark should change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushDecision {
    NoOp,
    FastForward,
    Forced,
    Create,
    RejectNonFastForward,
    RejectUnknown,
}

impl PushDecision {
    /// The kind of update this decision performs, if it performs one.
    pub fn update_kind(self) -> Option<UpdateKind> {
        match self {
            PushDecision::FastForward => Some(UpdateKind::FastForward),
            PushDecision::Forced => Some(UpdateKind::Forced),
            PushDecision::Create => Some(UpdateKind::Created),
            _ => None,
        }
    }
}

/// Kind of a successful bookmark update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateKind {
    FastForward,
    Forced,
    Created,
}

/// How a push ended, short of aborting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    /// The remote bookmark already pointed at the working revision.
    NoOp,
    /// The remote bookmark was moved from `old` to `new`.
    Updated {
        kind: UpdateKind,
        old: Option<Oid>,
        new: Oid,
    },
    /// The update is not a fast-forward and `--force` was not given.
    RejectedNonFastForward { bookmark: BookmarkName },
    /// The remote has no such bookmark and `--new-bookmark` was not given.
    RejectedUnknownBookmark { bookmark: BookmarkName },
    /// The conditional update was refused: the bookmark moved concurrently,
    /// or the new revision is not present on the remote.
    UpdateFailed { bookmark: BookmarkName },
    /// A subrepository could not be pushed; nothing else was.
    SubrepoFailed { path: String, reason: String },
}

impl PushOutcome {
    /// Process exit code: 0 if the remote ends up at the working revision.
    pub fn exit_code(&self) -> i32 {
        match self {
            PushOutcome::NoOp | PushOutcome::Updated { .. } => 0,
            _ => 1,
        }
    }

    pub fn is_success(&self) -> bool {
        self.exit_code() == 0
    }
}

impl From<SubrepoFailure> for PushOutcome {
    fn from(failure: SubrepoFailure) -> Self {
        PushOutcome::SubrepoFailed {
            path: failure.path,
            reason: failure.reason,
        }
    }
}

/// Decide what to do with the remote bookmark.
///
/// `old` is the remote value (`None` if the bookmark does not exist there)
/// and `fast_forward` whether `old` is an ancestor of `new` in the local
/// history. The first matching row of the decision table wins.
pub fn decide(
    old: Option<&Oid>,
    new: &Oid,
    fast_forward: bool,
    force: bool,
    new_bookmark: bool,
) -> PushDecision {
    match old {
        None if new_bookmark => PushDecision::Create,
        None => PushDecision::RejectUnknown,
        Some(old) if old == new => PushDecision::NoOp,
        Some(_) if fast_forward => PushDecision::FastForward,
        Some(_) if force => PushDecision::Forced,
        Some(_) => PushDecision::RejectNonFastForward,
    }
}

/// Push the working revision to the context's push destination.
///
/// # Errors
///
/// Aborts (as opposed to rejections, which are [`PushOutcome`] variants):
/// - [`SyncError::Guard`] if the clone holds native bookmarks; checked
///   before connecting
/// - [`SyncError::NoPushDestination`]
/// - [`SyncError::Tracking`] if no bookmark is given and the tracking file
///   is missing or unreadable
/// - [`SyncError::Git`] for transport failures, including a failed history push
pub fn push(
    ctx: &Context,
    git: &Git,
    transport: &dyn Transport,
    request: &PushRequest,
) -> Result<PushOutcome, SyncError> {
    ensure_no_foreign_bookmarks(git)?;

    let destination = ctx
        .default_push
        .as_deref()
        .ok_or(SyncError::NoPushDestination)?;
    ctx.sink
        .status(&format!("pushing to {}", hide_password(destination)));

    let remote = transport.connect(destination, &ctx.options)?;
    let head = git.resolve_revision(".")?;

    // Subrepositories go first so the parent never references commits the
    // subrepo remotes lack.
    let substate = git.substate(&head)?;
    if let Err(failure) = subrepo::push_all(ctx, git, transport, destination, &substate) {
        ctx.sink
            .warn(&format!("pushing subrepo {} failed", failure.path));
        return Ok(failure.into());
    }

    match remote.push_history(git, std::slice::from_ref(&head))? {
        HistoryPush::Sent { objects } => ctx.sink.debug(&format!("sent {} objects", objects)),
        HistoryPush::UpToDate => ctx.sink.debug("no objects to send"),
    }

    let bookmark = match &request.bookmark {
        Some(b) => b.clone(),
        None => tracking::read(&TetherPaths::from_repo_info(&git.info()))?,
    };

    let remote_bookmarks = remote.list_keys(BOOKMARKS_NAMESPACE)?;
    let new = git.resolve_revision(".")?;
    let old = remote_bookmarks.get(bookmark.as_str()).cloned();

    // An old value this clone has never seen cannot be an ancestor of new
    let fast_forward = match &old {
        Some(old) if old != &new => git.has_commit(old)? && git.is_ancestor(old, &new)?,
        _ => false,
    };

    let decision = decide(
        old.as_ref(),
        &new,
        fast_forward,
        request.force,
        request.new_bookmark,
    );
    ctx.sink.debug(&format!(
        "bookmark {}: remote {} local {} -> {:?}",
        bookmark,
        old.as_ref().map_or("<none>", |o| o.short(12)),
        new.short(12),
        decision
    ));

    let kind = match decision {
        PushDecision::NoOp => {
            ctx.sink.status("nothing to update");
            return Ok(PushOutcome::NoOp);
        }
        PushDecision::RejectNonFastForward => {
            ctx.sink.warn(&format!(
                "skipping non-fast-forward update of bookmark {}",
                bookmark
            ));
            return Ok(PushOutcome::RejectedNonFastForward { bookmark });
        }
        PushDecision::RejectUnknown => {
            ctx.sink.warn(&format!(
                "remote bookmark '{}' not found: did you want --new-bookmark?",
                bookmark
            ));
            return Ok(PushOutcome::RejectedUnknownBookmark { bookmark });
        }
        PushDecision::FastForward => {
            ctx.sink.status(&format!("updating bookmark {}", bookmark));
            UpdateKind::FastForward
        }
        PushDecision::Forced => {
            ctx.sink
                .status(&format!("force-updating bookmark {}", bookmark));
            UpdateKind::Forced
        }
        PushDecision::Create => {
            ctx.sink.status(&format!("creating bookmark {}", bookmark));
            UpdateKind::Created
        }
    };

    let swapped = remote.push_key(BOOKMARKS_NAMESPACE, bookmark.as_str(), old.as_ref(), &new)?;
    if !swapped {
        ctx.sink
            .warn(&format!("updating bookmark {} failed!", bookmark));
        return Ok(PushOutcome::UpdateFailed { bookmark });
    }

    Ok(PushOutcome::Updated { kind, old, new })
}
