//! engine::clone
//!
//! Create a clone attached to one remote bookmark.
//!
//! The new clone receives only the history reachable from the bookmark. Any
//! native bookmark the transfer brought along is deleted, the working copy
//! is checked out (detached) at the bookmark's tip, and the bookmark name is
//! recorded in the tracking file. Remote `default` points at the source.

use std::fs;
use std::path::{Path, PathBuf};

use super::{Context, SyncError, DEFAULT_REMOTE};
use crate::core::paths::TetherPaths;
use crate::core::tracking;
use crate::core::types::{BookmarkName, Oid, RefName};
use crate::git::{hide_password, local_path, Git, GitError};

/// Result of a successful clone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloneReport {
    /// Work directory of the new clone.
    pub destination: PathBuf,
    /// The bookmark the clone tracks.
    pub bookmark: BookmarkName,
    /// Commit the working copy was checked out at.
    pub tip: Oid,
    /// Native bookmarks removed after the transfer.
    pub cleared: usize,
}

/// Directory name a clone of `source` gets when none is given.
///
/// The last path component with any `.git` suffix removed.
///
/// ```
/// use tether::engine::default_destination;
///
/// assert_eq!(default_destination("/srv/repos/app.git").as_deref(), Some("app"));
/// assert_eq!(default_destination("https://example.com/team/app/").as_deref(), Some("app"));
/// assert_eq!(default_destination("/"), None);
/// ```
pub fn default_destination(source: &str) -> Option<String> {
    let trimmed = source.trim_end_matches(['/', '\\']);
    let last = trimmed.rsplit(['/', '\\', ':']).next()?;
    let name = last.strip_suffix(".git").unwrap_or(last);
    if name.is_empty() || name == "." || name == ".." {
        None
    } else {
        Some(name.to_string())
    }
}

/// Clone `bookmark` from `source` into `destination`.
///
/// Relative paths are taken relative to the context's working directory.
///
/// # Errors
///
/// - [`SyncError::UnreachableSource`] if the source cannot be fetched from
///   or has no such bookmark; nothing is left behind
/// - [`SyncError::DestinationExists`] if the destination is a non-empty directory
pub fn clone(
    ctx: &Context,
    source: &str,
    bookmark: &BookmarkName,
    destination: Option<&Path>,
) -> Result<CloneReport, SyncError> {
    let cwd = ctx.cwd()?;

    let destination = match destination {
        Some(dest) => cwd.join(dest),
        None => {
            let name = default_destination(source).ok_or_else(|| SyncError::UnreachableSource {
                source_url: hide_password(source),
                bookmark: bookmark.to_string(),
                message: "cannot derive a destination directory".to_string(),
            })?;
            ctx.sink
                .status(&format!("destination directory: {}", name));
            cwd.join(name)
        }
    };

    if is_non_empty_dir(&destination) {
        return Err(SyncError::DestinationExists { path: destination });
    }
    let created = !destination.exists();

    // A local source is recorded absolutely so the clone keeps working
    // regardless of where it is run from.
    let source_url = match local_path(source) {
        Some(path) if !path.is_absolute() => cwd.join(path).to_string_lossy().into_owned(),
        _ => source.to_string(),
    };

    ctx.sink.debug(&format!(
        "cloning bookmark {} from {} into {}",
        bookmark,
        hide_password(&source_url),
        destination.display()
    ));

    let git = match fetch_bookmark(&destination, &source_url, bookmark) {
        Ok(fetched) => fetched,
        Err(err) => {
            discard(&destination, created);
            return Err(SyncError::UnreachableSource {
                source_url: hide_password(source),
                bookmark: bookmark.to_string(),
                message: err.to_string(),
            });
        }
    };

    let bookmark_ref = RefName::for_bookmark(bookmark);
    let tip = git.resolve_ref(bookmark_ref.as_str())?;

    // Remember where the bookmark was so the first pull can report progress
    let pulled_ref = RefName::for_pulled_bookmark(DEFAULT_REMOTE, bookmark);
    git.update_ref_cas(pulled_ref.as_str(), &tip, None, "tether: clone")?;

    git.checkout_detached(&tip)?;

    let cleared = git.clear_local_bookmarks()?;
    ctx.sink
        .debug(&format!("cleared {} native bookmark(s)", cleared));

    let paths = TetherPaths::from_repo_info(&git.info());
    tracking::write(&paths, bookmark)?;

    ctx.sink.status(&format!(
        "tracking bookmark {} at {}",
        bookmark,
        tip.short(12)
    ));

    Ok(CloneReport {
        destination,
        bookmark: bookmark.clone(),
        tip,
        cleared,
    })
}

/// Initialize the destination and fetch exactly the one bookmark.
fn fetch_bookmark(
    destination: &Path,
    source_url: &str,
    bookmark: &BookmarkName,
) -> Result<Git, GitError> {
    let git = Git::init(destination)?;
    git.set_remote(DEFAULT_REMOTE, source_url)?;

    let bookmark_ref = RefName::for_bookmark(bookmark);
    let refspec = format!("{0}:{0}", bookmark_ref);
    git.fetch_refspecs(DEFAULT_REMOTE, &[refspec])?;

    // A fetch of a missing ref succeeds without creating anything
    git.resolve_ref(bookmark_ref.as_str())?;
    Ok(git)
}

fn is_non_empty_dir(path: &Path) -> bool {
    match fs::read_dir(path) {
        Ok(mut entries) => entries.next().is_some(),
        Err(_) => path.exists(),
    }
}

/// Remove what a failed clone left at `destination`.
fn discard(destination: &Path, created: bool) {
    let leftover = if created {
        destination.to_path_buf()
    } else {
        destination.join(".git")
    };
    let _ = fs::remove_dir_all(leftover);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    mod destination {
        use super::*;

        #[test]
        fn strips_git_suffix() {
            assert_eq!(default_destination("../app.git").as_deref(), Some("app"));
            assert_eq!(default_destination("app").as_deref(), Some("app"));
        }

        #[test]
        fn ignores_trailing_separators() {
            assert_eq!(default_destination("/srv/app/").as_deref(), Some("app"));
        }

        #[test]
        fn scp_style_sources() {
            assert_eq!(
                default_destination("git@example.com:app.git").as_deref(),
                Some("app")
            );
        }

        #[test]
        fn nothing_usable() {
            assert_eq!(default_destination(""), None);
            assert_eq!(default_destination(".git"), None);
            assert_eq!(default_destination(".."), None);
        }
    }

    #[test]
    fn non_empty_detection() {
        let temp = TempDir::new().unwrap();
        assert!(!is_non_empty_dir(temp.path()));
        assert!(!is_non_empty_dir(&temp.path().join("missing")));

        fs::write(temp.path().join("file"), "x").unwrap();
        assert!(is_non_empty_dir(temp.path()));
        assert!(is_non_empty_dir(&temp.path().join("file")));
    }

    #[test]
    fn unreachable_source_leaves_nothing_behind() {
        let temp = TempDir::new().unwrap();
        let ctx = Context {
            cwd: Some(temp.path().to_path_buf()),
            ..Context::with_sink(std::sync::Arc::new(crate::ui::output::MemorySink::new()))
        };
        let bookmark = BookmarkName::new("main").unwrap();

        let err = clone(&ctx, "does-not-exist", &bookmark, Some(Path::new("dest"))).unwrap_err();

        assert_eq!(err.exit_code(), 1);
        assert!(!temp.path().join("dest").exists());
    }

    #[test]
    fn missing_bookmark_keeps_preexisting_empty_destination() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("source");
        Git::init(&source).unwrap();
        let dest = temp.path().join("dest");
        fs::create_dir(&dest).unwrap();

        let ctx = Context {
            cwd: Some(temp.path().to_path_buf()),
            ..Context::with_sink(std::sync::Arc::new(crate::ui::output::MemorySink::new()))
        };
        let bookmark = BookmarkName::new("main").unwrap();

        let err = clone(&ctx, "source", &bookmark, Some(Path::new("dest"))).unwrap_err();

        assert!(matches!(err, SyncError::UnreachableSource { .. }));
        assert!(dest.exists());
        assert!(!is_non_empty_dir(&dest));
    }

    #[test]
    fn refuses_non_empty_destination() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("dest");
        fs::create_dir(&dest).unwrap();
        fs::write(dest.join("keep"), "x").unwrap();

        let ctx = Context {
            cwd: Some(temp.path().to_path_buf()),
            ..Context::default()
        };
        let bookmark = BookmarkName::new("main").unwrap();

        let err = clone(&ctx, "anywhere", &bookmark, Some(Path::new("dest"))).unwrap_err();

        assert!(matches!(err, SyncError::DestinationExists { .. }));
        assert!(dest.join("keep").exists());
    }
}
