//! git::interface
//!
//! Git interface implementation using git2.
//!
//! This module provides the **single doorway** to the object store. It
//! normalizes git2 errors into typed failure categories and exposes only
//! the primitives the bookmark protocol consumes: revision resolution,
//! ancestry, the native bookmark set, submodule state, fetch, and object
//! transfer between stores.
//!
//! # Error Handling
//!
//! Git errors are categorized into typed variants:
//! - [`GitError::NotARepo`]: No repository at the given path
//! - [`GitError::RefNotFound`]: Requested ref or revision does not exist
//! - [`GitError::CasFailed`]: Compare-and-swap precondition failed
//! - [`GitError::RemoteUnreachable`]: A fetch could not reach its remote

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::types::{Oid, RefName, TypeError, BOOKMARKS_NAMESPACE};

/// Errors from Git operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// No repository at the given path.
    #[error("not a git repository: {path}")]
    NotARepo {
        /// The path that was searched
        path: PathBuf,
    },

    /// Repository is bare where a working copy is required.
    #[error("bare repository not supported")]
    BareRepo,

    /// Requested ref or revision does not exist.
    #[error("ref not found: {refname}")]
    RefNotFound {
        /// The ref that was not found
        refname: String,
    },

    /// Compare-and-swap precondition failed.
    #[error("CAS failed for {refname}: expected {expected}, found {actual}")]
    CasFailed {
        /// The ref being updated
        refname: String,
        /// The expected old value
        expected: String,
        /// The actual current value
        actual: String,
    },

    /// Object not found in repository.
    #[error("object not found: {oid}")]
    ObjectNotFound {
        /// The OID that was not found
        oid: String,
    },

    /// Invalid object id format.
    #[error("invalid object id: {oid}")]
    InvalidOid {
        /// The invalid OID string
        oid: String,
    },

    /// Invalid ref name format.
    #[error("invalid ref name: {message}")]
    InvalidRefName {
        /// Description of the problem
        message: String,
    },

    /// A remote could not be reached or refused the transfer.
    #[error("remote {url} unreachable: {message}")]
    RemoteUnreachable {
        /// Remote URL, passwords masked
        url: String,
        /// Underlying transport message
        message: String,
    },

    /// No transport knows how to reach the destination.
    #[error("unsupported remote destination: {url}")]
    UnsupportedTransport {
        /// Remote URL, passwords masked
        url: String,
    },

    /// Permission or filesystem error.
    #[error("repository access error: {message}")]
    AccessError {
        /// Description of the error
        message: String,
    },

    /// Internal git2 error.
    #[error("git error: {message}")]
    Internal {
        /// The error message
        message: String,
    },
}

impl GitError {
    /// Create a GitError from a git2::Error with richer context.
    fn from_git2(err: git2::Error, context: &str) -> Self {
        match err.code() {
            git2::ErrorCode::NotFound => {
                if context.starts_with("refs/") || context.contains("ref") || context == "HEAD" {
                    GitError::RefNotFound {
                        refname: context.to_string(),
                    }
                } else {
                    GitError::ObjectNotFound {
                        oid: context.to_string(),
                    }
                }
            }
            git2::ErrorCode::UnbornBranch => GitError::RefNotFound {
                refname: context.to_string(),
            },
            git2::ErrorCode::InvalidSpec => GitError::InvalidOid {
                oid: context.to_string(),
            },
            git2::ErrorCode::Locked => GitError::AccessError {
                message: format!("repository is locked: {}", err.message()),
            },
            _ => GitError::Internal {
                message: format!("{}: {}", context, err.message()),
            },
        }
    }
}

impl From<git2::Error> for GitError {
    fn from(err: git2::Error) -> Self {
        match err.code() {
            git2::ErrorCode::NotFound => GitError::RefNotFound {
                refname: err.message().to_string(),
            },
            git2::ErrorCode::InvalidSpec => GitError::InvalidOid {
                oid: err.message().to_string(),
            },
            _ => GitError::Internal {
                message: err.message().to_string(),
            },
        }
    }
}

impl From<TypeError> for GitError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::InvalidOid(msg) => GitError::InvalidOid { oid: msg },
            TypeError::InvalidRefName(msg) => GitError::InvalidRefName { message: msg },
            TypeError::InvalidBookmarkName(msg) => GitError::InvalidRefName { message: msg },
        }
    }
}

/// Information about a Git repository.
#[derive(Debug, Clone)]
pub struct RepoInfo {
    /// Path to the per-worktree .git directory
    pub git_dir: PathBuf,
    /// Path to the shared .git directory (differs from git_dir in linked worktrees)
    pub common_dir: PathBuf,
    /// Path to working directory, `None` for stores without one
    pub work_dir: Option<PathBuf>,
}

/// A ref with its name and target OID.
#[derive(Debug, Clone)]
pub struct RefEntry {
    /// The full ref name
    pub name: RefName,
    /// The OID the ref points to
    pub oid: Oid,
}

/// The Git interface.
///
/// The only place that imports `git2`. A `Git` is either a working clone
/// (opened with [`Git::open`]) or a plain store that may be bare (opened
/// with [`Git::open_store`], used for remotes).
pub struct Git {
    repo: git2::Repository,
}

impl std::fmt::Debug for Git {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git")
            .field("path", &self.repo.path())
            .finish()
    }
}

fn to_git2_oid(oid: &Oid) -> Result<git2::Oid, GitError> {
    git2::Oid::from_str(oid.as_str()).map_err(|e| GitError::from_git2(e, oid.as_str()))
}

fn from_git2_oid(oid: git2::Oid) -> Result<Oid, GitError> {
    Oid::new(oid.to_string()).map_err(Into::into)
}

impl Git {
    // =========================================================================
    // Repository Opening and Info
    // =========================================================================

    /// Open the working clone containing `path`.
    ///
    /// Uses `git2::Repository::discover`, so `path` can be any directory
    /// within the clone.
    ///
    /// # Errors
    ///
    /// - [`GitError::NotARepo`] if no repository is found
    /// - [`GitError::BareRepo`] if the repository has no working directory
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let repo = git2::Repository::discover(path).map_err(|_| GitError::NotARepo {
            path: path.to_path_buf(),
        })?;

        if repo.is_bare() {
            return Err(GitError::BareRepo);
        }

        Ok(Self { repo })
    }

    /// Open the store at exactly `path`, bare or not.
    ///
    /// No upward discovery: a remote destination names its store precisely.
    pub fn open_store(path: &Path) -> Result<Self, GitError> {
        let repo = git2::Repository::open(path).map_err(|_| GitError::NotARepo {
            path: path.to_path_buf(),
        })?;
        Ok(Self { repo })
    }

    /// Create an empty, non-bare repository at `path`.
    pub fn init(path: &Path) -> Result<Self, GitError> {
        let repo = git2::Repository::init(path).map_err(|e| GitError::AccessError {
            message: format!("cannot initialize {}: {}", path.display(), e.message()),
        })?;
        Ok(Self { repo })
    }

    /// Get repository information.
    pub fn info(&self) -> RepoInfo {
        RepoInfo {
            git_dir: self.repo.path().to_path_buf(),
            common_dir: self.repo.commondir().to_path_buf(),
            work_dir: self.repo.workdir().map(Path::to_path_buf),
        }
    }

    /// Working directory of a clone.
    pub fn work_dir(&self) -> Result<&Path, GitError> {
        self.repo.workdir().ok_or(GitError::BareRepo)
    }

    // =========================================================================
    // Revision Resolution
    // =========================================================================

    /// Resolve a revision to the commit it names.
    ///
    /// `.` names the working copy's current revision (HEAD); anything else
    /// is handed to git's revision parser.
    ///
    /// # Errors
    ///
    /// - [`GitError::RefNotFound`] if the revision does not exist or HEAD is unborn
    pub fn resolve_revision(&self, rev: &str) -> Result<Oid, GitError> {
        let rev = if rev == "." { "HEAD" } else { rev };

        let object = self
            .repo
            .revparse_single(rev)
            .map_err(|e| match e.code() {
                git2::ErrorCode::NotFound | git2::ErrorCode::UnbornBranch => {
                    GitError::RefNotFound {
                        refname: rev.to_string(),
                    }
                }
                _ => GitError::from_git2(e, rev),
            })?;

        let commit = object
            .peel_to_commit()
            .map_err(|e| GitError::from_git2(e, rev))?;

        from_git2_oid(commit.id())
    }

    /// Resolve a ref to the commit it points at.
    pub fn resolve_ref(&self, refname: &str) -> Result<Oid, GitError> {
        let reference = self
            .repo
            .find_reference(refname)
            .map_err(|e| GitError::from_git2(e, refname))?;

        let oid = reference
            .peel_to_commit()
            .map_err(|e| GitError::from_git2(e, refname))?
            .id();

        from_git2_oid(oid)
    }

    /// Resolve a ref, returning None if it doesn't exist.
    pub fn try_resolve_ref(&self, refname: &str) -> Result<Option<Oid>, GitError> {
        match self.resolve_ref(refname) {
            Ok(oid) => Ok(Some(oid)),
            Err(GitError::RefNotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Check whether the store holds `oid` as a commit.
    pub fn has_commit(&self, oid: &Oid) -> Result<bool, GitError> {
        let git_oid = to_git2_oid(oid)?;
        Ok(self.repo.find_commit(git_oid).is_ok())
    }

    // =========================================================================
    // Ref Enumeration and the Native Bookmark Set
    // =========================================================================

    /// List all refs matching a prefix.
    pub fn list_refs_by_prefix(&self, prefix: &str) -> Result<Vec<RefEntry>, GitError> {
        let pattern = format!("{}*", prefix);
        let refs = self
            .repo
            .references_glob(&pattern)
            .map_err(|e| GitError::Internal {
                message: e.message().to_string(),
            })?;

        let mut entries = Vec::new();
        for reference in refs {
            let reference = reference.map_err(|e| GitError::Internal {
                message: e.message().to_string(),
            })?;

            // Skip refs with non-UTF8 or invalid names
            let Some(name) = reference.name() else {
                continue;
            };
            let Ok(ref_name) = RefName::new(name) else {
                continue;
            };

            let oid = match reference.peel_to_commit() {
                Ok(commit) => commit.id(),
                Err(_) => match reference.target() {
                    Some(oid) => oid,
                    None => continue,
                },
            };

            let Ok(oid) = from_git2_oid(oid) else {
                continue;
            };

            entries.push(RefEntry {
                name: ref_name,
                oid,
            });
        }

        Ok(entries)
    }

    /// List keys of a ref namespace with their targets.
    ///
    /// Keys are ref names with the `refs/<namespace>/` prefix removed.
    pub fn list_namespace(&self, namespace: &str) -> Result<BTreeMap<String, Oid>, GitError> {
        let prefix = format!("refs/{}/", namespace);
        Ok(self
            .list_refs_by_prefix(&prefix)?
            .into_iter()
            .filter_map(|entry| {
                entry
                    .name
                    .strip_prefix(&prefix)
                    .map(|key| (key.to_string(), entry.oid))
            })
            .collect())
    }

    /// Every ref under `refs/bookmarks/`, whatever its name.
    ///
    /// Matches on raw name bytes, so refs whose names are not UTF-8 or fail
    /// [`RefName`] validation are still included.
    fn native_bookmark_refs(&self) -> Result<Vec<git2::Reference<'_>>, GitError> {
        let prefix = format!("refs/{}/", BOOKMARKS_NAMESPACE);
        let refs = self.repo.references().map_err(|e| GitError::Internal {
            message: e.message().to_string(),
        })?;

        let mut found = Vec::new();
        for reference in refs {
            let reference = reference.map_err(|e| GitError::Internal {
                message: e.message().to_string(),
            })?;
            if reference.name_bytes().starts_with(prefix.as_bytes()) {
                found.push(reference);
            }
        }
        Ok(found)
    }

    /// Names of the clone's native bookmarks, sorted.
    ///
    /// Names that are not UTF-8 are rendered lossily.
    pub fn list_local_bookmarks(&self) -> Result<Vec<String>, GitError> {
        let prefix_len = format!("refs/{}/", BOOKMARKS_NAMESPACE).len();
        let mut names: Vec<String> = self
            .native_bookmark_refs()?
            .iter()
            .map(|reference| {
                String::from_utf8_lossy(&reference.name_bytes()[prefix_len..]).into_owned()
            })
            .collect();
        names.sort();
        Ok(names)
    }

    /// Delete every native bookmark, returning how many were removed.
    ///
    /// Ref deletion is durable on return; there is no separate write step.
    pub fn clear_local_bookmarks(&self) -> Result<usize, GitError> {
        let refs = self.native_bookmark_refs()?;
        let count = refs.len();
        for mut reference in refs {
            let name = String::from_utf8_lossy(reference.name_bytes()).into_owned();
            reference.delete().map_err(|e| GitError::from_git2(e, &name))?;
        }
        Ok(count)
    }

    // =========================================================================
    // CAS Ref Operations
    // =========================================================================

    /// Update a ref with compare-and-swap semantics.
    ///
    /// The ref is locked for the duration of the check and the write, so
    /// the update only lands if the current value still equals
    /// `expected_old` at the moment of writing. `None` means the ref must
    /// not exist yet.
    ///
    /// # Errors
    ///
    /// - [`GitError::CasFailed`] if the current value doesn't match expected
    /// - [`GitError::AccessError`] if another writer holds the ref lock
    pub fn update_ref_cas(
        &self,
        refname: &str,
        new_oid: &Oid,
        expected_old: Option<&Oid>,
        message: &str,
    ) -> Result<(), GitError> {
        let target = to_git2_oid(new_oid)?;

        let mut tx = self
            .repo
            .transaction()
            .map_err(|e| GitError::from_git2(e, refname))?;
        tx.lock_ref(refname)
            .map_err(|e| GitError::from_git2(e, refname))?;

        let current = self.try_resolve_ref_raw(refname)?;

        let describe = |value: Option<&str>| value.unwrap_or("<none>").to_string();
        let matches = match (expected_old, current.as_deref()) {
            (Some(expected), Some(actual)) => expected.as_str() == actual,
            (None, None) => true,
            _ => false,
        };
        if !matches {
            return Err(GitError::CasFailed {
                refname: refname.to_string(),
                expected: describe(expected_old.map(Oid::as_str)),
                actual: describe(current.as_deref()),
            });
        }

        tx.set_target(refname, target, None, message)
            .map_err(|e| GitError::from_git2(e, refname))?;
        tx.commit().map_err(|e| GitError::from_git2(e, refname))?;

        Ok(())
    }

    /// Delete a ref. Deleting a ref that does not exist is not an error.
    pub fn delete_ref(&self, refname: &str) -> Result<(), GitError> {
        match self.repo.find_reference(refname) {
            Ok(mut reference) => reference
                .delete()
                .map_err(|e| GitError::from_git2(e, refname)),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(()),
            Err(e) => Err(GitError::from_git2(e, refname)),
        }
    }

    /// Try to resolve a ref to its raw OID string (without validation).
    fn try_resolve_ref_raw(&self, refname: &str) -> Result<Option<String>, GitError> {
        match self.repo.find_reference(refname) {
            Ok(reference) => {
                let resolved = reference.resolve().unwrap_or(reference);
                let oid = resolved.target().ok_or_else(|| GitError::Internal {
                    message: format!("ref {} has no target", refname),
                })?;
                Ok(Some(oid.to_string()))
            }
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(GitError::from_git2(e, refname)),
        }
    }

    // =========================================================================
    // Ancestry Queries
    // =========================================================================

    /// Check if `ancestor` is an ancestor of `descendant`.
    ///
    /// Returns true if ancestor == descendant (a commit is its own ancestor).
    pub fn is_ancestor(&self, ancestor: &Oid, descendant: &Oid) -> Result<bool, GitError> {
        if ancestor == descendant {
            return Ok(true);
        }

        let ancestor_oid = to_git2_oid(ancestor)?;
        let descendant_oid = to_git2_oid(descendant)?;

        self.repo
            .graph_descendant_of(descendant_oid, ancestor_oid)
            .map_err(|e| GitError::Internal {
                message: e.message().to_string(),
            })
    }

    /// Count commits reachable from `tip` but not from `base`.
    ///
    /// With no `base`, counts all commits reachable from `tip`.
    pub fn commit_count(&self, base: Option<&Oid>, tip: &Oid) -> Result<usize, GitError> {
        let mut revwalk = self.repo.revwalk()?;
        revwalk.push(to_git2_oid(tip)?)?;
        if let Some(base) = base {
            revwalk.hide(to_git2_oid(base)?)?;
        }
        Ok(revwalk.count())
    }

    // =========================================================================
    // Working Copy
    // =========================================================================

    /// Detach HEAD at `oid` and force the working tree to match it.
    pub fn checkout_detached(&self, oid: &Oid) -> Result<(), GitError> {
        let git_oid = to_git2_oid(oid)?;
        self.repo
            .set_head_detached(git_oid)
            .map_err(|e| GitError::from_git2(e, oid.as_str()))?;

        let mut checkout = git2::build::CheckoutBuilder::new();
        checkout.force();
        self.repo
            .checkout_head(Some(&mut checkout))
            .map_err(|e| GitError::Internal {
                message: format!("checkout of {} failed: {}", oid.short(12), e.message()),
            })
    }

    // =========================================================================
    // Subrepositories
    // =========================================================================

    /// Committed submodule state of a revision: path to recorded commit.
    ///
    /// Only gitlinks recorded in the revision's tree count; submodules that
    /// are merely configured or checked out are ignored. The map iterates in
    /// lexicographic path order.
    pub fn substate(&self, revision: &Oid) -> Result<BTreeMap<String, Oid>, GitError> {
        let commit = self
            .repo
            .find_commit(to_git2_oid(revision)?)
            .map_err(|e| GitError::from_git2(e, revision.as_str()))?;
        let tree = commit.tree()?;

        let mut gitlinks = Vec::new();
        tree.walk(git2::TreeWalkMode::PreOrder, |root, entry| {
            if entry.kind() == Some(git2::ObjectType::Commit) {
                if let Some(name) = entry.name() {
                    gitlinks.push((format!("{}{}", root, name), entry.id()));
                }
            }
            git2::TreeWalkResult::Ok
        })?;

        gitlinks
            .into_iter()
            .map(|(path, oid)| from_git2_oid(oid).map(|oid| (path, oid)))
            .collect()
    }

    /// Open the checked-out submodule at `path` (relative to the work dir).
    pub fn open_subrepo(&self, path: &str) -> Result<Git, GitError> {
        let sub_dir = self.work_dir()?.join(path);
        let repo = git2::Repository::open(&sub_dir).map_err(|_| GitError::NotARepo {
            path: sub_dir.clone(),
        })?;
        Ok(Git { repo })
    }

    /// URL recorded for a submodule in `.gitmodules`.
    pub fn submodule_url(&self, path: &str) -> Result<Option<String>, GitError> {
        match self.repo.find_submodule(path) {
            Ok(submodule) => Ok(submodule.url().map(String::from)),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(GitError::from_git2(e, path)),
        }
    }

    // =========================================================================
    // Remote Operations
    // =========================================================================

    /// Get the URL for a remote.
    ///
    /// Returns `None` if the remote doesn't exist.
    pub fn remote_url(&self, name: &str) -> Result<Option<String>, GitError> {
        match self.repo.find_remote(name) {
            Ok(remote) => Ok(remote.url().map(String::from)),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(GitError::Internal {
                message: e.message().to_string(),
            }),
        }
    }

    /// Create remote `name` pointing at `url`, or repoint it if it exists.
    pub fn set_remote(&self, name: &str, url: &str) -> Result<(), GitError> {
        if self.remote_url(name)?.is_some() {
            self.repo.remote_set_url(name, url)?;
        } else {
            self.repo.remote(name, url)?;
        }
        Ok(())
    }

    /// Fetch `refspecs` from remote `name`. Tags are not followed.
    ///
    /// # Errors
    ///
    /// - [`GitError::RefNotFound`] if the remote is not configured
    /// - [`GitError::RemoteUnreachable`] if the transfer fails
    pub fn fetch_refspecs(&self, name: &str, refspecs: &[String]) -> Result<(), GitError> {
        let mut remote = self
            .repo
            .find_remote(name)
            .map_err(|_| GitError::RefNotFound {
                refname: format!("remote {}", name),
            })?;
        let url = crate::git::hide_password(remote.url().unwrap_or(name));

        let cfg = self.repo.config().ok();
        let mut callbacks = git2::RemoteCallbacks::new();
        callbacks.credentials(move |url, username_from_url, allowed| {
            if allowed.is_ssh_key() {
                if let Some(user) = username_from_url {
                    return git2::Cred::ssh_key_from_agent(user);
                }
            }
            if allowed.is_user_pass_plaintext() {
                if let Some(ref cfg) = cfg {
                    if let Ok(cred) = git2::Cred::credential_helper(cfg, url, username_from_url) {
                        return Ok(cred);
                    }
                }
            }
            git2::Cred::default()
        });

        let mut fetch_options = git2::FetchOptions::new();
        fetch_options.remote_callbacks(callbacks);
        fetch_options.download_tags(git2::AutotagOption::None);

        remote
            .fetch(refspecs, Some(&mut fetch_options), None)
            .map_err(|e| GitError::RemoteUnreachable {
                url,
                message: e.message().to_string(),
            })
    }

    // =========================================================================
    // Object Transfer
    // =========================================================================

    /// Copy the history of `tips` into `dest`, returning the number of
    /// objects written.
    ///
    /// Commits are written parents-first and each commit only after its
    /// tree, so a commit present in `dest` always has its full history
    /// there. Commits `dest` already holds are skipped. Gitlink entries
    /// are skipped; submodule history lives in the submodule's own store.
    pub fn copy_history_to(&self, dest: &Git, tips: &[Oid]) -> Result<usize, GitError> {
        let src_odb = self.repo.odb()?;
        let dst_odb = dest.repo.odb()?;

        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(git2::Sort::TOPOLOGICAL | git2::Sort::REVERSE)?;
        for tip in tips {
            revwalk.push(to_git2_oid(tip)?)?;
        }

        let mut copied = 0;
        for commit_id in revwalk {
            let commit_id = commit_id?;
            if dst_odb.exists(commit_id) {
                continue;
            }
            let commit = self.repo.find_commit(commit_id)?;
            self.copy_tree(&src_odb, &dst_odb, commit.tree_id(), &mut copied)?;
            copy_object(&src_odb, &dst_odb, commit_id, &mut copied)?;
        }

        Ok(copied)
    }

    fn copy_tree(
        &self,
        src: &git2::Odb<'_>,
        dst: &git2::Odb<'_>,
        tree_id: git2::Oid,
        copied: &mut usize,
    ) -> Result<(), GitError> {
        if dst.exists(tree_id) {
            return Ok(());
        }

        let tree = self.repo.find_tree(tree_id)?;
        for entry in tree.iter() {
            match entry.kind() {
                Some(git2::ObjectType::Tree) => self.copy_tree(src, dst, entry.id(), copied)?,
                Some(git2::ObjectType::Blob) => copy_object(src, dst, entry.id(), copied)?,
                _ => {}
            }
        }

        copy_object(src, dst, tree_id, copied)
    }
}

fn copy_object(
    src: &git2::Odb<'_>,
    dst: &git2::Odb<'_>,
    id: git2::Oid,
    copied: &mut usize,
) -> Result<(), GitError> {
    if dst.exists(id) {
        return Ok(());
    }
    let object = src
        .read(id)
        .map_err(|e| GitError::from_git2(e, &id.to_string()))?;
    dst.write(object.kind(), object.data())?;
    *copied += 1;
    Ok(())
}
