//! core::lock
//!
//! Exclusive working-area lock for a clone.
//!
//! The lock guards writes to the clone's private metadata area (currently
//! the tracking file). It is held only for the duration of a local write and
//! never across network I/O.
//!
//! # Storage
//!
//! - `<common_dir>/tether/lock` - Lock file with OS-level exclusive lock
//!
//! # Invariants
//!
//! - Lock is automatically released on drop (RAII pattern)
//! - Lock acquisition is non-blocking (fails fast if locked)
//! - Lock is shared across all worktrees of a clone
//!
//! # Example
//!
//! ```ignore
//! use tether::core::lock::RepoLock;
//!
//! let lock = RepoLock::acquire(&paths)?;
//! // ... write under the lock ...
//! drop(lock);
//! ```

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use thiserror::Error;

use crate::core::paths::TetherPaths;

/// Errors from locking operations.
#[derive(Debug, Error)]
pub enum LockError {
    /// Another process already holds the lock.
    #[error("working area is locked by another tether process")]
    AlreadyLocked,

    /// Failed to create lock file or directory.
    #[error("failed to create lock: {0}")]
    CreateFailed(String),

    /// Failed to acquire the OS lock.
    #[error("failed to acquire lock: {0}")]
    AcquireFailed(String),

    /// Failed to release the lock.
    #[error("failed to release lock: {0}")]
    ReleaseFailed(String),
}

/// An exclusive lock on a clone's working area.
///
/// Released when dropped, including on early returns and panics.
#[derive(Debug)]
pub struct RepoLock {
    path: PathBuf,
    /// Some while the lock is held.
    file: Option<File>,
}

impl RepoLock {
    /// Attempt to acquire the working-area lock.
    ///
    /// Uses OS-level file locking via `fs2`, which works across processes.
    /// Non-blocking: if another process holds the lock this returns
    /// [`LockError::AlreadyLocked`] immediately.
    pub fn acquire(paths: &TetherPaths) -> Result<Self, LockError> {
        let tether_dir = paths.tether_dir();
        fs::create_dir_all(&tether_dir).map_err(|e| {
            LockError::CreateFailed(format!("cannot create {}: {}", tether_dir.display(), e))
        })?;

        let path = paths.lock_path();

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| {
                LockError::CreateFailed(format!("cannot open {}: {}", path.display(), e))
            })?;

        match file.try_lock_exclusive() {
            Ok(()) => Ok(Self {
                path,
                file: Some(file),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Err(LockError::AlreadyLocked),
            Err(e) => Err(LockError::AcquireFailed(e.to_string())),
        }
    }

    /// Try to acquire the lock, returning None if already held.
    pub fn try_acquire(paths: &TetherPaths) -> Result<Option<Self>, LockError> {
        match Self::acquire(paths) {
            Ok(lock) => Ok(Some(lock)),
            Err(LockError::AlreadyLocked) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Check if the lock is currently held.
    pub fn is_held(&self) -> bool {
        self.file.is_some()
    }

    /// Get the path to the lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the lock explicitly.
    ///
    /// Called automatically on drop. Releasing twice is a no-op.
    pub fn release(&mut self) -> Result<(), LockError> {
        if let Some(file) = self.file.take() {
            file.unlock()
                .map_err(|e| LockError::ReleaseFailed(e.to_string()))?;
        }
        Ok(())
    }
}

impl Drop for RepoLock {
    fn drop(&mut self) {
        if let Some(file) = self.file.take() {
            let _ = file.unlock();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_paths(dir: &Path) -> TetherPaths {
        TetherPaths::new(dir.to_path_buf(), dir.to_path_buf())
    }

    #[test]
    fn acquire_creates_tether_directory() {
        let temp = TempDir::new().unwrap();
        let paths = test_paths(temp.path());
        assert!(!paths.tether_dir().exists());

        let lock = RepoLock::acquire(&paths).expect("acquire lock");
        assert!(lock.is_held());
        assert!(paths.tether_dir().exists());
        assert_eq!(lock.path(), paths.lock_path());
    }

    #[test]
    fn second_acquire_fails_fast() {
        let temp = TempDir::new().unwrap();
        let paths = test_paths(temp.path());

        let _held = RepoLock::acquire(&paths).expect("first acquire");
        let result = RepoLock::acquire(&paths);
        assert!(matches!(result, Err(LockError::AlreadyLocked)));
    }

    #[test]
    fn released_on_drop() {
        let temp = TempDir::new().unwrap();
        let paths = test_paths(temp.path());

        {
            let _lock = RepoLock::acquire(&paths).expect("first acquire");
        }

        let again = RepoLock::acquire(&paths).expect("second acquire");
        assert!(again.is_held());
    }

    #[test]
    fn explicit_release_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let paths = test_paths(temp.path());

        let mut lock = RepoLock::acquire(&paths).expect("acquire");
        lock.release().expect("first release");
        lock.release().expect("second release");
        assert!(!lock.is_held());

        assert!(RepoLock::try_acquire(&paths).unwrap().is_some());
    }

    #[test]
    fn try_acquire_returns_none_when_locked() {
        let temp = TempDir::new().unwrap();
        let paths = test_paths(temp.path());

        let _held = RepoLock::acquire(&paths).expect("acquire");
        assert!(RepoLock::try_acquire(&paths).unwrap().is_none());
    }

    #[test]
    fn worktree_shares_lock_with_parent() {
        let temp = TempDir::new().unwrap();
        let common_dir = temp.path().to_path_buf();
        let main_paths = TetherPaths::new(common_dir.clone(), common_dir.clone());
        let worktree_paths =
            TetherPaths::new(common_dir.join("worktrees").join("feature"), common_dir);

        let _held = RepoLock::acquire(&main_paths).expect("acquire from main");
        assert!(matches!(
            RepoLock::acquire(&worktree_paths),
            Err(LockError::AlreadyLocked)
        ));
    }
}
