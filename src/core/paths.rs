//! core::paths
//!
//! Centralized path routing for tether storage locations.
//!
//! All tether state for a clone lives in its private metadata area,
//! `<common_dir>/tether/`, so linked worktrees of the same clone share a
//! single tracked bookmark and a single lock:
//! - `bookmark` - The tracked bookmark name (one line of UTF-8 text)
//! - `lock` - Exclusive working-area lock
//! - `config.toml` - Repository configuration
//!
//! **Hard rule:** No code outside this module computes `*.join("tether")`.
//!
//! # Example
//!
//! ```
//! use tether::core::paths::TetherPaths;
//! use std::path::PathBuf;
//!
//! let paths = TetherPaths::new(
//!     PathBuf::from("/repo/.git"),
//!     PathBuf::from("/repo/.git"),
//! );
//!
//! assert_eq!(
//!     paths.tracking_file_path(),
//!     PathBuf::from("/repo/.git/tether/bookmark")
//! );
//! ```

use std::path::{Path, PathBuf};

use crate::git::RepoInfo;

/// Centralized path routing for tether storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TetherPaths {
    /// Path to the per-worktree .git directory.
    pub git_dir: PathBuf,

    /// Path to the shared git directory (refs, objects, config).
    /// For normal repos, this equals git_dir.
    pub common_dir: PathBuf,
}

impl TetherPaths {
    /// Create a new TetherPaths from git_dir and common_dir.
    pub fn new(git_dir: PathBuf, common_dir: PathBuf) -> Self {
        Self {
            git_dir,
            common_dir,
        }
    }

    /// Create TetherPaths from a RepoInfo.
    pub fn from_repo_info(info: &RepoInfo) -> Self {
        Self {
            git_dir: info.git_dir.clone(),
            common_dir: info.common_dir.clone(),
        }
    }

    /// Root tether directory under common_dir.
    pub fn tether_dir(&self) -> PathBuf {
        self.common_dir.join("tether")
    }

    /// File recording the tracked bookmark.
    pub fn tracking_file_path(&self) -> PathBuf {
        self.tether_dir().join("bookmark")
    }

    /// Temporary file the tracked bookmark is staged in before the rename.
    pub fn tracking_temp_path(&self) -> PathBuf {
        self.tether_dir().join("bookmark.tmp")
    }

    /// Exclusive working-area lock file.
    pub fn lock_path(&self) -> PathBuf {
        self.tether_dir().join("lock")
    }

    /// Repository configuration file.
    pub fn config_path(&self) -> PathBuf {
        self.tether_dir().join("config.toml")
    }

    /// Check if this is a linked worktree (common_dir != git_dir).
    pub fn is_worktree(&self) -> bool {
        self.git_dir != self.common_dir
    }

    /// Get the common_dir as a Path reference.
    pub fn common_dir(&self) -> &Path {
        &self.common_dir
    }
}
