//! core::tracking
//!
//! The tracking file: which remote bookmark a clone follows.
//!
//! # Storage
//!
//! `<common_dir>/tether/bookmark` holds the bookmark name as a single line
//! of UTF-8 text with no trailing structure. Only the first line is
//! significant when reading.
//!
//! # Invariants
//!
//! - Writes happen under the clone's [`RepoLock`]
//! - Writes are atomic (temp file + rename); readers never see a partial name
//! - A successfully read name is never empty

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::PathBuf;

use thiserror::Error;

use crate::core::lock::{LockError, RepoLock};
use crate::core::paths::TetherPaths;
use crate::core::types::BookmarkName;

/// Errors from reading or writing the tracking file.
#[derive(Debug, Error)]
pub enum TrackingError {
    /// No tracking file exists; the clone was not created by `tether clone`.
    #[error("missing bookmark file: {path}")]
    Missing { path: PathBuf },

    /// The tracking file exists but holds no usable bookmark name.
    #[error("can't read bookmark file: {path}")]
    Unreadable { path: PathBuf },

    /// The working area could not be locked for the write.
    #[error(transparent)]
    Lock(#[from] LockError),

    #[error("bookmark file i/o error at {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
}

/// Read the bookmark a clone tracks.
///
/// # Errors
///
/// - [`TrackingError::Missing`] if the file does not exist
/// - [`TrackingError::Unreadable`] if its first line is empty, not UTF-8,
///   or not a valid bookmark name
pub fn read(paths: &TetherPaths) -> Result<BookmarkName, TrackingError> {
    let path = paths.tracking_file_path();

    let mut file = match File::open(&path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(TrackingError::Missing { path });
        }
        Err(source) => return Err(TrackingError::Io { path, source }),
    };

    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)
        .map_err(|source| TrackingError::Io {
            path: path.clone(),
            source,
        })?;
    drop(file);

    let Ok(contents) = String::from_utf8(bytes) else {
        return Err(TrackingError::Unreadable { path });
    };
    let first_line = contents.lines().next().unwrap_or("");

    BookmarkName::new(first_line).map_err(|_| TrackingError::Unreadable { path })
}

/// Read the tracking file if present.
///
/// Returns `Ok(None)` when the file does not exist; other failures propagate.
pub fn try_read(paths: &TetherPaths) -> Result<Option<BookmarkName>, TrackingError> {
    match read(paths) {
        Ok(bookmark) => Ok(Some(bookmark)),
        Err(TrackingError::Missing { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Record the bookmark a clone tracks.
///
/// Holds the working-area lock for the duration of the write and replaces
/// the file atomically.
pub fn write(paths: &TetherPaths, bookmark: &BookmarkName) -> Result<(), TrackingError> {
    let _lock = RepoLock::acquire(paths)?;

    let path = paths.tracking_file_path();
    let temp_path = paths.tracking_temp_path();
    let io_err = |path: &PathBuf| {
        let path = path.clone();
        move |source: io::Error| TrackingError::Io { path, source }
    };

    let mut file = File::create(&temp_path).map_err(io_err(&temp_path))?;
    file.write_all(bookmark.as_str().as_bytes())
        .map_err(io_err(&temp_path))?;
    file.sync_all().map_err(io_err(&temp_path))?;
    drop(file);

    fs::rename(&temp_path, &path).map_err(io_err(&path))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, TetherPaths) {
        let temp = TempDir::new().unwrap();
        let paths = TetherPaths::new(temp.path().to_path_buf(), temp.path().to_path_buf());
        (temp, paths)
    }

    fn write_raw(paths: &TetherPaths, contents: &[u8]) {
        fs::create_dir_all(paths.tether_dir()).unwrap();
        fs::write(paths.tracking_file_path(), contents).unwrap();
    }

    #[test]
    fn write_then_read_roundtrip() {
        let (_temp, paths) = setup();
        let bookmark = BookmarkName::new("feature").unwrap();

        write(&paths, &bookmark).unwrap();
        assert_eq!(read(&paths).unwrap(), bookmark);
    }

    #[test]
    fn write_stores_a_single_bare_line() {
        let (_temp, paths) = setup();
        write(&paths, &BookmarkName::new("stable").unwrap()).unwrap();

        let raw = fs::read_to_string(paths.tracking_file_path()).unwrap();
        assert_eq!(raw, "stable");
        assert!(!paths.tracking_temp_path().exists());
    }

    #[test]
    fn write_replaces_previous_value() {
        let (_temp, paths) = setup();
        write(&paths, &BookmarkName::new("a-rather-long-bookmark").unwrap()).unwrap();
        write(&paths, &BookmarkName::new("short").unwrap()).unwrap();

        assert_eq!(read(&paths).unwrap().as_str(), "short");
    }

    #[test]
    fn missing_file() {
        let (_temp, paths) = setup();
        assert!(matches!(read(&paths), Err(TrackingError::Missing { .. })));
        assert!(try_read(&paths).unwrap().is_none());
    }

    #[test]
    fn empty_file_is_unreadable() {
        let (_temp, paths) = setup();
        write_raw(&paths, b"");
        assert!(matches!(read(&paths), Err(TrackingError::Unreadable { .. })));
    }

    #[test]
    fn blank_first_line_is_unreadable() {
        let (_temp, paths) = setup();
        write_raw(&paths, b"\nfeature\n");
        assert!(matches!(read(&paths), Err(TrackingError::Unreadable { .. })));
    }

    #[test]
    fn non_utf8_is_unreadable() {
        let (_temp, paths) = setup();
        write_raw(&paths, &[0xff, 0xfe, 0x00]);
        assert!(matches!(read(&paths), Err(TrackingError::Unreadable { .. })));
    }

    #[test]
    fn only_first_line_is_used_and_trimmed() {
        let (_temp, paths) = setup();
        write_raw(&paths, b"  release \r\nignored\n");
        assert_eq!(read(&paths).unwrap().as_str(), "release");
    }

    #[test]
    fn write_fails_while_locked() {
        let (_temp, paths) = setup();
        let _held = RepoLock::acquire(&paths).unwrap();

        let result = write(&paths, &BookmarkName::new("feature").unwrap());
        assert!(matches!(
            result,
            Err(TrackingError::Lock(LockError::AlreadyLocked))
        ));
        assert!(!paths.tracking_file_path().exists());
    }

    #[test]
    fn lock_released_after_write() {
        let (_temp, paths) = setup();
        write(&paths, &BookmarkName::new("feature").unwrap()).unwrap();
        assert!(RepoLock::try_acquire(&paths).unwrap().is_some());
    }
}
