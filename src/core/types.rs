//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`BookmarkName`] - Validated bookmark name
//! - [`Oid`] - Git object identifier (SHA)
//! - [`RefName`] - Validated Git reference name
//!
//! # Validation
//!
//! These types enforce validity at construction time. Invalid values
//! cannot be represented, so a bookmark that made it into a `BookmarkName`
//! can always be turned into `refs/bookmarks/<name>`.
//!
//! # Examples
//!
//! ```
//! use tether::core::types::{BookmarkName, Oid, RefName};
//!
//! let bookmark = BookmarkName::new("release/1.x").unwrap();
//! let oid = Oid::new("abc123def4567890abc123def4567890abc12345").unwrap();
//! let refname = RefName::for_bookmark(&bookmark);
//! assert_eq!(refname.as_str(), "refs/bookmarks/release/1.x");
//!
//! assert!(BookmarkName::new("invalid..name").is_err());
//! assert!(Oid::new("not-a-sha").is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Ref namespace holding bookmarks, both locally and on remotes.
pub const BOOKMARKS_NAMESPACE: &str = "bookmarks";

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid bookmark name: {0}")]
    InvalidBookmarkName(String),

    #[error("invalid object id: {0}")]
    InvalidOid(String),

    #[error("invalid ref name: {0}")]
    InvalidRefName(String),
}

/// A validated bookmark name.
///
/// Bookmarks live under `refs/bookmarks/`, so names follow Git's refname
/// rules (see `git check-ref-format`):
/// - Cannot be empty
/// - Cannot start with `.`, `-` or `/`
/// - Cannot end with `.lock` or `/`
/// - Cannot contain `..`, `@{`, `//`, or ASCII control characters
/// - Cannot contain spaces, `~`, `^`, `:`, `\`, `?`, `*`, `[`
/// - Cannot be exactly `@`
///
/// Surrounding whitespace is trimmed before validation, the same way the
/// tracking file is read back.
///
/// # Example
///
/// ```
/// use tether::core::types::BookmarkName;
///
/// let name = BookmarkName::new("feature").unwrap();
/// assert_eq!(name.as_str(), "feature");
///
/// let trimmed = BookmarkName::new("  stable\n").unwrap();
/// assert_eq!(trimmed.as_str(), "stable");
///
/// assert!(BookmarkName::new("").is_err());
/// assert!(BookmarkName::new("has space").is_err());
/// assert!(BookmarkName::new("@").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BookmarkName(String);

impl BookmarkName {
    /// Create a new validated bookmark name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidBookmarkName` if the name violates Git's refname rules.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        let name = name.trim();
        Self::validate(name)?;
        Ok(Self(name.to_string()))
    }

    fn validate(name: &str) -> Result<(), TypeError> {
        if name.is_empty() {
            return Err(TypeError::InvalidBookmarkName(
                "bookmark name cannot be empty".into(),
            ));
        }

        if name == "@" {
            return Err(TypeError::InvalidBookmarkName(
                "bookmark name cannot be '@' (reserved)".into(),
            ));
        }

        if name.starts_with('.') {
            return Err(TypeError::InvalidBookmarkName(
                "bookmark name cannot start with '.'".into(),
            ));
        }
        if name.starts_with('-') {
            return Err(TypeError::InvalidBookmarkName(
                "bookmark name cannot start with '-'".into(),
            ));
        }

        if name.ends_with(".lock") {
            return Err(TypeError::InvalidBookmarkName(
                "bookmark name cannot end with '.lock'".into(),
            ));
        }
        if name.starts_with('/') || name.ends_with('/') {
            return Err(TypeError::InvalidBookmarkName(
                "bookmark name cannot start or end with '/'".into(),
            ));
        }

        for pattern in ["..", "@{", "//"] {
            if name.contains(pattern) {
                return Err(TypeError::InvalidBookmarkName(format!(
                    "bookmark name cannot contain '{pattern}'"
                )));
            }
        }

        const INVALID_CHARS: [char; 8] = [' ', '~', '^', ':', '\\', '?', '*', '['];
        for c in INVALID_CHARS {
            if name.contains(c) {
                return Err(TypeError::InvalidBookmarkName(format!(
                    "bookmark name cannot contain '{c}'"
                )));
            }
        }

        if name.chars().any(|c| c.is_ascii_control()) {
            return Err(TypeError::InvalidBookmarkName(
                "bookmark name cannot contain control characters".into(),
            ));
        }

        for component in name.split('/') {
            if component.starts_with('.') {
                return Err(TypeError::InvalidBookmarkName(
                    "path component cannot start with '.'".into(),
                ));
            }
            if component.ends_with(".lock") {
                return Err(TypeError::InvalidBookmarkName(
                    "path component cannot end with '.lock'".into(),
                ));
            }
        }

        Ok(())
    }

    /// Get the bookmark name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for BookmarkName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl std::str::FromStr for BookmarkName {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl From<BookmarkName> for String {
    fn from(name: BookmarkName) -> Self {
        name.0
    }
}

impl AsRef<str> for BookmarkName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BookmarkName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A Git object identifier (SHA-1 or SHA-256).
///
/// OIDs are normalized to lowercase so that identifiers read from a remote
/// listing compare equal to identifiers resolved locally.
///
/// # Example
///
/// ```
/// use tether::core::types::Oid;
///
/// let oid = Oid::new("ABC123DEF4567890ABC123DEF4567890ABC12345").unwrap();
/// assert_eq!(oid.as_str(), "abc123def4567890abc123def4567890abc12345");
/// assert_eq!(oid.short(7), "abc123d");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Oid(String);

impl Oid {
    /// Create a new validated object id.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidOid` if the string is not a valid hex OID.
    pub fn new(oid: impl Into<String>) -> Result<Self, TypeError> {
        let oid = oid.into().to_ascii_lowercase();
        Self::validate(&oid)?;
        Ok(Self(oid))
    }

    /// Get an abbreviated form of the OID.
    ///
    /// Returns the first `len` characters, or the full OID if shorter.
    pub fn short(&self, len: usize) -> &str {
        let end = len.min(self.0.len());
        &self.0[..end]
    }

    fn validate(oid: &str) -> Result<(), TypeError> {
        // SHA-1 is 40 hex chars, SHA-256 is 64
        if oid.len() != 40 && oid.len() != 64 {
            return Err(TypeError::InvalidOid(format!(
                "expected 40 or 64 hex characters, got {}",
                oid.len()
            )));
        }
        if !oid.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TypeError::InvalidOid(
                "object id must be hexadecimal".into(),
            ));
        }
        Ok(())
    }

    /// Get the object id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Oid {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Oid> for String {
    fn from(oid: Oid) -> Self {
        oid.0
    }
}

impl AsRef<str> for Oid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Oid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated Git reference name.
///
/// # Example
///
/// ```
/// use tether::core::types::{BookmarkName, RefName};
///
/// let bookmark = BookmarkName::new("feature/foo").unwrap();
/// let refname = RefName::for_bookmark(&bookmark);
/// assert_eq!(refname.as_str(), "refs/bookmarks/feature/foo");
/// assert_eq!(refname.strip_prefix("refs/bookmarks/"), Some("feature/foo"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RefName(String);

impl RefName {
    /// Create a new validated ref name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidRefName` if the name violates Git's refname rules.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    /// Ref for a key inside a namespace (`refs/<namespace>/<key>`).
    ///
    /// This is how remote listings and pushkey calls address keys.
    pub fn in_namespace(namespace: &str, key: &str) -> Result<Self, TypeError> {
        Self::new(format!("refs/{namespace}/{key}"))
    }

    /// Ref holding a bookmark (`refs/bookmarks/<name>`).
    pub fn for_bookmark(bookmark: &BookmarkName) -> Self {
        // Bookmark names are validated against the same rules
        Self(format!("refs/{}/{}", BOOKMARKS_NAMESPACE, bookmark.as_str()))
    }

    /// Remote-tracking ref that `pull` fetches a bookmark into.
    ///
    /// ```
    /// use tether::core::types::{BookmarkName, RefName};
    ///
    /// let bookmark = BookmarkName::new("main").unwrap();
    /// assert_eq!(
    ///     RefName::for_pulled_bookmark("default", &bookmark).as_str(),
    ///     "refs/remotes/default/bookmarks/main"
    /// );
    /// ```
    pub fn for_pulled_bookmark(remote: &str, bookmark: &BookmarkName) -> Self {
        Self(format!(
            "refs/remotes/{}/{}/{}",
            remote,
            BOOKMARKS_NAMESPACE,
            bookmark.as_str()
        ))
    }

    /// Strip a prefix from the ref name and return the remainder.
    pub fn strip_prefix(&self, prefix: &str) -> Option<&str> {
        self.0.strip_prefix(prefix)
    }

    fn validate(name: &str) -> Result<(), TypeError> {
        if name.is_empty() {
            return Err(TypeError::InvalidRefName("ref name cannot be empty".into()));
        }

        if name == "HEAD" {
            return Ok(());
        }

        if !name.starts_with("refs/") {
            return Err(TypeError::InvalidRefName(format!(
                "ref name must start with 'refs/': {name}"
            )));
        }

        if name.ends_with('/') || name.ends_with(".lock") {
            return Err(TypeError::InvalidRefName(format!(
                "ref name has an invalid suffix: {name}"
            )));
        }

        for pattern in ["..", "@{", "//"] {
            if name.contains(pattern) {
                return Err(TypeError::InvalidRefName(format!(
                    "ref name cannot contain '{pattern}'"
                )));
            }
        }

        const INVALID_CHARS: [char; 8] = [' ', '~', '^', ':', '\\', '?', '*', '['];
        if name
            .chars()
            .any(|c| c.is_ascii_control() || INVALID_CHARS.contains(&c))
        {
            return Err(TypeError::InvalidRefName(format!(
                "ref name contains invalid characters: {name:?}"
            )));
        }

        if name
            .split('/')
            .any(|c| c.is_empty() || c.starts_with('.') || c.ends_with(".lock"))
        {
            return Err(TypeError::InvalidRefName(format!(
                "ref name has an invalid component: {name}"
            )));
        }

        Ok(())
    }

    /// Get the ref name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RefName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<RefName> for String {
    fn from(name: RefName) -> Self {
        name.0
    }
}

impl AsRef<str> for RefName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RefName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod bookmark_name {
        use super::*;

        #[test]
        fn valid_names() {
            assert!(BookmarkName::new("main").is_ok());
            assert!(BookmarkName::new("feature/foo").is_ok());
            assert!(BookmarkName::new("fix-123").is_ok());
            assert!(BookmarkName::new("user@feature").is_ok());
            assert!(BookmarkName::new("with.dot").is_ok());
        }

        #[test]
        fn surrounding_whitespace_trimmed() {
            let name = BookmarkName::new("\tfeature \r\n").unwrap();
            assert_eq!(name.as_str(), "feature");
        }

        #[test]
        fn empty_and_blank_rejected() {
            assert!(BookmarkName::new("").is_err());
            assert!(BookmarkName::new("   ").is_err());
            assert!(BookmarkName::new("\n").is_err());
        }

        #[test]
        fn leading_dot_or_dash_rejected() {
            assert!(BookmarkName::new(".hidden").is_err());
            assert!(BookmarkName::new("foo/.hidden").is_err());
            assert!(BookmarkName::new("-flag").is_err());
        }

        #[test]
        fn bad_suffixes_rejected() {
            assert!(BookmarkName::new("name.lock").is_err());
            assert!(BookmarkName::new("foo/bar.lock").is_err());
            assert!(BookmarkName::new("name/").is_err());
        }

        #[test]
        fn bad_sequences_rejected() {
            assert!(BookmarkName::new("bad..path").is_err());
            assert!(BookmarkName::new("foo@{bar").is_err());
            assert!(BookmarkName::new("foo//bar").is_err());
            assert!(BookmarkName::new("@").is_err());
        }

        #[test]
        fn special_chars_rejected() {
            for name in [
                "has space", "has~tilde", "has^caret", "has:colon", "has\\slash", "has?q",
                "has*star", "has[bracket", "has\ttab",
            ] {
                assert!(BookmarkName::new(name).is_err(), "{name:?} should be rejected");
            }
        }

        #[test]
        fn parses_from_str() {
            let name: BookmarkName = "stable".parse().unwrap();
            assert_eq!(name.to_string(), "stable");
        }

        #[test]
        fn serde_roundtrip() {
            let name = BookmarkName::new("feature/test").unwrap();
            let json = serde_json::to_string(&name).unwrap();
            let parsed: BookmarkName = serde_json::from_str(&json).unwrap();
            assert_eq!(name, parsed);
        }

        #[test]
        fn serde_rejects_invalid() {
            let parsed: Result<BookmarkName, _> = serde_json::from_str("\"bad..name\"");
            assert!(parsed.is_err());
        }
    }

    mod oid {
        use super::*;

        #[test]
        fn sha1_and_sha256_lengths() {
            assert!(Oid::new("a".repeat(40)).is_ok());
            assert!(Oid::new("b".repeat(64)).is_ok());
            assert!(Oid::new("c".repeat(41)).is_err());
        }

        #[test]
        fn normalized_to_lowercase() {
            let upper = Oid::new("ABCDEF0123456789ABCDEF0123456789ABCDEF01").unwrap();
            let lower = Oid::new("abcdef0123456789abcdef0123456789abcdef01").unwrap();
            assert_eq!(upper, lower);
        }

        #[test]
        fn non_hex_rejected() {
            assert!(Oid::new("g".repeat(40)).is_err());
        }

        #[test]
        fn short_clamps_to_length() {
            let oid = Oid::new("a".repeat(40)).unwrap();
            assert_eq!(oid.short(7).len(), 7);
            assert_eq!(oid.short(100).len(), 40);
        }
    }

    mod ref_name {
        use super::*;

        #[test]
        fn namespace_refs() {
            let r = RefName::in_namespace("bookmarks", "main").unwrap();
            assert_eq!(r.as_str(), "refs/bookmarks/main");
        }

        #[test]
        fn namespace_rejects_bad_keys() {
            assert!(RefName::in_namespace("bookmarks", "").is_err());
            assert!(RefName::in_namespace("bookmarks", "a..b").is_err());
            assert!(RefName::in_namespace("bookmarks", "a b").is_err());
        }

        #[test]
        fn must_live_under_refs() {
            assert!(RefName::new("heads/main").is_err());
            assert!(RefName::new("HEAD").is_ok());
        }

        #[test]
        fn pulled_bookmark_ref_lives_under_the_remote() {
            let b = BookmarkName::new("main").unwrap();
            let r = RefName::for_pulled_bookmark("default", &b);
            assert_eq!(r.as_str(), "refs/remotes/default/bookmarks/main");
            assert_eq!(r.strip_prefix("refs/bookmarks/"), None);
        }
    }
}
