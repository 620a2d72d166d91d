//! Property-based tests for core domain types.
//!
//! These tests use proptest to verify invariants hold across
//! randomly generated inputs.

use std::path::PathBuf;

use proptest::prelude::*;
use tempfile::TempDir;

use tether::core::paths::TetherPaths;
use tether::core::tracking;
use tether::core::types::{BookmarkName, Oid, RefName};
use tether::engine::{decide, PushDecision};

/// Strategy for generating valid bookmark name characters.
fn bookmark_name_char() -> impl Strategy<Value = char> {
    prop_oneof![
        prop::char::range('a', 'z'),
        prop::char::range('A', 'Z'),
        prop::char::range('0', '9'),
        Just('-'),
        Just('_'),
        Just('.'),
        Just('/'),
    ]
}

/// Strategy for generating valid bookmark names.
fn valid_bookmark_name() -> impl Strategy<Value = String> {
    prop::collection::vec(bookmark_name_char(), 1..50).prop_filter_map(
        "must be valid bookmark name",
        |chars| {
            let name: String = chars.into_iter().collect();
            if name.starts_with('-')
                || name.starts_with('/')
                || name.ends_with('/')
                || name.contains("..")
                || name.contains("//")
                || name
                    .split('/')
                    .any(|c| c.starts_with('.') || c.ends_with(".lock"))
            {
                None
            } else {
                Some(name)
            }
        },
    )
}

/// Strategy for generating valid OID strings (40 hex chars, mixed case).
fn valid_oid_string() -> impl Strategy<Value = String> {
    "[0-9a-fA-F]{40}"
}

fn arb_oid() -> impl Strategy<Value = Oid> {
    "[0-9a-f]{40}".prop_map(|s| Oid::new(s).unwrap())
}

proptest! {
    /// BookmarkName serialization round-trips through JSON.
    #[test]
    fn bookmark_name_serde_roundtrip(name in valid_bookmark_name()) {
        let bookmark = BookmarkName::new(&name).unwrap();
        let json = serde_json::to_string(&bookmark).unwrap();
        let parsed: BookmarkName = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(bookmark, parsed);
    }

    /// Invalid names are rejected on deserialization too.
    #[test]
    fn bookmark_name_serde_rejects_invalid(
        prefix in valid_bookmark_name(),
        bad in prop_oneof![Just(".."), Just(" "), Just("~"), Just(":"), Just("@{")],
    ) {
        let json = serde_json::to_string(&format!("{prefix}{bad}x")).unwrap();
        prop_assert!(serde_json::from_str::<BookmarkName>(&json).is_err());
    }

    /// OIDs are normalized to lowercase.
    #[test]
    fn oid_normalized_to_lowercase(oid_str in valid_oid_string()) {
        let oid = Oid::new(&oid_str).unwrap();
        prop_assert_eq!(oid.as_str(), oid_str.to_lowercase());
        prop_assert_eq!(oid, Oid::new(oid_str.to_uppercase()).unwrap());
    }

    /// Short OID is always a prefix of the full OID.
    #[test]
    fn oid_short_is_prefix(oid_str in valid_oid_string(), len in 1usize..50) {
        let oid = Oid::new(oid_str).unwrap();
        let short = oid.short(len);
        prop_assert!(oid.as_str().starts_with(short));
        prop_assert_eq!(short.len(), len.min(40));
    }

    /// Bookmark refs and pulled refs are built from the same name.
    #[test]
    fn bookmark_refnames(name in valid_bookmark_name()) {
        let bookmark = BookmarkName::new(&name).unwrap();

        let native = RefName::for_bookmark(&bookmark);
        prop_assert_eq!(native.strip_prefix("refs/bookmarks/"), Some(bookmark.as_str()));
        prop_assert_eq!(
            RefName::in_namespace("bookmarks", bookmark.as_str()).unwrap(),
            native
        );

        let pulled = RefName::for_pulled_bookmark("default", &bookmark);
        prop_assert_eq!(pulled.strip_prefix("refs/bookmarks/"), None);
        prop_assert_eq!(
            pulled.strip_prefix("refs/remotes/default/bookmarks/"),
            Some(bookmark.as_str())
        );
    }

    /// Whatever is written to the tracking file reads back unchanged.
    #[test]
    fn tracking_file_roundtrip(first in valid_bookmark_name(), second in valid_bookmark_name()) {
        let dir = TempDir::new().unwrap();
        let paths = TetherPaths::new(dir.path().join(".git"), dir.path().join(".git"));

        prop_assert_eq!(tracking::try_read(&paths).unwrap(), None);

        let first = BookmarkName::new(first).unwrap();
        tracking::write(&paths, &first).unwrap();
        prop_assert_eq!(tracking::read(&paths).unwrap(), first);

        // Rewrites replace the whole file, never append
        let second = BookmarkName::new(second).unwrap();
        tracking::write(&paths, &second).unwrap();
        prop_assert_eq!(tracking::read(&paths).unwrap(), second);
        prop_assert!(!paths.tracking_temp_path().exists());
    }

    /// A push never moves a bookmark it did not find unless asked to create it,
    /// and never rewinds one unless forced.
    #[test]
    fn decide_is_conservative(
        old in proptest::option::of(arb_oid()),
        new in arb_oid(),
        ff in any::<bool>(),
        force in any::<bool>(),
        new_bookmark in any::<bool>(),
    ) {
        let decision = decide(old.as_ref(), &new, ff, force, new_bookmark);
        match decision {
            PushDecision::Create => prop_assert!(old.is_none() && new_bookmark),
            PushDecision::Forced => prop_assert!(force && !ff),
            PushDecision::NoOp => prop_assert_eq!(old.as_ref(), Some(&new)),
            PushDecision::FastForward => prop_assert!(ff && old.is_some()),
            PushDecision::RejectUnknown => prop_assert!(old.is_none() && !new_bookmark),
            PushDecision::RejectNonFastForward => prop_assert!(!ff && !force),
        }
    }
}

// =============================================================================
// Determinism Tests
// =============================================================================

mod determinism_tests {
    use super::*;

    #[test]
    fn bookmark_name_validation_consistent() {
        let valid = ["main", "feature/foo", "release-1.0", "a_b", "x.y/z"];
        let invalid = ["", "@", ".hidden", "-flag", "a..b", "a//b", "a b", "a.lock", "a/", "/a"];

        for _ in 0..100 {
            for name in valid {
                assert!(BookmarkName::new(name).is_ok(), "{name} should be valid");
            }
            for name in invalid {
                assert!(BookmarkName::new(name).is_err(), "{name:?} should be invalid");
            }
        }
    }

    #[test]
    fn tracking_file_ignores_trailing_lines() {
        let dir = TempDir::new().unwrap();
        let git_dir = PathBuf::from(dir.path()).join(".git");
        let paths = TetherPaths::new(git_dir.clone(), git_dir);
        std::fs::create_dir_all(paths.tether_dir()).unwrap();
        std::fs::write(paths.tracking_file_path(), "main\nleftover\n").unwrap();

        assert_eq!(tracking::read(&paths).unwrap().as_str(), "main");
    }

    #[test]
    fn oid_validation_consistent() {
        for _ in 0..100 {
            assert!(Oid::new("a".repeat(40)).is_ok());
            assert!(Oid::new("a".repeat(64)).is_ok());
            assert!(Oid::new("a".repeat(39)).is_err());
            assert!(Oid::new("g".repeat(40)).is_err());
        }
    }
}
