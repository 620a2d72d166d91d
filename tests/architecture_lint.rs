//! Architecture enforcement tests.
//!
//! The layering described in `lib.rs` is only useful if it holds. These
//! tests scan the source tree so that violations are caught in CI.
//!
//! # Test Categories
//!
//! 1. **Git Boundary** - Only `src/git/` talks to libgit2
//! 2. **Path Routing** - Only `core::paths` knows where tether state lives
//! 3. **Output Routing** - Only `ui::output` writes to the terminal
//! 4. **Handler Purity** - Command handlers never mutate refs themselves

use std::fs;
use std::path::{Path, PathBuf};

/// All `.rs` files under `dir`, recursively, sorted for stable reports.
fn rust_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let mut pending = vec![dir.to_path_buf()];

    while let Some(dir) = pending.pop() {
        for entry in fs::read_dir(&dir).expect("Failed to read source directory") {
            let path = entry.expect("Failed to read entry").path();
            if path.is_dir() {
                pending.push(path);
            } else if path.extension().map(|e| e == "rs").unwrap_or(false) {
                files.push(path);
            }
        }
    }

    files.sort();
    files
}

/// Source lines outside `#[cfg(test)]` modules.
///
/// Test modules sit at the bottom of each file, so everything after the
/// first `#[cfg(test)]` is dropped.
fn production_source(path: &Path) -> String {
    let content = fs::read_to_string(path)
        .unwrap_or_else(|_| panic!("Failed to read {}", path.display()));
    match content.find("#[cfg(test)]") {
        Some(index) => content[..index].to_string(),
        None => content,
    }
}

/// Files under `src/` containing `needle`, except those under `allowed`.
fn violations(needle: &str, allowed: &[&str]) -> Vec<String> {
    rust_files(Path::new("src"))
        .into_iter()
        .filter(|path| {
            let display = path.to_string_lossy().replace('\\', "/");
            !allowed.iter().any(|prefix| display.starts_with(prefix))
        })
        .filter(|path| production_source(path).contains(needle))
        .map(|path| path.display().to_string())
        .collect()
}

// =============================================================================
// Git Boundary
// =============================================================================

/// libgit2 types never leak past the git layer.
#[test]
fn only_git_layer_uses_git2() {
    let found = violations("git2::", &["src/git/"]);
    assert!(
        found.is_empty(),
        "git2 used outside src/git/:\n  {}",
        found.join("\n  ")
    );
}

// =============================================================================
// Path Routing
// =============================================================================

/// No code outside `core::paths` computes the tether metadata directory.
#[test]
fn only_paths_module_knows_storage_layout() {
    let found = violations("join(\"tether\")", &["src/core/paths.rs"]);
    assert!(
        found.is_empty(),
        "storage paths computed outside core::paths:\n  {}",
        found.join("\n  ")
    );
}

// =============================================================================
// Output Routing
// =============================================================================

/// Engine code reports through the status sink, never to stdout directly.
#[test]
fn only_ui_layer_prints() {
    let mut found = violations("println!", &["src/ui/"]);
    found.extend(violations("eprintln!", &["src/ui/"]));
    assert!(
        found.is_empty(),
        "terminal output outside src/ui/:\n  {}",
        found.join("\n  ")
    );
}

// =============================================================================
// Handler Purity
// =============================================================================

/// Handlers delegate to the engine; ref mutations live there.
#[test]
fn command_handlers_do_not_mutate_refs() {
    let mutations = [
        "update_ref_cas",
        "delete_ref",
        "clear_local_bookmarks",
        "checkout_detached",
        "push_key",
    ];

    let mut found = Vec::new();
    for path in rust_files(Path::new("src/cli")) {
        let source = production_source(&path);
        for call in mutations {
            if source.contains(call) {
                found.push(format!("{}: calls {}", path.display(), call));
            }
        }
    }

    assert!(
        found.is_empty(),
        "Architecture violations found:\n  {}",
        found.join("\n  ")
    );
}

/// The engine stays free of argument parsing.
#[test]
fn engine_does_not_depend_on_cli() {
    let found: Vec<String> = rust_files(Path::new("src/engine"))
        .into_iter()
        .filter(|path| {
            let source = production_source(path);
            source.contains("crate::cli") || source.contains("clap::")
        })
        .map(|path| path.display().to_string())
        .collect();

    assert!(
        found.is_empty(),
        "engine depends on the CLI layer:\n  {}",
        found.join("\n  ")
    );
}
