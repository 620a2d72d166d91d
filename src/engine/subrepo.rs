//! engine::subrepo
//!
//! Depth-first push of committed subrepositories.
//!
//! A subrepository is a gitlink recorded in the pushed revision's tree.
//! Subrepos are pushed in lexicographic path order, each one's own subrepos
//! before itself, and the first failure stops the walk. Bookmarks are a
//! property of the top-level clone, so a subrepo only receives history plus
//! a keep ref, `refs/tether/keep/<id>`, that holds the pushed revision
//! reachable in the subrepo's store.
//!
//! # Destinations
//!
//! A subrepo is pushed to, in order of preference:
//! 1. its own `default-push` remote
//! 2. its own `default` remote
//! 3. the URL recorded in the parent's `.gitmodules`; `./` and `../` URLs
//!    are resolved against the parent's destination

use std::collections::BTreeMap;

use url::Url;

use super::{Context, DEFAULT_PUSH_REMOTE, DEFAULT_REMOTE};
use crate::core::types::Oid;
use crate::git::{hide_password, Git, GitError, RemoteStore, Transport};

/// Namespace of the refs that keep pushed subrepo revisions reachable.
pub const KEEP_NAMESPACE: &str = "tether/keep";

/// The first subrepo that could not be pushed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubrepoFailure {
    /// Path from the top-level work dir.
    pub path: String,
    pub reason: String,
}

impl SubrepoFailure {
    fn new(path: &str, reason: impl ToString) -> Self {
        Self {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Re-root a failure reported by a nested subrepo under `parent`.
    fn under(self, parent: &str) -> Self {
        Self {
            path: format!("{}/{}", parent, self.path),
            reason: self.reason,
        }
    }
}

/// Apply `push_one` to every entry in key order, stopping at the first error.
pub fn push_in_order<K, V, E, F>(substate: &BTreeMap<K, V>, mut push_one: F) -> Result<(), E>
where
    F: FnMut(&K, &V) -> Result<(), E>,
{
    substate.iter().try_for_each(|(path, oid)| push_one(path, oid))
}

/// Push every subrepo in `substate`, a state of `parent`.
pub fn push_all(
    ctx: &Context,
    parent: &Git,
    transport: &dyn Transport,
    parent_destination: &str,
    substate: &BTreeMap<String, Oid>,
) -> Result<(), SubrepoFailure> {
    push_in_order(substate, |path, recorded| {
        push_one(ctx, parent, transport, parent_destination, path, recorded)
    })
}

fn push_one(
    ctx: &Context,
    parent: &Git,
    transport: &dyn Transport,
    parent_destination: &str,
    path: &str,
    recorded: &Oid,
) -> Result<(), SubrepoFailure> {
    let fail = |reason: GitError| SubrepoFailure::new(path, reason);

    let sub = parent.open_subrepo(path).map_err(fail)?;
    let destination = destination(&sub, parent, path, parent_destination)?;

    ctx.sink.status(&format!(
        "pushing subrepo {} to {}",
        path,
        hide_password(&destination)
    ));

    let nested = sub.substate(recorded).map_err(fail)?;
    push_all(ctx, &sub, transport, &destination, &nested).map_err(|f| f.under(path))?;

    let remote = transport
        .connect(&destination, &ctx.options)
        .map_err(fail)?;
    remote
        .push_history(&sub, std::slice::from_ref(recorded))
        .map_err(fail)?;

    if !keep_reachable(remote.as_ref(), recorded).map_err(fail)? {
        return Err(SubrepoFailure::new(
            path,
            format!(
                "cannot reference {} on {}",
                recorded.short(12),
                hide_password(&destination)
            ),
        ));
    }
    Ok(())
}

/// Point `refs/tether/keep/<revision>` at `revision` on `remote`.
///
/// Succeeds if the ref is created or already names `revision`.
fn keep_reachable(remote: &dyn RemoteStore, revision: &Oid) -> Result<bool, GitError> {
    if remote.push_key(KEEP_NAMESPACE, revision.as_str(), None, revision)? {
        return Ok(true);
    }
    // Already kept, by an earlier push or a concurrent one
    Ok(remote.list_keys(KEEP_NAMESPACE)?.get(revision.as_str()) == Some(revision))
}

/// Where the subrepo at `path` is pushed.
fn destination(
    sub: &Git,
    parent: &Git,
    path: &str,
    parent_destination: &str,
) -> Result<String, SubrepoFailure> {
    let fail = |reason: GitError| SubrepoFailure::new(path, reason);

    if let Some(url) = sub.remote_url(DEFAULT_PUSH_REMOTE).map_err(fail)? {
        return Ok(url);
    }
    if let Some(url) = sub.remote_url(DEFAULT_REMOTE).map_err(fail)? {
        return Ok(url);
    }
    let url = parent
        .submodule_url(path)
        .map_err(fail)?
        .ok_or_else(|| SubrepoFailure::new(path, "no push destination"))?;
    resolve_relative(parent_destination, &url).ok_or_else(|| {
        SubrepoFailure::new(
            path,
            format!(
                "submodule url {} climbs above {}",
                url,
                hide_password(parent_destination)
            ),
        )
    })
}

/// Resolve a `./` or `../` submodule URL against `base`.
///
/// URL bases are resolved with [`Url::join`], treating `base` as a
/// directory. Plain paths and scp-style `host:path` bases use segment
/// arithmetic on the path part. Any other `url` is returned unchanged.
///
/// Returns `None` if `url` climbs above the root of `base`.
pub fn resolve_relative(base: &str, url: &str) -> Option<String> {
    if !(url.starts_with("./") || url.starts_with("../")) {
        return Some(url.to_string());
    }

    // Single-letter schemes are drive letters
    if let Ok(mut parsed) = Url::parse(base) {
        if parsed.scheme().len() > 1 && !parsed.cannot_be_a_base() {
            let depth = parsed
                .path_segments()
                .map_or(0, |segments| segments.filter(|s| !s.is_empty()).count());
            if !stays_below(depth, url) {
                return None;
            }
            if !parsed.path().ends_with('/') {
                let directory = format!("{}/", parsed.path());
                parsed.set_path(&directory);
            }
            return parsed.join(url).ok().map(String::from);
        }
    }

    let (host, path) = match base.find(':') {
        Some(colon) if !base[..colon].contains('/') => base.split_at(colon + 1),
        _ => ("", base),
    };
    let mut segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    for part in url.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            other => segments.push(other),
        }
    }

    let root = if path.starts_with('/') { "/" } else { "" };
    Some(format!("{}{}{}", host, root, segments.join("/")))
}

/// Whether applying `url` to a path `depth` segments deep stays at or
/// below the root.
fn stays_below(depth: usize, url: &str) -> bool {
    let mut depth = depth;
    for part in url.split('/') {
        match part {
            "" | "." => {}
            ".." => match depth.checked_sub(1) {
                Some(up) => depth = up,
                None => return false,
            },
            _ => depth += 1,
        }
    }
    true
}
