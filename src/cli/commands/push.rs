//! push command - Push the working revision to the remote bookmark
//!
//! The push destination is, in order of precedence, the repo config's
//! `default_push`, the `default-push` remote, then the `default` remote.

use anyhow::Result;

use super::open_clone;
use crate::core::types::BookmarkName;
use crate::engine::{self, resolve_push_destination, Context, PushRequest};
use crate::git::LocalTransport;

/// Run the push command.
pub fn push(
    ctx: &Context,
    bookmark: Option<BookmarkName>,
    force: bool,
    new_bookmark: bool,
    options: Vec<(String, String)>,
) -> Result<i32> {
    let (git, config) = open_clone(ctx)?;

    let ctx = Context {
        default_push: resolve_push_destination(&git, &config)?,
        options: options.into_iter().collect(),
        ..ctx.clone()
    };

    let request = PushRequest {
        bookmark,
        force,
        new_bookmark,
    };

    let outcome = engine::push(&ctx, &git, &LocalTransport, &request)?;
    Ok(outcome.exit_code())
}
