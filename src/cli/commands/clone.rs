//! clone command - Clone a repository at a bookmark

use std::path::Path;

use anyhow::Result;

use crate::core::types::BookmarkName;
use crate::engine::{self, Context};

/// Run the clone command.
pub fn clone(
    ctx: &Context,
    source: &str,
    bookmark: &BookmarkName,
    dest: Option<&Path>,
) -> Result<i32> {
    let report = engine::clone(ctx, source, bookmark, dest)?;
    ctx.sink
        .debug(&format!("cloned into {}", report.destination.display()));
    Ok(0)
}
