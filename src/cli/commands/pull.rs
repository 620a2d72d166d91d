//! pull command - Pull the tracked remote bookmark

use anyhow::Result;

use super::open_clone;
use crate::core::types::BookmarkName;
use crate::engine::{self, Context};

/// Run the pull command.
pub fn pull(ctx: &Context, bookmark: Option<&BookmarkName>) -> Result<i32> {
    let (git, _config) = open_clone(ctx)?;
    engine::pull(ctx, &git, bookmark)?;
    Ok(0)
}
