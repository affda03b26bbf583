//! delete commands - Delete an item or one array of an item

use std::path::Path;

use anyhow::{Context as _, Result};

use super::{open_dataset, Access};
use crate::cli::Context;
use crate::ui::output;

/// Delete `item` and everything in it.
pub fn delete_item(ctx: &Context, path: &Path, item: &str) -> Result<()> {
    let dataset = open_dataset(ctx, path, Access::Write)?;
    dataset
        .delete_item(item)
        .with_context(|| format!("failed to delete item '{}'", item))?;
    output::success(format!("Deleted item {}", item), ctx.verbosity);
    Ok(())
}

/// Delete the array `name` of `item`.
pub fn delete_array(ctx: &Context, path: &Path, item: &str, name: &str) -> Result<()> {
    let dataset = open_dataset(ctx, path, Access::Write)?;
    let handle = dataset
        .get_item(item)
        .with_context(|| format!("no item '{}'", item))?;
    let array = handle
        .get_array(name)
        .with_context(|| format!("no array '{}' in item '{}'", name, item))?;
    handle
        .delete_array(&array)
        .with_context(|| format!("failed to delete array '{}'", name))?;
    output::success(format!("Deleted array {}/{}", item, name), ctx.verbosity);
    Ok(())
}
