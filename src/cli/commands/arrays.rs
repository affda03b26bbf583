//! arrays command - List the arrays of an item

use std::path::Path;

use anyhow::{Context as _, Result};

use super::{open_dataset, Access};
use crate::cli::Context;
use crate::ui::output;

/// List every array of `item`: name, format, dtype, shape, and sample rate
/// when there is one.
pub fn arrays(ctx: &Context, path: &Path, item: &str) -> Result<()> {
    let dataset = open_dataset(ctx, path, Access::Read)?;
    let item = dataset
        .get_item(item)
        .with_context(|| format!("no item '{}'", item))?;

    let mut names = item.array_names()?;
    names.sort();
    for name in &names {
        let array = item
            .get_array(name)
            .with_context(|| format!("failed to read array '{}'", name))?;
        let mut line = format!(
            "{}  {}  {}  {}",
            array.name(),
            array.format(),
            array.value.dtype(),
            output::format_shape(array.value.shape())
        );
        if let Some(rate) = array.samplerate() {
            line.push_str(&format!("  {} Hz", rate));
        }
        output::data(line);
    }
    Ok(())
}
