//! info command - Show dataset metadata and item count
//!
//! Read-only. Counting items is a full enumeration pass.

use std::path::Path;

use anyhow::Result;

use super::{open_dataset, Access};
use crate::cli::Context;
use crate::ui::output;

/// Show a summary of the dataset at `path`.
pub fn info(ctx: &Context, path: &Path) -> Result<()> {
    let dataset = open_dataset(ctx, path, Access::Read)?;

    let mut count = 0usize;
    for item in dataset.all_items()? {
        item?;
        count += 1;
    }

    output::data(format!("Dataset: {}", dataset.location()));
    output::data(format!(
        "Read-only: {}",
        if dataset.is_readonly() { "yes" } else { "no" }
    ));
    output::data(format!(
        "Item format: {}",
        dataset.itemformat().unwrap_or("(none)")
    ));
    output::data(format!("Items: {}", count));
    output::data(format!(
        "Metadata: {}",
        output::format_metadata(dataset.metadata(), "")
    ));
    Ok(())
}
