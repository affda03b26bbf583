//! create command - Create a new, empty dataset

use std::path::Path;

use anyhow::{Context as _, Result};

use super::parse_meta;
use crate::cli::Context;
use crate::dataset::DataSet;
use crate::ui::output;

/// Create a dataset at `path`.
///
/// # Arguments
///
/// * `ctx` - Execution context
/// * `path` - Directory to create; must not exist
/// * `itemformat` - Item naming template
/// * `meta` - Dataset metadata as a JSON object
pub fn create(
    ctx: &Context,
    path: &Path,
    itemformat: Option<&str>,
    meta: Option<&str>,
) -> Result<()> {
    let metadata = parse_meta(meta)?;
    let dataset = DataSet::create(path, metadata, itemformat)
        .with_context(|| format!("failed to create dataset '{}'", path.display()))?;

    output::success(
        format!("Created dataset {}", dataset.location()),
        ctx.verbosity,
    );
    if let Some(template) = dataset.itemformat() {
        output::print(format!("Item format: {}", template), ctx.verbosity);
    }
    Ok(())
}
