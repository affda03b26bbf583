//! hash command - Print the content hash of a dataset

use std::path::Path;

use anyhow::{Context as _, Result};

use super::{open_dataset, Access};
use crate::cli::Context;
use crate::ui::output;

/// Print the fingerprint of the dataset at `path`.
pub fn hash(ctx: &Context, path: &Path) -> Result<()> {
    let dataset = open_dataset(ctx, path, Access::Read)?;
    let fingerprint = dataset
        .calculate_hash()
        .with_context(|| format!("failed to hash '{}'", path.display()))?;
    output::data(fingerprint);
    Ok(())
}
