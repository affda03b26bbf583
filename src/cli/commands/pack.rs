//! pack command - Pack a dataset into a zip archive

use std::path::Path;

use anyhow::{Context as _, Result};

use super::{open_dataset, Access};
use crate::cli::Context;
use crate::ui::output;

/// Write the dataset at `path` into a new archive at `archive`.
pub fn pack(ctx: &Context, path: &Path, archive: &Path) -> Result<()> {
    let dataset = open_dataset(ctx, path, Access::Read)?;
    let files = dataset
        .export_archive(archive)
        .with_context(|| format!("failed to write archive '{}'", archive.display()))?;
    output::success(
        format!("Packed {} files into {}", files, archive.display()),
        ctx.verbosity,
    );
    Ok(())
}
