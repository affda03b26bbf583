//! add commands - Add items, and arrays from existing files
//!
//! `add-array` copies the source file when it is already in the target
//! format. Otherwise it decodes the file with the codec for its extension
//! and re-encodes it, carrying the sample rate over.

use std::fs;
use std::path::Path;

use anyhow::{Context as _, Result};

use super::{open_dataset, parse_meta, Access};
use crate::cli::Context;
use crate::codec::{CodecRegistry, Format};
use crate::core::paths::SAMPLERATE_KEY;
use crate::dataset::ArrayOptions;
use crate::ui::output;

/// Add an item to the dataset at `path`, printing its name.
pub fn add_item(ctx: &Context, path: &Path, name: Option<&str>, meta: Option<&str>) -> Result<()> {
    let metadata = parse_meta(meta)?;
    let dataset = open_dataset(ctx, path, Access::Write)?;
    let item = dataset
        .add_item(name, metadata)
        .context("failed to add item")?;
    output::data(item.name());
    Ok(())
}

/// Requested storage for `add-array`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Target {
    /// Store in this format; the config default applies when `None`
    pub format: Option<Format>,
    /// Sample rate, when the source carries none
    pub samplerate: Option<u32>,
}

/// Add the array `name` to `item` from the file `source`.
pub fn add_array(
    ctx: &Context,
    path: &Path,
    item: &str,
    name: &str,
    source: &Path,
    target: Target,
    meta: Option<&str>,
) -> Result<()> {
    let mut metadata = parse_meta(meta)?;
    let file_name = source
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("'{}' is not a file path", source.display()))?;
    let source_format = Format::of_file(file_name)?;
    let format = target
        .format
        .or(ctx.config.default_format())
        .unwrap_or(source_format);

    let dataset = open_dataset(ctx, path, Access::Write)?;
    let handle = dataset
        .get_item(item)
        .with_context(|| format!("no item '{}'", item))?;

    let array = if format == source_format {
        if let Some(rate) = target.samplerate {
            metadata.insert(SAMPLERATE_KEY.to_string(), rate.into());
        }
        handle.add_array_from_file(name, source, metadata)
    } else {
        let bytes =
            fs::read(source).with_context(|| format!("failed to read '{}'", source.display()))?;
        let decoded = CodecRegistry::builtin()
            .get(source_format)?
            .decode(name, &bytes)
            .with_context(|| format!("failed to decode '{}'", source.display()))?;

        if let (Some(header), Some(requested)) = (decoded.samplerate, target.samplerate) {
            if header != requested {
                output::warn(
                    format!(
                        "{} is {} Hz, ignoring --samplerate {}",
                        file_name, header, requested
                    ),
                    ctx.verbosity,
                );
            }
        }
        let mut options = ArrayOptions::new().format(format).metadata(metadata);
        if let Some(rate) = decoded.samplerate.or(target.samplerate) {
            options = options.samplerate(rate);
        }
        output::print(
            format!("Converting {} from {} to {}", name, source_format, format),
            ctx.verbosity,
        );
        handle.add_array(name, decoded.data, options)
    }
    .with_context(|| format!("failed to add array '{}' to item '{}'", name, item))?;

    output::success(
        format!(
            "Added {}/{} ({}, {})",
            item,
            array.name(),
            array.format(),
            output::format_shape(array.value.shape())
        ),
        ctx.verbosity,
    );
    Ok(())
}
