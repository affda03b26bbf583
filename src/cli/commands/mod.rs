//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Opens the dataset with the access it needs
//! 2. Calls the [`crate::dataset`] API
//! 3. Formats and displays output through [`crate::ui::output`]
//!
//! Handlers take parsed arguments rather than the clap types, so tests can
//! call them directly.

mod add;
mod arrays;
mod completion;
mod create;
mod delete;
mod hash;
mod info;
mod items;
mod pack;

// Re-export command functions for testing and direct invocation
pub use add::{add_array, add_item, Target};
pub use arrays::arrays;
pub use completion::completion;
pub use create::create;
pub use delete::{delete_array, delete_item};
pub use hash::hash;
pub use info::info;
pub use items::items;
pub use pack::pack;

use std::path::Path;

use anyhow::{anyhow, bail, Context as _, Result};
use serde_json::Value;

use super::args::Command;
use super::Context;
use crate::core::metadata::Metadata;
use crate::dataset::{DataSet, Query};

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Create {
            dataset,
            itemformat,
            meta,
        } => create::create(ctx, &dataset, itemformat.as_deref(), meta.as_deref()),
        Command::Info { dataset } => info::info(ctx, &dataset),
        Command::Items {
            dataset,
            conditions,
            long,
        } => items::items(ctx, &dataset, &conditions, long),
        Command::AddItem {
            dataset,
            name,
            meta,
        } => add::add_item(ctx, &dataset, name.as_deref(), meta.as_deref()),
        Command::AddArray {
            dataset,
            item,
            name,
            from,
            format,
            samplerate,
            meta,
        } => add::add_array(
            ctx,
            &dataset,
            &item,
            &name,
            &from,
            add::Target { format, samplerate },
            meta.as_deref(),
        ),
        Command::Arrays { dataset, item } => arrays::arrays(ctx, &dataset, &item),
        Command::DeleteItem { dataset, item } => delete::delete_item(ctx, &dataset, &item),
        Command::DeleteArray {
            dataset,
            item,
            name,
        } => delete::delete_array(ctx, &dataset, &item, &name),
        Command::Hash { dataset } => hash::hash(ctx, &dataset),
        Command::Pack { dataset, archive } => pack::pack(ctx, &dataset, &archive),
        Command::Completion { shell } => completion::completion(shell),
    }
}

/// How a command uses its dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Access {
    Read,
    Write,
}

/// Open the dataset at `path`. Paths ending in `.zip` open the archive.
pub(crate) fn open_dataset(ctx: &Context, path: &Path, access: Access) -> Result<DataSet> {
    let is_archive = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("zip"));

    let dataset = if is_archive {
        DataSet::open_archive(path)
    } else {
        let readonly = match access {
            Access::Read => ctx.config.readonly(),
            Access::Write => false,
        };
        DataSet::open(path, readonly)
    };
    dataset.with_context(|| format!("failed to open dataset '{}'", path.display()))
}

/// Parse a `--meta` argument, which must be a JSON object.
pub(crate) fn parse_meta(raw: Option<&str>) -> Result<Metadata> {
    let Some(raw) = raw else {
        return Ok(Metadata::new());
    };
    match serde_json::from_str::<Value>(raw).context("--meta is not valid JSON")? {
        Value::Object(map) => Ok(map),
        other => bail!("--meta must be a JSON object, not {}", other),
    }
}

/// Parse `--where KEY=VALUE` conditions into a query.
///
/// VALUE is JSON when it parses as JSON, otherwise a plain string. A JSON
/// list means "one of".
pub(crate) fn parse_conditions(conditions: &[String]) -> Result<Query> {
    let mut query = Query::new();
    for condition in conditions {
        let (key, raw) = condition
            .split_once('=')
            .ok_or_else(|| anyhow!("condition '{}' is not KEY=VALUE", condition))?;
        if key.is_empty() {
            bail!("condition '{}' has an empty key", condition);
        }
        let value = serde_json::from_str::<Value>(raw).unwrap_or_else(|_| Value::from(raw));
        query = query.equals(key, value);
    }
    Ok(query)
}
