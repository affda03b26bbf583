//! items command - List items, optionally filtered on metadata

use std::path::Path;

use anyhow::Result;

use super::{open_dataset, parse_conditions, Access};
use crate::cli::Context;
use crate::dataset::Item;
use crate::ui::output;

/// List items of the dataset at `path` matching every `--where` condition.
///
/// Names are printed sorted, one per line; `long` adds the metadata.
pub fn items(ctx: &Context, path: &Path, conditions: &[String], long: bool) -> Result<()> {
    let query = parse_conditions(conditions)?;
    let dataset = open_dataset(ctx, path, Access::Read)?;

    let mut found: Vec<Item> = dataset.find_items(query)?.collect::<Result<_, _>>()?;
    found.sort_by(|a, b| a.name().cmp(b.name()));

    for item in &found {
        if long {
            let metadata = item.metadata()?;
            output::data(format!(
                "{}  {}",
                item.name(),
                serde_json::Value::Object(metadata)
            ));
        } else {
            output::data(item.name());
        }
    }
    output::print(
        format!("{} item{}", found.len(), if found.len() == 1 { "" } else { "s" }),
        ctx.verbosity,
    );
    Ok(())
}
