//! jbof - datasets from just a bunch of files
//!
//! A dataset is a directory of items. Each item is a directory of named
//! arrays plus JSON metadata, and each array is one ordinary file (`.npy`,
//! `.wav`, `.flac`, `.ogg`, `.mat`) with a JSON sidecar. Everything stays
//! readable with standard tools.
//!
//! # Architecture
//!
//! - [`dataset`] - DataSet, Item, and Array handles; queries and caching
//! - [`codec`] - Array file formats behind a codec registry
//! - [`backend`] - Storage: plain directories and read-only zip archives
//! - [`core`] - Names, templates, sidecar schema, hashing, config, errors
//! - [`cli`] - Command-line interface layer
//! - [`ui`] - Output verbosity for the CLI
//!
//! # Example
//!
//! ```no_run
//! use jbof::{ArrayOptions, DataSet, Metadata};
//!
//! let dataset = DataSet::create("/data/experiment", Metadata::new(), None)?;
//! let item = dataset.add_item(Some("run-1"), Metadata::new())?;
//! item.add_array("signal", vec![0.0f64, 0.5, 1.0], ArrayOptions::new())?;
//!
//! let array = item.get_array("signal")?;
//! assert_eq!(array.value.shape(), &[3]);
//! println!("{}", dataset.calculate_hash()?);
//! # Ok::<(), jbof::JbofError>(())
//! ```

pub mod backend;
pub mod cli;
pub mod codec;
pub mod core;
pub mod dataset;
pub mod ui;

pub use crate::backend::Location;
pub use crate::codec::{ArrayData, DType, Format};
pub use crate::core::errors::{JbofError, Result};
pub use crate::core::metadata::Metadata;
pub use crate::core::types::Fingerprint;
pub use crate::dataset::{Array, ArrayOptions, ArraySource, DataSet, Item, ItemRef, Items, Query};
