//! core::paths
//!
//! Centralized path routing for the on-disk dataset layout.
//!
//! # Storage Layout
//!
//! ```text
//! <dataset>/
//!   _metadata.json            {...user metadata..., "_itemformat": <string|null>}
//!   <item>/
//!     _metadata.json          {...user metadata...}
//!     <array>.<ext>           payload (npy | wav | flac | ogg | mat)
//!     <array>.json            {...user metadata..., "_filename": "<array>.<ext>"}
//! ```
//!
//! Backends address files by *relative keys*: `/`-separated paths below the
//! dataset root, with the empty string standing for the root itself. No code
//! outside this module should assemble those keys by hand.
//!
//! # Example
//!
//! ```
//! use jbof::codec::Format;
//! use jbof::core::paths::ItemLayout;
//!
//! let layout = ItemLayout::new("take-1");
//! assert_eq!(layout.metadata_key(), "take-1/_metadata.json");
//! assert_eq!(layout.sidecar_key("ones"), "take-1/ones.json");
//! assert_eq!(layout.payload_key("ones", Format::Npy), "take-1/ones.npy");
//! ```

use crate::codec::Format;

/// The sidecar file of every dataset and item directory.
pub const METADATA_FILE: &str = "_metadata.json";

/// Stem of [`METADATA_FILE`]; never an array name.
pub const METADATA_STEM: &str = "_metadata";

/// Extension of array sidecars.
pub const SIDECAR_EXTENSION: &str = "json";

/// Reserved dataset metadata key holding the item naming template.
pub const ITEMFORMAT_KEY: &str = "_itemformat";

/// Reserved sidecar key holding the payload file name.
pub const FILENAME_KEY: &str = "_filename";

/// Sidecar key carrying the sample rate of audio payloads.
pub const SAMPLERATE_KEY: &str = "samplerate";

/// Bytecode cache directory that older accessor tooling leaves in datasets.
pub const PYCACHE_DIR: &str = "__pycache__";

/// Join a relative key and a child name.
pub fn join_key(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", dir, name)
    }
}

/// Dot-files and dot-directories: temp files from interrupted writes,
/// editor and VCS leftovers. Never part of a dataset's content.
pub fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

/// Whether a relative key has a hidden component.
pub fn has_hidden_component(key: &str) -> bool {
    key.split('/').any(is_hidden)
}

/// Whether a directory directly under the root is enumerated as an item.
pub fn is_item_dir(name: &str) -> bool {
    !(name.is_empty() || is_hidden(name) || name == METADATA_FILE || name == PYCACHE_DIR)
}

/// The array name of a sidecar file, or `None` if `file_name` is not one.
///
/// ```
/// use jbof::core::paths::sidecar_stem;
///
/// assert_eq!(sidecar_stem("ones.json"), Some("ones"));
/// assert_eq!(sidecar_stem("_metadata.json"), None);
/// assert_eq!(sidecar_stem("ones.npy"), None);
/// ```
pub fn sidecar_stem(file_name: &str) -> Option<&str> {
    let stem = file_name.strip_suffix(".json")?;
    if stem.is_empty() || stem == METADATA_STEM || stem.starts_with('.') {
        None
    } else {
        Some(stem)
    }
}

/// Reduce a stored `_filename` to the bare payload name.
///
/// Current sidecars store the bare name. Legacy sidecars stored a full path
/// (possibly written on another platform), so only the trailing component
/// is kept.
///
/// ```
/// use jbof::core::paths::payload_basename;
///
/// assert_eq!(payload_basename("ones.npy"), "ones.npy");
/// assert_eq!(payload_basename("/data/set/item/ones.npy"), "ones.npy");
/// assert_eq!(payload_basename("C:\\set\\item\\ones.npy"), "ones.npy");
/// ```
pub fn payload_basename(stored: &str) -> &str {
    stored
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or(stored)
}

/// The lowercase extension of a file name, if any.
pub fn extension_of(file_name: &str) -> Option<String> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Path routing for one item directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemLayout {
    item: String,
}

impl ItemLayout {
    /// Create the layout for the item named `item`.
    pub fn new(item: impl Into<String>) -> Self {
        Self { item: item.into() }
    }

    /// Key of the item directory itself.
    pub fn dir_key(&self) -> &str {
        &self.item
    }

    /// Key of the item's `_metadata.json`.
    pub fn metadata_key(&self) -> String {
        join_key(&self.item, METADATA_FILE)
    }

    /// Key of the sidecar of array `name`.
    pub fn sidecar_key(&self, name: &str) -> String {
        join_key(&self.item, &format!("{}.{}", name, SIDECAR_EXTENSION))
    }

    /// Bare payload file name of array `name` in `format`.
    pub fn payload_file(name: &str, format: Format) -> String {
        format!("{}.{}", name, format.extension())
    }

    /// Key of the payload of array `name` in `format`.
    pub fn payload_key(&self, name: &str, format: Format) -> String {
        join_key(&self.item, &Self::payload_file(name, format))
    }

    /// Key of the payload a sidecar points at, resolved relative to the
    /// item directory.
    pub fn resolve_payload(&self, stored_filename: &str) -> String {
        join_key(&self.item, payload_basename(stored_filename))
    }
}
