//! backend
//!
//! Storage capability behind a dataset.
//!
//! # Architecture
//!
//! The dataset, item, and array logic is written once against the
//! [`Backend`] trait. Two variants implement it:
//!
//! - [`DirectoryBackend`] - a plain directory tree (read-write)
//! - [`ArchiveBackend`] - a zip archive of a dataset directory (read-only)
//!
//! Files are addressed by relative keys (see [`crate::core::paths`]). The
//! mutating methods have default implementations that fail with
//! [`JbofError::ReadOnly`], so read-only variants only implement the
//! listing and reading half.
//!
//! # Example
//!
//! ```no_run
//! use jbof::backend::Location;
//! use std::path::Path;
//!
//! let location = Location::detect(Path::new("/data/set.zip"));
//! let backend = location.open()?;
//! for item in backend.item_dirs()? {
//!     println!("{}", item?);
//! }
//! # Ok::<(), jbof::JbofError>(())
//! ```

pub mod archive;
pub mod directory;

pub use archive::ArchiveBackend;
pub use directory::DirectoryBackend;

use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::core::errors::{JbofError, Result};
use crate::core::paths::extension_of;

/// Where a dataset lives. This is the serializable part of a backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "backend", content = "path", rename_all = "lowercase")]
pub enum Location {
    /// A dataset directory.
    Directory(PathBuf),
    /// A zip archive of a dataset directory.
    Archive(PathBuf),
}

impl Location {
    /// Pick the backend kind for `path`: existing `.zip` files are
    /// archives, everything else is a directory.
    pub fn detect(path: &Path) -> Self {
        let is_zip = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(extension_of)
            .is_some_and(|ext| ext == "zip");
        if is_zip && path.is_file() {
            Location::Archive(path.to_path_buf())
        } else {
            Location::Directory(path.to_path_buf())
        }
    }

    /// The filesystem path of the dataset.
    pub fn path(&self) -> &Path {
        match self {
            Location::Directory(path) | Location::Archive(path) => path,
        }
    }

    /// Open the backend for this location.
    ///
    /// # Errors
    ///
    /// Returns [`JbofError::NotFound`] if nothing usable exists there.
    pub fn open(&self) -> Result<Rc<dyn Backend>> {
        Ok(match self {
            Location::Directory(path) => Rc::new(DirectoryBackend::open(path)?),
            Location::Archive(path) => Rc::new(ArchiveBackend::open(path)?),
        })
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Directory(path) => write!(f, "{}", path.display()),
            Location::Archive(path) => write!(f, "{} (archive)", path.display()),
        }
    }
}

/// Lazily produced item directory names.
pub type ItemDirs<'a> = Box<dyn Iterator<Item = Result<String>> + 'a>;

/// Storage operations a dataset needs.
///
/// Keys are `/`-separated paths relative to the dataset root; `""` is the
/// root itself.
pub trait Backend: fmt::Debug {
    /// Where this backend reads from.
    fn location(&self) -> &Location;

    /// Whether the mutating methods are supported.
    fn is_writable(&self) -> bool {
        false
    }

    /// Names of the item directories directly under the root, produced
    /// lazily. Reserved and hidden directories are skipped.
    fn item_dirs(&self) -> Result<ItemDirs<'_>>;

    /// Names of the regular files directly inside `dir`, sorted.
    fn list_files(&self, dir: &str) -> Result<Vec<String>>;

    /// Keys of every regular file below `dir`, recursively, sorted. Hidden
    /// entries and everything below hidden directories are skipped.
    fn walk_files(&self, dir: &str) -> Result<Vec<String>>;

    /// Whether `key` is a directory.
    fn is_dir(&self, key: &str) -> bool;

    /// Whether `key` is a regular file.
    fn is_file(&self, key: &str) -> bool;

    /// Read the whole file at `key`.
    fn read(&self, key: &str) -> Result<Vec<u8>>;

    /// Canonical identity of `key`, with symlinks and aliases resolved.
    fn resolve(&self, key: &str) -> Result<PathBuf>;

    /// Create the directory `key`. Fails if it exists.
    fn create_dir(&self, key: &str) -> Result<()> {
        Err(read_only(self.location(), key))
    }

    /// Replace the file at `key` with `bytes`.
    fn write(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let _ = bytes;
        Err(read_only(self.location(), key))
    }

    /// Copy the external file `source` verbatim to `key`.
    fn copy_in(&self, source: &Path, key: &str) -> Result<()> {
        let _ = source;
        Err(read_only(self.location(), key))
    }

    /// Remove the file at `key`.
    fn remove_file(&self, key: &str) -> Result<()> {
        Err(read_only(self.location(), key))
    }

    /// Remove the directory `key` and everything below it.
    fn remove_dir_all(&self, key: &str) -> Result<()> {
        Err(read_only(self.location(), key))
    }

    /// Remove the whole dataset.
    fn destroy(&self) -> Result<()> {
        Err(read_only(self.location(), ""))
    }
}

fn read_only(location: &Location, key: &str) -> JbofError {
    if key.is_empty() {
        JbofError::ReadOnly(location.to_string())
    } else {
        JbofError::ReadOnly(format!("'{}' in {}", key, location))
    }
}
