//! core::metadata::store
//!
//! Sidecar storage through a [`Backend`].
//!
//! # Architecture
//!
//! The store does not touch the filesystem directly. It serializes to
//! canonical JSON and hands bytes to the backend, which decides how they are
//! persisted (temp file + rename for directories) or refuses the write
//! (archives).
//!
//! # Example
//!
//! ```no_run
//! use jbof::backend::DirectoryBackend;
//! use jbof::core::metadata::{Metadata, MetadataStore};
//! use std::path::Path;
//!
//! let backend = DirectoryBackend::open(Path::new("/data/set"))?;
//! let store = MetadataStore::new(&backend);
//! let meta: Metadata = store.read("_metadata.json")?;
//! # Ok::<(), jbof::JbofError>(())
//! ```

use crate::backend::Backend;
use crate::core::errors::Result;

use super::schema::{parse_metadata, to_canonical_json, Metadata};

/// Reads and writes JSON sidecars by relative key.
pub struct MetadataStore<'a> {
    backend: &'a dyn Backend,
}

impl<'a> MetadataStore<'a> {
    /// Create a store over `backend`.
    pub fn new(backend: &'a dyn Backend) -> Self {
        Self { backend }
    }

    /// Whether a sidecar exists at `key`.
    pub fn exists(&self, key: &str) -> bool {
        self.backend.is_file(key)
    }

    /// Read and parse the sidecar at `key`.
    ///
    /// # Errors
    ///
    /// - [`crate::JbofError::NotFound`] if there is no file at `key`
    /// - [`crate::JbofError::Parse`] if it is not a JSON object
    pub fn read(&self, key: &str) -> Result<Metadata> {
        let bytes = self.backend.read(key)?;
        parse_metadata(key, &bytes)
    }

    /// Write `metadata` to `key` in canonical form.
    pub fn write(&self, key: &str, metadata: &Metadata) -> Result<()> {
        let json = to_canonical_json(metadata)?;
        self.backend.write(key, json.as_bytes())
    }
}
