//! dataset::array
//!
//! Decoded arrays and the sidecar-to-payload decode path.
//!
//! # Decode
//!
//! 1. Read `<name>.json` and split off `_filename`
//! 2. Resolve the payload next to the sidecar (legacy full paths are
//!    reduced to their trailing name)
//! 3. Pick the codec from the payload extension and decode
//! 4. For audio, overwrite `samplerate` with the header value

use std::path::PathBuf;

use serde::Serialize;

use crate::backend::{Backend, Location};
use crate::codec::{ArrayData, CodecRegistry, Format};
use crate::core::errors::{JbofError, Result};
use crate::core::metadata::{ArraySidecar, Metadata, MetadataStore};
use crate::core::paths::{payload_basename, ItemLayout, SAMPLERATE_KEY};

/// Where an [`Array`] was loaded from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArraySource {
    /// Dataset location
    pub location: Location,
    /// Item name
    pub item: String,
    /// Array name
    pub name: String,
    /// Payload file name as stored in the sidecar's `_filename`
    pub filename: String,
    /// Payload format
    pub format: Format,
    /// Canonical item directory, used to check ownership
    #[serde(skip)]
    pub(crate) item_dir: PathBuf,
}

/// A decoded array with its metadata and provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct Array {
    /// The numeric values.
    pub value: ArrayData,
    /// Public metadata: user keys plus format fields such as `samplerate`.
    pub metadata: Metadata,
    /// Provenance.
    pub source: ArraySource,
}

impl Array {
    pub fn name(&self) -> &str {
        &self.source.name
    }

    pub fn format(&self) -> Format {
        self.source.format
    }

    /// Sample rate of audio arrays.
    pub fn samplerate(&self) -> Option<u32> {
        self.metadata
            .get(SAMPLERATE_KEY)
            .and_then(|v| v.as_u64())
            .and_then(|v| u32::try_from(v).ok())
    }
}

/// Load array `name` of the item at `layout`.
pub(crate) fn load(
    backend: &dyn Backend,
    codecs: &CodecRegistry,
    layout: &ItemLayout,
    name: &str,
) -> Result<Array> {
    let sidecar_key = layout.sidecar_key(name);
    if !backend.is_file(&sidecar_key) {
        return Err(JbofError::NotFound(format!(
            "array '{}' in item '{}'",
            name,
            layout.dir_key()
        )));
    }
    let raw = MetadataStore::new(backend).read(&sidecar_key)?;
    let sidecar = ArraySidecar::from_json(&sidecar_key, raw)?;

    let basename = payload_basename(&sidecar.filename);
    if basename != sidecar.filename {
        tracing::warn!(
            sidecar = %sidecar_key,
            stored = %sidecar.filename,
            "sidecar stores a full payload path, using its file name"
        );
    }
    let format = Format::of_file(basename)?;
    let codec = codecs.get(format)?;
    let bytes = backend.read(&layout.resolve_payload(&sidecar.filename))?;
    let decoded = codec.decode(name, &bytes)?;

    let mut metadata = sidecar.metadata;
    if let Some(rate) = decoded.samplerate {
        metadata.insert(SAMPLERATE_KEY.to_string(), rate.into());
    }
    tracing::debug!(item = %layout.dir_key(), array = %name, %format, "decoded array");

    Ok(Array {
        value: decoded.data,
        metadata,
        source: ArraySource {
            location: backend.location().clone(),
            item: layout.dir_key().to_string(),
            name: name.to_string(),
            filename: sidecar.filename,
            format,
            item_dir: backend.resolve(layout.dir_key())?,
        },
    })
}
