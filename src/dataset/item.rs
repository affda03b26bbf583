//! dataset::item
//!
//! One item directory and the arrays inside it.
//!
//! # Caching
//!
//! An [`Item`] is a cheap handle: clones share the same metadata and array
//! caches. Metadata is read on first access; arrays are decoded on first
//! lookup and kept until deleted or [`Item::clear_cache`].
//!
//! A dataset hands out at most one live handle per item name: every
//! lookup of the same item returns a clone of it, so all of them see the
//! same caches. Deleting the item through its dataset invalidates every
//! clone.
//!
//! # Example
//!
//! ```no_run
//! use jbof::{ArrayOptions, DataSet, Format, Metadata};
//!
//! let dataset = DataSet::open("/data/set", false)?;
//! let item = dataset.get_item("ann-001")?;
//! item.add_array(
//!     "tone",
//!     vec![0i16, 100, -100],
//!     ArrayOptions::new().format(Format::Wav).samplerate(16_000),
//! )?;
//! let tone = item.get_array("tone")?;
//! assert_eq!(tone.samplerate(), Some(16_000));
//! # Ok::<(), jbof::JbofError>(())
//! ```

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::{Rc, Weak};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use super::array::{self, Array};
use super::Shared;
use crate::backend::Location;
use crate::codec::{ArrayData, Format};
use crate::core::errors::{JbofError, Result};
use crate::core::metadata::schema::ensure_not_reserved;
use crate::core::metadata::{ArraySidecar, Metadata, MetadataStore};
use crate::core::paths::{sidecar_stem, ItemLayout, FILENAME_KEY, SAMPLERATE_KEY};
use crate::core::types::{ArrayName, ItemName};

/// How [`Item::add_array`] stores an array.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArrayOptions {
    /// User metadata for the sidecar.
    pub metadata: Metadata,
    /// Payload format.
    pub format: Format,
    /// Sample rate, required by audio formats.
    pub samplerate: Option<u32>,
}

impl ArrayOptions {
    /// Defaults: no metadata, `npy`, no sample rate.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    pub fn samplerate(mut self, samplerate: u32) -> Self {
        self.samplerate = Some(samplerate);
        self
    }

    pub fn metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }
}

struct ItemInner {
    shared: Shared,
    name: ItemName,
    layout: ItemLayout,
    alive: Cell<bool>,
    metadata: RefCell<Option<Metadata>>,
    arrays: RefCell<BTreeMap<String, Rc<Array>>>,
}

/// Handle to one item of a dataset.
#[derive(Clone)]
pub struct Item {
    inner: Rc<ItemInner>,
}

/// Live item handles of one dataset, by name.
#[derive(Default)]
pub(crate) struct ItemHandles {
    live: RefCell<HashMap<String, Weak<ItemInner>>>,
}

impl ItemHandles {
    /// The live handle for `name`, if one is still held somewhere.
    pub(crate) fn get(&self, name: &str) -> Option<Item> {
        let inner = self.live.borrow().get(name)?.upgrade()?;
        inner.alive.get().then_some(Item { inner })
    }

    pub(crate) fn insert(&self, item: &Item) {
        self.live
            .borrow_mut()
            .insert(item.name().to_string(), Rc::downgrade(&item.inner));
    }

    /// Invalidate the handle for `name` and forget it.
    pub(crate) fn invalidate(&self, name: &str) {
        let stale = self.live.borrow_mut().remove(name);
        if let Some(inner) = stale.and_then(|weak| weak.upgrade()) {
            Item { inner }.invalidate();
        }
    }

    pub(crate) fn invalidate_all(&self) {
        let stale: Vec<_> = self.live.borrow_mut().drain().map(|(_, weak)| weak).collect();
        for inner in stale.iter().filter_map(Weak::upgrade) {
            Item { inner }.invalidate();
        }
    }
}

impl Item {
    fn new(shared: Shared, name: ItemName, metadata: Option<Metadata>) -> Self {
        let layout = ItemLayout::new(name.as_str());
        Self {
            inner: Rc::new(ItemInner {
                shared,
                name,
                layout,
                alive: Cell::new(true),
                metadata: RefCell::new(metadata),
                arrays: RefCell::new(BTreeMap::new()),
            }),
        }
    }

    /// The registered handle for `name`, creating it if none is live.
    pub(crate) fn registered(shared: &Shared, name: ItemName, metadata: Option<Metadata>) -> Self {
        if let Some(item) = shared.handles.get(name.as_str()) {
            return item;
        }
        let item = Self::new(shared.clone(), name, metadata);
        shared.handles.insert(&item);
        item
    }

    /// The item name, which is its directory name.
    pub fn name(&self) -> &str {
        self.inner.name.as_str()
    }

    /// Location of the owning dataset.
    pub fn location(&self) -> &Location {
        self.inner.shared.backend.location()
    }

    pub fn is_readonly(&self) -> bool {
        self.inner.shared.readonly
    }

    /// Whether neither this item nor its dataset has been deleted through
    /// this handle.
    pub fn is_alive(&self) -> bool {
        self.inner.alive.get() && self.inner.shared.alive.get()
    }

    pub(crate) fn invalidate(&self) {
        self.inner.alive.set(false);
        self.clear_cache();
    }

    pub(crate) fn shared(&self) -> &Shared {
        &self.inner.shared
    }

    fn ensure_alive(&self) -> Result<()> {
        self.inner.shared.ensure_alive()?;
        if !self.inner.alive.get() {
            return Err(JbofError::Invalidated(format!("item '{}'", self.name())));
        }
        Ok(())
    }

    fn ensure_writable(&self) -> Result<()> {
        self.ensure_alive()?;
        self.inner.shared.ensure_writable()
    }

    /// Canonical path of the item directory.
    pub fn path(&self) -> Result<PathBuf> {
        self.ensure_alive()?;
        self.inner.shared.backend.resolve(self.inner.layout.dir_key())
    }

    /// The item metadata, read on first access.
    pub fn metadata(&self) -> Result<Metadata> {
        self.ensure_alive()?;
        if let Some(cached) = self.inner.metadata.borrow().as_ref() {
            return Ok(cached.clone());
        }
        let store = MetadataStore::new(self.inner.shared.backend.as_ref());
        let metadata = store.read(&self.inner.layout.metadata_key())?;
        *self.inner.metadata.borrow_mut() = Some(metadata.clone());
        Ok(metadata)
    }

    /// Names of the arrays in this item, sorted, without decoding them.
    pub fn array_names(&self) -> Result<Vec<String>> {
        self.ensure_alive()?;
        let files = self
            .inner
            .shared
            .backend
            .list_files(self.inner.layout.dir_key())?;
        Ok(files
            .iter()
            .filter_map(|file| sidecar_stem(file))
            .map(str::to_string)
            .collect())
    }

    /// Whether an array called `name` exists.
    pub fn has_array(&self, name: &str) -> Result<bool> {
        self.ensure_alive()?;
        Ok(self
            .inner
            .shared
            .backend
            .is_file(&self.inner.layout.sidecar_key(name)))
    }

    /// The array called `name`, decoded on first access.
    ///
    /// # Errors
    ///
    /// Returns [`JbofError::NotFound`] if the item has no such sidecar.
    pub fn get_array(&self, name: &str) -> Result<Rc<Array>> {
        self.ensure_alive()?;
        if let Some(cached) = self.inner.arrays.borrow().get(name) {
            return Ok(Rc::clone(cached));
        }
        let shared = &self.inner.shared;
        let loaded = Rc::new(array::load(
            shared.backend.as_ref(),
            &shared.codecs,
            &self.inner.layout,
            name,
        )?);
        self.inner
            .arrays
            .borrow_mut()
            .insert(name.to_string(), Rc::clone(&loaded));
        Ok(loaded)
    }

    /// All arrays as `(name, array)` pairs in name order, decoded lazily.
    pub fn all_arrays(&self) -> Result<impl Iterator<Item = Result<(String, Rc<Array>)>> + '_> {
        let names = self.array_names()?;
        Ok(names
            .into_iter()
            .map(move |name| self.get_array(&name).map(|array| (name, array))))
    }

    /// Encode `data` and store it as array `name`.
    ///
    /// The payload is encoded before anything is written; the payload file
    /// is written first, then the sidecar. If the sidecar cannot be written
    /// the payload is removed again.
    ///
    /// # Errors
    ///
    /// - [`JbofError::ReadOnly`] if the item is read-only
    /// - [`JbofError::InvalidName`] if `name` cannot be an array name
    /// - [`JbofError::AlreadyExists`] if a payload or sidecar of that name
    ///   exists
    /// - [`JbofError::ReservedKey`] if the metadata sets `_filename`
    /// - [`JbofError::MissingParameter`] for audio formats without a
    ///   sample rate
    /// - [`JbofError::Codec`] if the codec cannot store the data
    pub fn add_array(
        &self,
        name: &str,
        data: impl Into<ArrayData>,
        options: ArrayOptions,
    ) -> Result<Rc<Array>> {
        self.ensure_writable()?;
        let name = ArrayName::new(name)?;
        let format = options.format;
        let payload_key = self.inner.layout.payload_key(name.as_str(), format);
        self.ensure_free(&name, &payload_key)?;
        ensure_not_reserved(&options.metadata, &[FILENAME_KEY])?;

        let samplerate = match (format.is_audio(), options.samplerate) {
            (true, None) => {
                return Err(JbofError::MissingParameter {
                    format,
                    parameter: SAMPLERATE_KEY,
                })
            }
            (true, rate) => rate,
            (false, _) => None,
        };

        let data = data.into();
        let codec = self.inner.shared.codecs.get(format)?;
        let bytes = codec.encode(name.as_str(), &data, samplerate)?;
        self.inner.shared.backend.write(&payload_key, &bytes)?;

        let mut metadata = options.metadata;
        if let Some(rate) = samplerate {
            metadata.insert(SAMPLERATE_KEY.to_string(), rate.into());
        }
        self.write_sidecar(&name, format, metadata, &payload_key)?;
        tracing::debug!(item = %self.name(), array = %name, %format, "added array");
        self.get_array(name.as_str())
    }

    /// Copy an existing payload file in as array `name`.
    ///
    /// The format comes from the file extension. The file is decoded
    /// before anything is copied; for audio files the sample rate is read
    /// from the header and overrides any `samplerate` in `metadata`.
    ///
    /// # Errors
    ///
    /// - [`JbofError::ReadOnly`] if the item is read-only
    /// - [`JbofError::NotFound`] if `source` is not a file
    /// - [`JbofError::UnsupportedFormat`] if the extension is unknown
    /// - [`JbofError::AlreadyExists`] if the array exists
    /// - [`JbofError::Codec`] if the file does not decode
    pub fn add_array_from_file(
        &self,
        name: &str,
        source: impl AsRef<Path>,
        metadata: Metadata,
    ) -> Result<Rc<Array>> {
        self.ensure_writable()?;
        let source = source.as_ref();
        let name = ArrayName::new(name)?;
        if !source.is_file() {
            return Err(JbofError::NotFound(source.display().to_string()));
        }
        let file_name = source
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| JbofError::UnsupportedFormat(source.display().to_string()))?;
        let format = Format::of_file(file_name)?;
        let codec = self.inner.shared.codecs.get(format)?;
        let payload_key = self.inner.layout.payload_key(name.as_str(), format);
        self.ensure_free(&name, &payload_key)?;
        ensure_not_reserved(&metadata, &[FILENAME_KEY])?;

        // Nothing is written for a payload that does not decode.
        let bytes = fs::read(source).map_err(|e| JbofError::io(source, e))?;
        let decoded = codec.decode(name.as_str(), &bytes)?;
        let mut metadata = metadata;
        if let Some(rate) = decoded.samplerate {
            metadata.insert(SAMPLERATE_KEY.to_string(), rate.into());
        }

        self.inner.shared.backend.copy_in(source, &payload_key)?;
        self.write_sidecar(&name, format, metadata, &payload_key)?;
        tracing::debug!(
            item = %self.name(),
            array = %name,
            source = %source.display(),
            "copied array payload"
        );
        self.get_array(name.as_str())
    }

    fn ensure_free(&self, name: &ArrayName, payload_key: &str) -> Result<()> {
        let backend = &self.inner.shared.backend;
        let sidecar_key = self.inner.layout.sidecar_key(name.as_str());
        if backend.is_file(&sidecar_key) || backend.is_file(payload_key) {
            return Err(JbofError::AlreadyExists(format!(
                "array '{}' in item '{}'",
                name,
                self.name()
            )));
        }
        Ok(())
    }

    fn write_sidecar(
        &self,
        name: &ArrayName,
        format: Format,
        metadata: Metadata,
        payload_key: &str,
    ) -> Result<()> {
        let sidecar = ArraySidecar {
            metadata,
            filename: ItemLayout::payload_file(name.as_str(), format),
        };
        let store = MetadataStore::new(self.inner.shared.backend.as_ref());
        let written = store.write(&self.inner.layout.sidecar_key(name.as_str()), &sidecar.to_json());
        if written.is_err() {
            let _ = self.inner.shared.backend.remove_file(payload_key);
        }
        written
    }

    /// Remove `array`'s payload and sidecar.
    ///
    /// # Errors
    ///
    /// - [`JbofError::ReadOnly`] if the item is read-only
    /// - [`JbofError::TypeMismatch`] if `array` was loaded from another
    ///   item
    pub fn delete_array(&self, array: &Array) -> Result<()> {
        self.ensure_writable()?;
        if array.source.item_dir != self.path()? {
            return Err(JbofError::TypeMismatch(format!(
                "array '{}' belongs to item '{}', not '{}'",
                array.name(),
                array.source.item,
                self.name()
            )));
        }
        let backend = &self.inner.shared.backend;
        let layout = &self.inner.layout;
        match backend.remove_file(&layout.resolve_payload(&array.source.filename)) {
            Err(e) if !e.is_not_found() => return Err(e),
            _ => {}
        }
        backend.remove_file(&layout.sidecar_key(array.name()))?;
        self.inner.arrays.borrow_mut().remove(array.name());
        tracing::debug!(item = %self.name(), array = %array.name(), "deleted array");
        Ok(())
    }

    /// Drop cached metadata and decoded arrays.
    pub fn clear_cache(&self) {
        self.inner.metadata.borrow_mut().take();
        self.inner.arrays.borrow_mut().clear();
    }
}

impl PartialEq for Item {
    /// Items are equal when they live in the same directory, after
    /// resolving symlinks.
    fn eq(&self, other: &Self) -> bool {
        if Rc::ptr_eq(&self.inner, &other.inner) {
            return true;
        }
        match (self.path(), other.path()) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Item")
            .field("name", &self.name())
            .field("location", self.location())
            .field("readonly", &self.is_readonly())
            .field("alive", &self.is_alive())
            .finish()
    }
}

#[derive(Serialize, Deserialize)]
struct ItemState {
    location: Location,
    readonly: bool,
    name: ItemName,
}

impl Serialize for Item {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        ItemState {
            location: self.location().clone(),
            readonly: self.is_readonly(),
            name: self.inner.name.clone(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Item {
    /// Reopens the dataset location; all caches start empty.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let state = ItemState::deserialize(deserializer)?;
        let reopen = || -> Result<Item> {
            let shared = Shared::open(&state.location, state.readonly)?;
            if !shared.backend.is_dir(state.name.as_str()) {
                return Err(JbofError::NotFound(format!(
                    "item '{}' in {}",
                    state.name, state.location
                )));
            }
            Ok(Item::registered(&shared, state.name.clone(), None))
        };
        reopen().map_err(de::Error::custom)
    }
}
