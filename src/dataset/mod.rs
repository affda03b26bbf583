//! dataset
//!
//! The dataset root: item lifecycle, naming, lookup cache, and hashing.
//!
//! # Architecture
//!
//! A [`DataSet`] wraps one storage backend. Items and arrays reach the
//! backend through the same shared context, so a dataset and every handle
//! derived from it agree on read-only mode and on whether the dataset
//! still exists.
//!
//! # Item Cache
//!
//! The first complete pass over [`DataSet::all_items`] records the item
//! handles; later passes replay them without listing the directory. The
//! policy is asymmetric:
//!
//! - [`DataSet::add_item`] appends to a populated cache
//! - [`DataSet::delete_item`] clears the cache wholesale
//!
//! A pass that stops early, fails, or overlaps an add or delete does not
//! populate the cache.
//!
//! # Example
//!
//! ```no_run
//! use jbof::{DataSet, Query};
//! use serde_json::json;
//!
//! let dataset = DataSet::create(
//!     "/data/recordings",
//!     json!({"license": "CC0"}).as_object().cloned().unwrap(),
//!     Some("{speaker}-{take:03d}"),
//! )?;
//! let item = dataset.add_item(None, json!({"speaker": "ann", "take": 1}).as_object().cloned().unwrap())?;
//! assert_eq!(item.name(), "ann-001");
//!
//! for item in dataset.find_items(Query::new().equals("speaker", "ann"))? {
//!     println!("{}", item?.name());
//! }
//! # Ok::<(), jbof::JbofError>(())
//! ```

pub mod array;
pub mod item;
pub mod query;

pub use array::{Array, ArraySource};
pub use item::{ArrayOptions, Item};
pub use query::Query;

use item::ItemHandles;

use std::cell::{Cell, RefCell};
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::backend::{archive, Backend, DirectoryBackend, ItemDirs, Location};
use crate::codec::CodecRegistry;
use crate::core::errors::{JbofError, Result};
use crate::core::hash;
use crate::core::metadata::schema::ensure_not_reserved;
use crate::core::metadata::{DataSetDocument, Metadata, MetadataStore};
use crate::core::naming::{item_name, ItemFormat};
use crate::core::paths::{ItemLayout, ITEMFORMAT_KEY, METADATA_FILE};
use crate::core::types::{Fingerprint, ItemName};

/// Context shared by a dataset and all handles derived from it.
#[derive(Clone)]
pub(crate) struct Shared {
    pub(crate) backend: Rc<dyn Backend>,
    pub(crate) codecs: Rc<CodecRegistry>,
    pub(crate) readonly: bool,
    pub(crate) alive: Rc<Cell<bool>>,
    pub(crate) handles: Rc<ItemHandles>,
}

impl Shared {
    fn new(backend: Rc<dyn Backend>, readonly: bool) -> Self {
        let readonly = readonly || !backend.is_writable();
        Self {
            backend,
            codecs: Rc::new(CodecRegistry::builtin()),
            readonly,
            alive: Rc::new(Cell::new(true)),
            handles: Rc::new(ItemHandles::default()),
        }
    }

    pub(crate) fn open(location: &Location, readonly: bool) -> Result<Self> {
        Ok(Self::new(location.open()?, readonly))
    }

    pub(crate) fn ensure_alive(&self) -> Result<()> {
        if self.alive.get() {
            Ok(())
        } else {
            Err(JbofError::Invalidated(format!(
                "dataset {}",
                self.backend.location()
            )))
        }
    }

    pub(crate) fn ensure_writable(&self) -> Result<()> {
        self.ensure_alive()?;
        if self.readonly {
            return Err(JbofError::ReadOnly(format!(
                "dataset {}",
                self.backend.location()
            )));
        }
        Ok(())
    }

    fn root(&self) -> Result<PathBuf> {
        self.backend.resolve("")
    }
}

#[derive(Default)]
struct ItemCache {
    items: Option<Vec<Item>>,
    /// Bumped by every structural mutation.
    generation: u64,
}

/// An item given by handle or by name.
#[derive(Debug, Clone, Copy)]
pub enum ItemRef<'a> {
    Handle(&'a Item),
    Name(&'a str),
}

impl<'a> From<&'a Item> for ItemRef<'a> {
    fn from(item: &'a Item) -> Self {
        ItemRef::Handle(item)
    }
}

impl<'a> From<&'a str> for ItemRef<'a> {
    fn from(name: &'a str) -> Self {
        ItemRef::Name(name)
    }
}

impl<'a> From<&'a String> for ItemRef<'a> {
    fn from(name: &'a String) -> Self {
        ItemRef::Name(name)
    }
}

/// A dataset: a directory (or archive) of items.
pub struct DataSet {
    shared: Shared,
    document: DataSetDocument,
    cache: RefCell<ItemCache>,
}

impl DataSet {
    /// Create a new dataset directory.
    ///
    /// `itemformat` is a naming template such as `"{speaker}-{take:03d}"`;
    /// without one, items get fresh unique names.
    ///
    /// # Errors
    ///
    /// - [`JbofError::InvalidTemplate`] if `itemformat` has no placeholder
    ///   or is malformed
    /// - [`JbofError::ReservedKey`] if `metadata` sets `_itemformat`
    /// - [`JbofError::AlreadyExists`] if `directory` exists
    /// - [`JbofError::NotFound`] if its parent does not
    pub fn create(
        directory: impl AsRef<Path>,
        metadata: Metadata,
        itemformat: Option<&str>,
    ) -> Result<Self> {
        let directory = directory.as_ref();
        let itemformat = itemformat.map(ItemFormat::parse).transpose()?;
        ensure_not_reserved(&metadata, &[ITEMFORMAT_KEY])?;

        let backend = DirectoryBackend::create(directory)?;
        let document = DataSetDocument {
            metadata,
            itemformat,
        };
        if let Err(e) = MetadataStore::new(&backend).write(METADATA_FILE, &document.to_json()) {
            let _ = backend.destroy();
            return Err(e);
        }
        tracing::debug!(dataset = %directory.display(), "created dataset");
        Ok(Self::from_parts(Shared::new(Rc::new(backend), false), document))
    }

    /// Open an existing dataset directory.
    ///
    /// # Errors
    ///
    /// - [`JbofError::NotFound`] if the directory or its `_metadata.json`
    ///   is missing
    /// - [`JbofError::TypeMismatch`] if the stored `_itemformat` is not a
    ///   string or null
    pub fn open(directory: impl AsRef<Path>, readonly: bool) -> Result<Self> {
        Self::open_location(&Location::Directory(directory.as_ref().to_path_buf()), readonly)
    }

    /// Open a zip archive of a dataset. Archives are always read-only.
    pub fn open_archive(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_location(&Location::Archive(path.as_ref().to_path_buf()), true)
    }

    /// Open the dataset at `location`.
    pub fn open_location(location: &Location, readonly: bool) -> Result<Self> {
        let shared = Shared::open(location, readonly)?;
        let raw = MetadataStore::new(shared.backend.as_ref()).read(METADATA_FILE)?;
        let document = DataSetDocument::from_json(raw)?;
        tracing::debug!(dataset = %location, readonly = shared.readonly, "opened dataset");
        Ok(Self::from_parts(shared, document))
    }

    fn from_parts(shared: Shared, document: DataSetDocument) -> Self {
        Self {
            shared,
            document,
            cache: RefCell::new(ItemCache::default()),
        }
    }

    /// Dataset metadata, without the reserved `_itemformat`.
    pub fn metadata(&self) -> &Metadata {
        &self.document.metadata
    }

    /// The item naming template, if any.
    pub fn itemformat(&self) -> Option<&str> {
        self.document.itemformat.as_ref().map(ItemFormat::as_str)
    }

    pub fn location(&self) -> &Location {
        self.shared.backend.location()
    }

    pub fn is_readonly(&self) -> bool {
        self.shared.readonly
    }

    /// Canonical path of the dataset root.
    pub fn path(&self) -> Result<PathBuf> {
        self.shared.ensure_alive()?;
        self.shared.root()
    }

    /// Every item, lazily. See the module docs for caching.
    pub fn all_items(&self) -> Result<Items<'_>> {
        self.shared.ensure_alive()?;
        let cache = self.cache.borrow();
        let state = match &cache.items {
            Some(items) => ItemsState::Cached(items.clone().into_iter()),
            None => ItemsState::Scanning {
                dirs: self.shared.backend.item_dirs()?,
                seen: Vec::new(),
                generation: cache.generation,
                failed: false,
            },
        };
        Ok(Items {
            dataset: self,
            state,
        })
    }

    fn commit_scan(&self, generation: u64, items: Vec<Item>) {
        let mut cache = self.cache.borrow_mut();
        if cache.generation == generation && cache.items.is_none() {
            tracing::debug!(items = items.len(), "item cache populated");
            cache.items = Some(items);
        }
    }

    /// Items whose metadata matches `query`, lazily.
    pub fn find_items(&self, query: Query) -> Result<impl Iterator<Item = Result<Item>> + '_> {
        let items = self.all_items()?;
        Ok(items.filter_map(move |item| {
            let found = item.and_then(|item| {
                let metadata = item.metadata()?;
                Ok(query.matches(&metadata).then_some(item))
            });
            found.transpose()
        }))
    }

    /// The first item matching `query`.
    pub fn find_one_item(&self, query: &Query) -> Result<Option<Item>> {
        self.find_items(query.clone())?.next().transpose()
    }

    /// Create a new item.
    ///
    /// The name is `name` if given, else rendered from the dataset's item
    /// format template, else a fresh unique identifier.
    ///
    /// # Errors
    ///
    /// - [`JbofError::ReadOnly`] if the dataset is read-only
    /// - [`JbofError::MissingKey`] if the template references a key
    ///   missing from `metadata`
    /// - [`JbofError::InvalidName`] if the name is reserved or not a
    ///   single path component
    /// - [`JbofError::AlreadyExists`] if the item exists
    pub fn add_item(&self, name: Option<&str>, metadata: Metadata) -> Result<Item> {
        self.shared.ensure_writable()?;
        let name = match name {
            Some(name) => name.to_string(),
            None => item_name(self.document.itemformat.as_ref(), &metadata)?,
        };
        let name = ItemName::new(name)?;
        let backend = &self.shared.backend;
        if backend.is_dir(name.as_str()) || backend.is_file(name.as_str()) {
            return Err(JbofError::AlreadyExists(format!(
                "item '{}' in {}",
                name,
                self.location()
            )));
        }

        backend.create_dir(name.as_str())?;
        // A live handle for a missing directory is left over from an
        // outside removal.
        self.shared.handles.invalidate(name.as_str());
        let item = Item::registered(&self.shared, name, Some(metadata));
        let written = {
            let metadata = item.metadata()?;
            MetadataStore::new(backend.as_ref())
                .write(&ItemLayout::new(item.name()).metadata_key(), &metadata)
        };
        if let Err(e) = written {
            let _ = backend.remove_dir_all(item.name());
            self.shared.handles.invalidate(item.name());
            return Err(e);
        }

        let mut cache = self.cache.borrow_mut();
        cache.generation += 1;
        if let Some(items) = cache.items.as_mut() {
            items.push(item.clone());
        }
        tracing::debug!(item = %item.name(), "added item");
        Ok(item)
    }

    /// Whether an item called `name` exists.
    pub fn has_item(&self, name: &str) -> Result<bool> {
        self.shared.ensure_alive()?;
        Ok(ItemName::new(name).is_ok() && self.shared.backend.is_dir(name))
    }

    /// The item called `name`. Returns the live handle when one has
    /// already been handed out.
    pub fn get_item(&self, name: &str) -> Result<Item> {
        self.shared.ensure_alive()?;
        let name = ItemName::new(name)?;
        if let Some(item) = self.shared.handles.get(name.as_str()) {
            return Ok(item);
        }
        if !self.shared.backend.is_dir(name.as_str()) {
            return Err(JbofError::NotFound(format!(
                "item '{}' in {}",
                name,
                self.location()
            )));
        }
        Ok(Item::registered(&self.shared, name, None))
    }

    /// Delete an item and everything in it.
    ///
    /// Clears the item cache and invalidates every handle of the item.
    ///
    /// # Errors
    ///
    /// - [`JbofError::ReadOnly`] if the dataset is read-only
    /// - [`JbofError::TypeMismatch`] if the handle belongs to another
    ///   dataset
    /// - [`JbofError::NotFound`] if the item does not exist
    pub fn delete_item<'a>(&self, item: impl Into<ItemRef<'a>>) -> Result<()> {
        self.shared.ensure_writable()?;
        let item = item.into();
        let name = match item {
            ItemRef::Handle(handle) => {
                if !handle.is_alive() {
                    return Err(JbofError::Invalidated(format!("item '{}'", handle.name())));
                }
                if handle.shared().root()? != self.shared.root()? {
                    return Err(JbofError::TypeMismatch(format!(
                        "item '{}' belongs to {}, not {}",
                        handle.name(),
                        handle.location(),
                        self.location()
                    )));
                }
                handle.name()
            }
            ItemRef::Name(name) => {
                ItemName::new(name)?;
                name
            }
        };
        if !self.shared.backend.is_dir(name) {
            return Err(JbofError::NotFound(format!(
                "item '{}' in {}",
                name,
                self.location()
            )));
        }

        {
            let mut cache = self.cache.borrow_mut();
            cache.generation += 1;
            cache.items = None;
        }
        self.shared.backend.remove_dir_all(name)?;

        if let ItemRef::Handle(handle) = item {
            handle.invalidate();
        }
        self.shared.handles.invalidate(name);
        tracing::debug!(item = %name, "deleted item");
        Ok(())
    }

    /// Order-independent content fingerprint of every item.
    pub fn calculate_hash(&self) -> Result<Fingerprint> {
        self.shared.ensure_alive()?;
        hash::dataset_fingerprint(self.shared.backend.as_ref())
    }

    /// Delete the whole dataset. This handle and every item handle derived
    /// from it become invalid.
    pub fn delete_dataset(&self) -> Result<()> {
        self.shared.ensure_writable()?;
        self.shared.backend.destroy()?;
        self.shared.alive.set(false);
        {
            let mut cache = self.cache.borrow_mut();
            cache.generation += 1;
            cache.items = None;
        }
        self.shared.handles.invalidate_all();
        tracing::debug!(dataset = %self.location(), "deleted dataset");
        Ok(())
    }

    /// Write every file of the dataset into a new zip archive at `dest`.
    /// Returns the number of files written.
    pub fn export_archive(&self, dest: impl AsRef<Path>) -> Result<usize> {
        self.shared.ensure_alive()?;
        archive::export(self.shared.backend.as_ref(), dest.as_ref())
    }
}

impl fmt::Debug for DataSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataSet")
            .field("location", self.location())
            .field("readonly", &self.is_readonly())
            .field("itemformat", &self.itemformat())
            .finish()
    }
}

#[derive(Serialize, Deserialize)]
struct DataSetState {
    location: Location,
    readonly: bool,
}

impl Serialize for DataSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        DataSetState {
            location: self.location().clone(),
            readonly: self.is_readonly(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for DataSet {
    /// Reopens the location; all caches start empty.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let state = DataSetState::deserialize(deserializer)?;
        DataSet::open_location(&state.location, state.readonly).map_err(de::Error::custom)
    }
}

enum ItemsState<'a> {
    Cached(std::vec::IntoIter<Item>),
    Scanning {
        dirs: ItemDirs<'a>,
        seen: Vec<Item>,
        generation: u64,
        failed: bool,
    },
    Done,
}

/// Iterator returned by [`DataSet::all_items`].
pub struct Items<'a> {
    dataset: &'a DataSet,
    state: ItemsState<'a>,
}

impl Iterator for Items<'_> {
    type Item = Result<Item>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let scanned = match &mut self.state {
                ItemsState::Cached(items) => return items.next().map(Ok),
                ItemsState::Done => return None,
                ItemsState::Scanning {
                    dirs,
                    seen,
                    failed,
                    ..
                } => match dirs.next() {
                    Some(Ok(name)) => match ItemName::new(name) {
                        Ok(name) => {
                            let item = Item::registered(&self.dataset.shared, name, None);
                            seen.push(item.clone());
                            return Some(Ok(item));
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "skipping directory that is not an item");
                            continue;
                        }
                    },
                    Some(Err(e)) => {
                        *failed = true;
                        return Some(Err(e));
                    }
                    None => std::mem::replace(&mut self.state, ItemsState::Done),
                },
            };
            if let ItemsState::Scanning {
                seen,
                generation,
                failed: false,
                ..
            } = scanned
            {
                self.dataset.commit_scan(generation, seen);
            }
            return None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn meta(value: serde_json::Value) -> Metadata {
        value.as_object().cloned().expect("object")
    }

    fn create_test_dataset(itemformat: Option<&str>) -> (TempDir, DataSet) {
        let temp = TempDir::new().expect("create temp dir");
        let dataset = DataSet::create(
            temp.path().join("set"),
            meta(json!({"kind": "test"})),
            itemformat,
        )
        .expect("create dataset");
        (temp, dataset)
    }

    fn names(dataset: &DataSet) -> Vec<String> {
        let mut names: Vec<_> = dataset
            .all_items()
            .unwrap()
            .map(|item| item.unwrap().name().to_string())
            .collect();
        names.sort();
        names
    }

    mod lifecycle {
        use super::*;

        #[test]
        fn create_writes_metadata_with_itemformat() {
            let (temp, dataset) = create_test_dataset(Some("{n}"));
            let raw = std::fs::read_to_string(temp.path().join("set/_metadata.json")).unwrap();
            assert_eq!(raw, "{\n  \"_itemformat\": \"{n}\",\n  \"kind\": \"test\"\n}");
            assert_eq!(dataset.metadata(), &meta(json!({"kind": "test"})));
            assert_eq!(dataset.itemformat(), Some("{n}"));
        }

        #[test]
        fn create_existing_is_already_exists() {
            let (temp, _dataset) = create_test_dataset(None);
            let err = DataSet::create(temp.path().join("set"), Metadata::new(), None).unwrap_err();
            assert!(matches!(err, JbofError::AlreadyExists(_)));
        }

        #[test]
        fn create_rejects_markerless_template() {
            let temp = TempDir::new().expect("create temp dir");
            let err = DataSet::create(temp.path().join("set"), Metadata::new(), Some("fixed"))
                .unwrap_err();
            assert!(matches!(err, JbofError::InvalidTemplate(_)));
            assert!(!temp.path().join("set").exists());
        }

        #[test]
        fn create_rejects_reserved_key() {
            let temp = TempDir::new().expect("create temp dir");
            let err = DataSet::create(
                temp.path().join("set"),
                meta(json!({"_itemformat": "{x}"})),
                None,
            )
            .unwrap_err();
            assert!(matches!(err, JbofError::ReservedKey(_)));
        }

        #[test]
        fn open_missing_is_not_found() {
            let temp = TempDir::new().expect("create temp dir");
            assert!(DataSet::open(temp.path().join("nope"), true)
                .unwrap_err()
                .is_not_found());

            std::fs::create_dir(temp.path().join("bare")).unwrap();
            assert!(DataSet::open(temp.path().join("bare"), true)
                .unwrap_err()
                .is_not_found());
        }

        #[test]
        fn open_non_string_itemformat_is_type_mismatch() {
            let temp = TempDir::new().expect("create temp dir");
            let dir = temp.path().join("set");
            std::fs::create_dir(&dir).unwrap();
            std::fs::write(dir.join("_metadata.json"), b"{\"_itemformat\": 3}").unwrap();
            assert!(matches!(
                DataSet::open(&dir, true),
                Err(JbofError::TypeMismatch(_))
            ));
        }

        #[test]
        fn delete_dataset_invalidates_handles() {
            let (temp, dataset) = create_test_dataset(None);
            let item = dataset.add_item(Some("a"), Metadata::new()).unwrap();
            dataset.delete_dataset().unwrap();

            assert!(!temp.path().join("set").exists());
            assert!(matches!(
                dataset.all_items(),
                Err(JbofError::Invalidated(_))
            ));
            assert!(matches!(item.metadata(), Err(JbofError::Invalidated(_))));
        }
    }

    mod items {
        use super::*;

        #[test]
        fn template_names_items() {
            let (_temp, dataset) = create_test_dataset(Some("{speaker}-{take:02d}"));
            let item = dataset
                .add_item(None, meta(json!({"speaker": "ann", "take": 3})))
                .unwrap();
            assert_eq!(item.name(), "ann-03");
        }

        #[test]
        fn template_missing_key() {
            let (_temp, dataset) = create_test_dataset(Some("{speaker}"));
            let err = dataset.add_item(None, Metadata::new()).unwrap_err();
            assert!(matches!(err, JbofError::MissingKey(k) if k == "speaker"));
        }

        #[test]
        fn no_template_uses_fresh_names() {
            let (_temp, dataset) = create_test_dataset(None);
            let a = dataset.add_item(None, Metadata::new()).unwrap();
            let b = dataset.add_item(None, Metadata::new()).unwrap();
            assert_ne!(a.name(), b.name());
            assert_eq!(a.name().len(), 36);
        }

        #[test]
        fn explicit_name_wins() {
            let (_temp, dataset) = create_test_dataset(Some("{speaker}"));
            let item = dataset.add_item(Some("custom"), Metadata::new()).unwrap();
            assert_eq!(item.name(), "custom");
        }

        #[test]
        fn reserved_names_are_invalid() {
            let (_temp, dataset) = create_test_dataset(None);
            for name in ["_metadata.json", "__pycache__", "a/b", ".."] {
                assert!(matches!(
                    dataset.add_item(Some(name), Metadata::new()),
                    Err(JbofError::InvalidName(_))
                ));
            }
        }

        #[test]
        fn duplicate_keeps_original_metadata() {
            let (_temp, dataset) = create_test_dataset(None);
            dataset
                .add_item(Some("a"), meta(json!({"v": 1})))
                .unwrap();
            let err = dataset
                .add_item(Some("a"), meta(json!({"v": 2})))
                .unwrap_err();
            assert!(matches!(err, JbofError::AlreadyExists(_)));
            assert_eq!(
                dataset.get_item("a").unwrap().metadata().unwrap()["v"],
                1
            );
        }

        #[test]
        fn get_missing_is_not_found() {
            let (_temp, dataset) = create_test_dataset(None);
            assert!(dataset.get_item("nope").unwrap_err().is_not_found());
            assert!(!dataset.has_item("nope").unwrap());
        }

        #[test]
        fn enumeration_skips_reserved_directories() {
            let (temp, dataset) = create_test_dataset(None);
            dataset.add_item(Some("a"), Metadata::new()).unwrap();
            std::fs::create_dir(temp.path().join("set/__pycache__")).unwrap();
            std::fs::create_dir(temp.path().join("set/.git")).unwrap();
            assert_eq!(names(&dataset), vec!["a"]);
        }

        #[test]
        fn delete_by_name_and_handle() {
            let (_temp, dataset) = create_test_dataset(None);
            let a = dataset.add_item(Some("a"), Metadata::new()).unwrap();
            dataset.add_item(Some("b"), Metadata::new()).unwrap();

            dataset.delete_item(&a).unwrap();
            assert!(matches!(a.metadata(), Err(JbofError::Invalidated(_))));
            dataset.delete_item("b").unwrap();
            assert!(names(&dataset).is_empty());
            assert!(dataset.delete_item("b").unwrap_err().is_not_found());
        }

        #[test]
        fn delete_foreign_handle_is_type_mismatch() {
            let (temp, dataset) = create_test_dataset(None);
            let other = DataSet::create(temp.path().join("other"), Metadata::new(), None).unwrap();
            let foreign = other.add_item(Some("a"), Metadata::new()).unwrap();
            dataset.add_item(Some("a"), Metadata::new()).unwrap();

            assert!(matches!(
                dataset.delete_item(&foreign),
                Err(JbofError::TypeMismatch(_))
            ));
            assert!(dataset.has_item("a").unwrap());
        }

        #[test]
        fn readonly_refuses_mutation() {
            let (temp, dataset) = create_test_dataset(None);
            dataset.add_item(Some("a"), Metadata::new()).unwrap();
            let readonly = DataSet::open(temp.path().join("set"), true).unwrap();

            assert!(matches!(
                readonly.add_item(Some("b"), Metadata::new()),
                Err(JbofError::ReadOnly(_))
            ));
            assert!(matches!(
                readonly.delete_item("a"),
                Err(JbofError::ReadOnly(_))
            ));
            assert!(matches!(
                readonly.delete_dataset(),
                Err(JbofError::ReadOnly(_))
            ));
            assert_eq!(names(&readonly), vec!["a"]);
        }
    }

    mod cache {
        use super::*;

        fn cached_len(dataset: &DataSet) -> Option<usize> {
            dataset.cache.borrow().items.as_ref().map(Vec::len)
        }

        #[test]
        fn full_pass_populates_cache() {
            let (_temp, dataset) = create_test_dataset(None);
            dataset.add_item(Some("a"), Metadata::new()).unwrap();
            assert_eq!(cached_len(&dataset), None);

            assert_eq!(names(&dataset), vec!["a"]);
            assert_eq!(cached_len(&dataset), Some(1));
        }

        #[test]
        fn partial_pass_does_not() {
            let (_temp, dataset) = create_test_dataset(None);
            dataset.add_item(Some("a"), Metadata::new()).unwrap();
            dataset.add_item(Some("b"), Metadata::new()).unwrap();

            let first = dataset.all_items().unwrap().next();
            assert!(first.is_some());
            assert_eq!(cached_len(&dataset), None);
        }

        #[test]
        fn add_appends_to_populated_cache() {
            let (_temp, dataset) = create_test_dataset(None);
            dataset.add_item(Some("a"), Metadata::new()).unwrap();
            names(&dataset);
            dataset.add_item(Some("b"), Metadata::new()).unwrap();

            assert_eq!(cached_len(&dataset), Some(2));
            assert_eq!(names(&dataset), vec!["a", "b"]);
        }

        #[test]
        fn delete_clears_cache() {
            let (_temp, dataset) = create_test_dataset(None);
            dataset.add_item(Some("a"), Metadata::new()).unwrap();
            names(&dataset);
            dataset.delete_item("a").unwrap();

            assert_eq!(cached_len(&dataset), None);
            assert!(names(&dataset).is_empty());
        }

        #[test]
        fn mutation_during_pass_does_not_populate() {
            let (_temp, dataset) = create_test_dataset(None);
            dataset.add_item(Some("a"), Metadata::new()).unwrap();

            let mut pass = dataset.all_items().unwrap();
            dataset.add_item(Some("b"), Metadata::new()).unwrap();
            while pass.next().is_some() {}

            assert_eq!(cached_len(&dataset), None);
            assert_eq!(names(&dataset), vec!["a", "b"]);
        }

        #[test]
        fn get_item_returns_cached_handle() {
            let (_temp, dataset) = create_test_dataset(None);
            dataset.add_item(Some("a"), Metadata::new()).unwrap();
            names(&dataset);

            // Deleting by name invalidates every cached handle of that item.
            let cached = dataset.get_item("a").unwrap();
            dataset.delete_item("a").unwrap();
            assert!(!cached.is_alive());
        }
    }

    mod handles {
        use super::*;
        use crate::codec::ArrayData;

        #[test]
        fn lookups_share_array_cache() {
            let (_temp, dataset) = create_test_dataset(None);
            dataset.add_item(Some("i"), Metadata::new()).unwrap();
            let a = dataset.get_item("i").unwrap();
            let b = dataset.get_item("i").unwrap();

            b.add_array("x", vec![1.0f64], ArrayOptions::new()).unwrap();
            assert_eq!(a.get_array("x").unwrap().value, ArrayData::from(vec![1.0f64]));

            let old = b.get_array("x").unwrap();
            b.delete_array(&old).unwrap();
            b.add_array("x", vec![2.0f64], ArrayOptions::new()).unwrap();
            assert_eq!(a.get_array("x").unwrap().value, ArrayData::from(vec![2.0f64]));
        }

        #[test]
        fn scan_yields_the_looked_up_handle() {
            let (temp, dataset) = create_test_dataset(None);
            dataset.add_item(Some("i"), meta(json!({"v": 1}))).unwrap();
            let looked_up = dataset.get_item("i").unwrap();
            assert_eq!(looked_up.metadata().unwrap()["v"], 1);

            std::fs::write(temp.path().join("set/i/_metadata.json"), b"{\"v\": 2}").unwrap();
            let scanned = dataset.all_items().unwrap().next().unwrap().unwrap();
            scanned.clear_cache();
            assert_eq!(looked_up.metadata().unwrap()["v"], 2);
        }

        #[test]
        fn delete_by_name_invalidates_earlier_lookups() {
            let (_temp, dataset) = create_test_dataset(None);
            dataset.add_item(Some("i"), meta(json!({"k": 1}))).unwrap();
            let earlier = dataset.get_item("i").unwrap();
            assert_eq!(earlier.metadata().unwrap()["k"], 1);

            dataset.delete_item("i").unwrap();
            assert!(!earlier.is_alive());
            assert!(matches!(earlier.metadata(), Err(JbofError::Invalidated(_))));
        }

        #[test]
        fn delete_through_one_handle_invalidates_the_other() {
            let (_temp, dataset) = create_test_dataset(None);
            let added = dataset.add_item(Some("i"), Metadata::new()).unwrap();
            let looked_up = dataset.get_item("i").unwrap();

            dataset.delete_item(&looked_up).unwrap();
            assert!(!added.is_alive());
            assert!(matches!(
                added.array_names(),
                Err(JbofError::Invalidated(_))
            ));
        }

        #[test]
        fn re_added_item_gets_a_fresh_handle() {
            let (_temp, dataset) = create_test_dataset(None);
            let first = dataset.add_item(Some("i"), meta(json!({"v": 1}))).unwrap();
            dataset.delete_item("i").unwrap();
            let second = dataset.add_item(Some("i"), meta(json!({"v": 2}))).unwrap();

            assert!(!first.is_alive());
            assert_eq!(dataset.get_item("i").unwrap().metadata().unwrap()["v"], 2);
            assert!(second.is_alive());
        }
    }

    mod queries {
        use super::*;

        #[test]
        fn find_filters_on_metadata() {
            let (_temp, dataset) = create_test_dataset(None);
            dataset
                .add_item(Some("a"), meta(json!({"speaker": "ann", "take": 1})))
                .unwrap();
            dataset
                .add_item(Some("b"), meta(json!({"speaker": "bob", "take": 1})))
                .unwrap();
            dataset
                .add_item(Some("c"), meta(json!({"speaker": "ann", "take": 2})))
                .unwrap();

            let mut found: Vec<_> = dataset
                .find_items(Query::new().equals("speaker", "ann"))
                .unwrap()
                .map(|item| item.unwrap().name().to_string())
                .collect();
            found.sort();
            assert_eq!(found, vec!["a", "c"]);

            let one = dataset
                .find_one_item(&Query::new().equals("speaker", "bob"))
                .unwrap()
                .unwrap();
            assert_eq!(one.name(), "b");
            assert!(dataset
                .find_one_item(&Query::new().equals("speaker", "eve"))
                .unwrap()
                .is_none());
        }
    }

    #[test]
    fn serde_reopens_location() {
        let (_temp, dataset) = create_test_dataset(Some("{n}"));
        dataset.add_item(Some("a"), Metadata::new()).unwrap();
        names(&dataset);

        let json = serde_json::to_value(&dataset).unwrap();
        assert_eq!(json["readonly"], false);
        assert_eq!(json["location"]["backend"], "directory");

        let back: DataSet = serde_json::from_value(json).unwrap();
        assert!(back.cache.borrow().items.is_none());
        assert_eq!(back.itemformat(), Some("{n}"));
        assert_eq!(names(&back), vec!["a"]);
    }
}
