//! backend::archive
//!
//! Read-only backend over a zip archive of a dataset directory.
//!
//! # Layout
//!
//! The archive holds the dataset tree either at its root
//! (`_metadata.json`, `item/...`) or below a single top-level directory
//! (`set/_metadata.json`, `set/item/...`), which is what zipping the
//! dataset directory itself produces. Explicit directory entries are
//! optional; directories are inferred from file keys.
//!
//! [`export`] writes the first form from any backend.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::{Backend, ItemDirs, Location};
use crate::core::errors::{JbofError, Result};
use crate::core::paths::{has_hidden_component, is_item_dir, METADATA_FILE};

/// Backend over a zip archive. Never writable.
#[derive(Debug)]
pub struct ArchiveBackend {
    location: Location,
    /// Canonical archive path, the base of [`Backend::resolve`]
    canonical: PathBuf,
    /// Archive-internal prefix of the dataset root (`""` or `"dir/"`)
    prefix: String,
    /// File keys relative to the dataset root
    files: BTreeSet<String>,
    archive: RefCell<ZipArchive<File>>,
}

impl ArchiveBackend {
    /// Open the archive at `path`.
    ///
    /// # Errors
    ///
    /// - [`JbofError::NotFound`] if the file is missing or the archive has
    ///   no dataset `_metadata.json`
    /// - [`JbofError::Archive`] if it is not a readable zip file
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| JbofError::io(path, e))?;
        let archive = ZipArchive::new(file)?;
        let names: Vec<String> = archive
            .file_names()
            .filter(|name| !name.ends_with('/'))
            .map(|name| name.replace('\\', "/"))
            .collect();

        let prefix = detect_prefix(&names).ok_or_else(|| {
            JbofError::NotFound(format!("{} in archive {}", METADATA_FILE, path.display()))
        })?;
        let files = names
            .iter()
            .filter_map(|name| name.strip_prefix(prefix.as_str()))
            .filter(|key| !key.is_empty())
            .map(str::to_string)
            .collect();
        let canonical = fs::canonicalize(path).map_err(|e| JbofError::io(path, e))?;

        tracing::debug!(archive = %path.display(), prefix = %prefix, "opened dataset archive");
        Ok(Self {
            location: Location::Archive(path.to_path_buf()),
            canonical,
            prefix,
            files,
            archive: RefCell::new(archive),
        })
    }

    fn files_below<'a>(&'a self, dir: &str) -> impl Iterator<Item = &'a str> + 'a {
        let dir_prefix = if dir.is_empty() {
            String::new()
        } else {
            format!("{}/", dir)
        };
        self.files
            .iter()
            .filter(move |key| key.starts_with(dir_prefix.as_str()))
            .map(String::as_str)
    }
}

/// Find where the dataset root sits inside the archive.
fn detect_prefix(names: &[String]) -> Option<String> {
    if names.iter().any(|n| n == METADATA_FILE) {
        return Some(String::new());
    }
    let mut roots = names.iter().filter_map(|n| {
        let (dir, rest) = n.split_once('/')?;
        (rest == METADATA_FILE).then(|| format!("{}/", dir))
    });
    let first = roots.next()?;
    // Several candidate roots means this is not a single dataset.
    if roots.next().is_some() {
        return None;
    }
    Some(first)
}

impl Backend for ArchiveBackend {
    fn location(&self) -> &Location {
        &self.location
    }

    fn item_dirs(&self) -> Result<ItemDirs<'_>> {
        let dirs: BTreeSet<&str> = self
            .files
            .iter()
            .filter_map(|key| key.split_once('/').map(|(dir, _)| dir))
            .filter(|dir| is_item_dir(dir))
            .collect();
        Ok(Box::new(dirs.into_iter().map(|dir| Ok(dir.to_string()))))
    }

    fn list_files(&self, dir: &str) -> Result<Vec<String>> {
        let skip = if dir.is_empty() { 0 } else { dir.len() + 1 };
        Ok(self
            .files_below(dir)
            .map(|key| &key[skip..])
            .filter(|name| !name.contains('/'))
            .map(str::to_string)
            .collect())
    }

    fn walk_files(&self, dir: &str) -> Result<Vec<String>> {
        Ok(self
            .files_below(dir)
            .filter(|key| !has_hidden_component(key))
            .map(str::to_string)
            .collect())
    }

    fn is_dir(&self, key: &str) -> bool {
        key.is_empty() || self.files_below(key).next().is_some()
    }

    fn is_file(&self, key: &str) -> bool {
        self.files.contains(key)
    }

    fn read(&self, key: &str) -> Result<Vec<u8>> {
        if !self.is_file(key) {
            return Err(JbofError::NotFound(format!("'{}' in {}", key, self.location)));
        }
        let mut archive = self.archive.borrow_mut();
        let mut entry = archive.by_name(&format!("{}{}", self.prefix, key))?;
        let mut bytes = Vec::with_capacity(entry.size() as usize);
        entry
            .read_to_end(&mut bytes)
            .map_err(|e| JbofError::io(self.location.path().join(key), e))?;
        Ok(bytes)
    }

    fn resolve(&self, key: &str) -> Result<PathBuf> {
        if !key.is_empty() && !self.is_file(key) && !self.is_dir(key) {
            return Err(JbofError::NotFound(format!("'{}' in {}", key, self.location)));
        }
        Ok(self.canonical.join(key))
    }
}

/// Write every file of `backend` into a new zip archive at `dest`.
///
/// Entries are rooted at the archive root and deflate-compressed.
///
/// # Errors
///
/// Returns [`JbofError::AlreadyExists`] if `dest` exists.
pub fn export(backend: &dyn Backend, dest: &Path) -> Result<usize> {
    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(dest)
        .map_err(|e| JbofError::io(dest, e))?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let keys = backend.walk_files("")?;
    for key in &keys {
        let bytes = backend.read(key)?;
        zip.start_file(key.as_str(), options)?;
        zip.write_all(&bytes).map_err(|e| JbofError::io(dest, e))?;
    }
    zip.finish()?;

    tracing::debug!(dest = %dest.display(), files = keys.len(), "exported dataset archive");
    Ok(keys.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let file = File::create(path).expect("create zip");
        let mut zip = ZipWriter::new(file);
        for (name, bytes) in entries {
            zip.start_file(*name, SimpleFileOptions::default())
                .expect("start file");
            zip.write_all(bytes).expect("write entry");
        }
        zip.finish().expect("finish zip");
    }

    #[test]
    fn opens_root_layout() {
        let temp = TempDir::new().expect("create temp dir");
        let path = temp.path().join("set.zip");
        write_zip(
            &path,
            &[
                ("_metadata.json", b"{}"),
                ("a/_metadata.json", b"{}"),
                ("a/x.json", b"{}"),
                ("b/_metadata.json", b"{}"),
            ],
        );

        let backend = ArchiveBackend::open(&path).expect("open");
        let dirs: Vec<_> = backend.item_dirs().unwrap().collect::<Result<_>>().unwrap();
        assert_eq!(dirs, vec!["a", "b"]);
        assert_eq!(backend.list_files("a").unwrap(), vec!["_metadata.json", "x.json"]);
        assert_eq!(backend.list_files("").unwrap(), vec!["_metadata.json"]);
        assert!(backend.is_dir("a"));
        assert!(!backend.is_dir("c"));
        assert!(!backend.is_writable());
    }

    #[test]
    fn walk_skips_hidden_entries() {
        let temp = TempDir::new().expect("create temp dir");
        let path = temp.path().join("set.zip");
        write_zip(
            &path,
            &[
                ("_metadata.json", b"{}"),
                ("a/_metadata.json", b"{}"),
                ("a/.x.json.tmp", b"torn"),
                (".git/HEAD", b"ref"),
            ],
        );

        let backend = ArchiveBackend::open(&path).expect("open");
        assert_eq!(
            backend.walk_files("").unwrap(),
            vec!["_metadata.json", "a/_metadata.json"]
        );
        assert_eq!(backend.walk_files("a").unwrap(), vec!["a/_metadata.json"]);
    }

    #[test]
    fn opens_prefixed_layout() {
        let temp = TempDir::new().expect("create temp dir");
        let path = temp.path().join("set.zip");
        write_zip(
            &path,
            &[
                ("set/_metadata.json", b"{\"k\": 1}"),
                ("set/a/_metadata.json", b"{}"),
            ],
        );

        let backend = ArchiveBackend::open(&path).expect("open");
        assert_eq!(backend.read("_metadata.json").unwrap(), b"{\"k\": 1}");
        assert!(backend.is_file("a/_metadata.json"));
    }

    #[test]
    fn archive_without_metadata_is_not_found() {
        let temp = TempDir::new().expect("create temp dir");
        let path = temp.path().join("junk.zip");
        write_zip(&path, &[("readme.txt", b"hi")]);

        assert!(ArchiveBackend::open(&path).unwrap_err().is_not_found());
    }

    #[test]
    fn writes_are_read_only() {
        let temp = TempDir::new().expect("create temp dir");
        let path = temp.path().join("set.zip");
        write_zip(&path, &[("_metadata.json", b"{}")]);

        let backend = ArchiveBackend::open(&path).expect("open");
        assert!(matches!(
            backend.write("x", b""),
            Err(JbofError::ReadOnly(_))
        ));
        assert!(matches!(backend.destroy(), Err(JbofError::ReadOnly(_))));
    }

    #[test]
    fn missing_entry_is_not_found() {
        let temp = TempDir::new().expect("create temp dir");
        let path = temp.path().join("set.zip");
        write_zip(&path, &[("_metadata.json", b"{}")]);

        let backend = ArchiveBackend::open(&path).expect("open");
        assert!(backend.read("nope").unwrap_err().is_not_found());
    }
}
