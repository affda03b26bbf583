//! backend::directory
//!
//! Read-write backend over a plain directory tree.
//!
//! # Writes
//!
//! - Files are written to a hidden temp file next to the target, synced,
//!   then renamed into place, so a reader never sees a torn sidecar
//! - Nothing spans more than one file; an interrupted multi-file operation
//!   can leave a half-written item or array behind

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::{Backend, ItemDirs, Location};
use crate::core::errors::{JbofError, Result};
use crate::core::paths::{is_hidden, is_item_dir, join_key};

/// Backend over a dataset directory.
#[derive(Debug)]
pub struct DirectoryBackend {
    /// Root of the dataset
    root: PathBuf,
    location: Location,
}

impl DirectoryBackend {
    /// Create the dataset directory `root`.
    ///
    /// The parent must exist; `root` itself must not.
    ///
    /// # Errors
    ///
    /// - [`JbofError::AlreadyExists`] if `root` exists (file or directory)
    /// - [`JbofError::NotFound`] if the parent directory is missing
    pub fn create(root: &Path) -> Result<Self> {
        if root.exists() {
            return Err(JbofError::AlreadyExists(root.display().to_string()));
        }
        fs::create_dir(root).map_err(|e| JbofError::io(root, e))?;
        tracing::debug!(root = %root.display(), "created dataset directory");
        Ok(Self::at(root))
    }

    /// Open the existing dataset directory `root`.
    ///
    /// # Errors
    ///
    /// Returns [`JbofError::NotFound`] if `root` is missing or is not a
    /// directory.
    pub fn open(root: &Path) -> Result<Self> {
        if !root.is_dir() {
            return Err(JbofError::NotFound(format!(
                "dataset directory {}",
                root.display()
            )));
        }
        Ok(Self::at(root))
    }

    fn at(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            location: Location::Directory(root.to_path_buf()),
        }
    }

    /// The dataset root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, key: &str) -> PathBuf {
        if key.is_empty() {
            self.root.clone()
        } else {
            self.root.join(key)
        }
    }

    fn temp_path(target: &Path) -> PathBuf {
        let name = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        target.with_file_name(format!(".{}.tmp", name))
    }
}

impl Backend for DirectoryBackend {
    fn location(&self) -> &Location {
        &self.location
    }

    fn is_writable(&self) -> bool {
        true
    }

    fn item_dirs(&self) -> Result<ItemDirs<'_>> {
        let entries = fs::read_dir(&self.root).map_err(|e| JbofError::io(&self.root, e))?;
        let root = &self.root;
        Ok(Box::new(entries.filter_map(move |entry| {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => return Some(Err(JbofError::io(root, e))),
            };
            // Follows symlinks, so a linked item directory is still an item.
            if !entry.path().is_dir() {
                return None;
            }
            match entry.file_name().into_string() {
                Ok(name) if is_item_dir(&name) => Some(Ok(name)),
                Ok(_) => None,
                Err(raw) => {
                    tracing::warn!(name = ?raw, "skipping directory with non-UTF-8 name");
                    None
                }
            }
        })))
    }

    fn list_files(&self, dir: &str) -> Result<Vec<String>> {
        let path = self.path(dir);
        let mut names = Vec::new();
        for entry in fs::read_dir(&path).map_err(|e| JbofError::io(&path, e))? {
            let entry = entry.map_err(|e| JbofError::io(&path, e))?;
            if !entry.path().is_file() {
                continue;
            }
            if let Ok(name) = entry.file_name().into_string() {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    fn walk_files(&self, dir: &str) -> Result<Vec<String>> {
        let base = self.path(dir);
        let mut keys = Vec::new();
        let walk = WalkDir::new(&base)
            .min_depth(1)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(&e.file_name().to_string_lossy()));
        for entry in walk {
            let entry = entry.map_err(|e| {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| base.clone());
                JbofError::io(path, io::Error::from(e))
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry.path().strip_prefix(&base).unwrap_or(entry.path());
            let relative = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            keys.push(join_key(dir, &relative));
        }
        Ok(keys)
    }

    fn is_dir(&self, key: &str) -> bool {
        self.path(key).is_dir()
    }

    fn is_file(&self, key: &str) -> bool {
        self.path(key).is_file()
    }

    fn read(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.path(key);
        fs::read(&path).map_err(|e| JbofError::io(&path, e))
    }

    fn resolve(&self, key: &str) -> Result<PathBuf> {
        let path = self.path(key);
        fs::canonicalize(&path).map_err(|e| JbofError::io(&path, e))
    }

    fn create_dir(&self, key: &str) -> Result<()> {
        let path = self.path(key);
        fs::create_dir(&path).map_err(|e| JbofError::io(&path, e))
    }

    fn write(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key);
        let temp_path = Self::temp_path(&path);

        {
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&temp_path)
                .map_err(|e| JbofError::io(&temp_path, e))?;
            file.write_all(bytes)
                .map_err(|e| JbofError::io(&temp_path, e))?;
            file.sync_all().map_err(|e| JbofError::io(&temp_path, e))?;
        }

        if let Err(e) = fs::rename(&temp_path, &path) {
            let _ = fs::remove_file(&temp_path);
            return Err(JbofError::io(&path, e));
        }
        Ok(())
    }

    fn copy_in(&self, source: &Path, key: &str) -> Result<()> {
        let path = self.path(key);
        fs::copy(source, &path).map_err(|e| JbofError::io(&path, e))?;
        Ok(())
    }

    fn remove_file(&self, key: &str) -> Result<()> {
        let path = self.path(key);
        fs::remove_file(&path).map_err(|e| JbofError::io(&path, e))
    }

    fn remove_dir_all(&self, key: &str) -> Result<()> {
        let path = self.path(key);
        fs::remove_dir_all(&path).map_err(|e| JbofError::io(&path, e))
    }

    fn destroy(&self) -> Result<()> {
        fs::remove_dir_all(&self.root).map_err(|e| JbofError::io(&self.root, e))?;
        tracing::debug!(root = %self.root.display(), "removed dataset directory");
        Ok(())
    }
}
