//! core::types
//!
//! Strong types for dataset entry names and content fingerprints.
//!
//! # Types
//!
//! - [`ItemName`] - Validated item directory name
//! - [`ArrayName`] - Validated array name (payload and sidecar stem)
//! - [`Fingerprint`] - Order-independent content hash of a dataset
//!
//! # Validation
//!
//! Names become path components on disk, so they are validated at
//! construction time. A valid name is exactly one path component and never
//! collides with the reserved metadata files.
//!
//! # Examples
//!
//! ```
//! use jbof::core::types::{ArrayName, ItemName};
//!
//! let item = ItemName::new("speaker-01").unwrap();
//! assert_eq!(item.as_str(), "speaker-01");
//!
//! assert!(ItemName::new("_metadata.json").is_err());
//! assert!(ArrayName::new("_metadata").is_err());
//! assert!(ItemName::new("a/b").is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::paths::{METADATA_FILE, METADATA_STEM, PYCACHE_DIR};

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid item name: {0}")]
    InvalidItemName(String),

    #[error("invalid array name: {0}")]
    InvalidArrayName(String),
}

/// Rules shared by every name that becomes a single path component.
fn validate_component(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("name cannot be empty".into());
    }
    if name == "." || name == ".." {
        return Err(format!("'{}' is not a valid path component", name));
    }
    if name.starts_with('.') {
        return Err(format!("'{}' cannot start with '.'", name));
    }
    if let Some(c) = name
        .chars()
        .find(|c| matches!(c, '/' | '\\' | '\0') || c.is_control())
    {
        return Err(format!("'{}' contains forbidden character {:?}", name, c));
    }
    if name == METADATA_FILE {
        return Err(format!("'{}' is reserved", METADATA_FILE));
    }
    Ok(())
}

/// A validated item name.
///
/// Item names are directory names directly under the dataset root. They
/// cannot be empty, start with `.`, contain path separators or control
/// characters, or be one of the reserved names `_metadata.json` and
/// `__pycache__`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ItemName(String);

impl ItemName {
    /// Create a new validated item name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidItemName` if the name is not a usable
    /// directory name.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        validate_component(&name).map_err(TypeError::InvalidItemName)?;
        if name == PYCACHE_DIR {
            return Err(TypeError::InvalidItemName(format!(
                "'{}' is reserved",
                PYCACHE_DIR
            )));
        }
        Ok(Self(name))
    }

    /// Get the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ItemName {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ItemName> for String {
    fn from(name: ItemName) -> Self {
        name.0
    }
}

impl AsRef<str> for ItemName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ItemName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated array name.
///
/// The array name is the stem of both the payload (`<name>.<ext>`) and the
/// sidecar (`<name>.json`). On top of the item rules it cannot be
/// `_metadata`, since that stem belongs to the item's own metadata file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ArrayName(String);

impl ArrayName {
    /// Create a new validated array name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidArrayName` if the name is not usable as a
    /// file stem.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        validate_component(&name).map_err(TypeError::InvalidArrayName)?;
        if name == METADATA_STEM {
            return Err(TypeError::InvalidArrayName(format!(
                "'{}' is reserved",
                METADATA_STEM
            )));
        }
        Ok(Self(name))
    }

    /// Get the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ArrayName {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ArrayName> for String {
    fn from(name: ArrayName) -> Self {
        name.0
    }
}

impl AsRef<str> for ArrayName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ArrayName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Content fingerprint of a dataset.
///
/// A lowercase hex SHA-256 digest. See [`crate::core::hash`] for how it is
/// computed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Wrap a raw 32-byte digest.
    pub fn from_digest(digest: &[u8]) -> Self {
        Self(hex::encode(digest))
    }

    /// Get the fingerprint as a hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
