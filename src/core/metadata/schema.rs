//! core::metadata::schema
//!
//! Sidecar documents and their reserved keys.
//!
//! # Documents
//!
//! - Dataset `_metadata.json`: user metadata plus `_itemformat`
//! - Item `_metadata.json`: user metadata only
//! - Array `<name>.json`: user metadata plus `_filename`
//!
//! The split between user and reserved keys happens here, so the rest of
//! the crate only ever sees the public view.

use serde::Serialize;
use serde_json::Value;

use super::finite::ensure_finite;
use crate::core::errors::{JbofError, Result};
use crate::core::naming::ItemFormat;
use crate::core::paths::{FILENAME_KEY, ITEMFORMAT_KEY};

/// A JSON metadata mapping.
///
/// `serde_json` keeps object keys sorted (no `preserve_order`), which is
/// what makes the on-disk output canonical.
pub type Metadata = serde_json::Map<String, Value>;

/// Dataset key used by datasets written before items were called items.
const LEGACY_ENTRYFORMAT_KEY: &str = "_entryformat";

/// Convert any serializable value into a metadata mapping.
///
/// # Errors
///
/// Returns `JbofError::Serialization` if the value does not serialize to a
/// JSON object (for example a bare number, or a map with non-string keys),
/// or if it holds a NaN or infinite float.
///
/// # Example
///
/// ```
/// use jbof::core::metadata::to_metadata;
/// use std::collections::BTreeMap;
///
/// let mut attrs = BTreeMap::new();
/// attrs.insert("rate", 16_000u32);
/// let meta = to_metadata(&attrs).unwrap();
/// assert_eq!(meta["rate"], 16_000);
///
/// assert!(to_metadata(&3).is_err());
/// ```
pub fn to_metadata<T: Serialize + ?Sized>(value: &T) -> Result<Metadata> {
    ensure_finite(value).map_err(|e| JbofError::Serialization(e.to_string()))?;
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(JbofError::Serialization(format!(
            "metadata must be a JSON object, got {}",
            json_type(&other)
        ))),
        Err(e) => Err(JbofError::Serialization(e.to_string())),
    }
}

/// Serialize a mapping in canonical form: 2-space indent, sorted keys.
pub fn to_canonical_json(metadata: &Metadata) -> Result<String> {
    serde_json::to_string_pretty(metadata).map_err(|e| JbofError::Serialization(e.to_string()))
}

/// Parse a sidecar's bytes, which must hold a JSON object.
///
/// `origin` names the file in error messages.
pub fn parse_metadata(origin: &str, bytes: &[u8]) -> Result<Metadata> {
    let value: Value = serde_json::from_slice(bytes).map_err(|e| JbofError::Parse {
        path: origin.to_string(),
        message: e.to_string(),
    })?;
    match value {
        Value::Object(map) => Ok(map),
        other => Err(JbofError::Parse {
            path: origin.to_string(),
            message: format!("expected a JSON object, found {}", json_type(&other)),
        }),
    }
}

/// Reject user metadata that tries to set a reserved key.
pub fn ensure_not_reserved(metadata: &Metadata, keys: &[&str]) -> Result<()> {
    match keys.iter().find(|key| metadata.contains_key(**key)) {
        Some(key) => Err(JbofError::ReservedKey(key.to_string())),
        None => Ok(()),
    }
}

/// The dataset-level `_metadata.json`.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSetDocument {
    /// User-visible metadata.
    pub metadata: Metadata,
    /// The item naming template, if any.
    pub itemformat: Option<ItemFormat>,
}

impl DataSetDocument {
    /// Split a parsed `_metadata.json` into user metadata and template.
    ///
    /// # Errors
    ///
    /// - [`JbofError::TypeMismatch`] if the stored template is neither a
    ///   string nor null
    /// - [`JbofError::InvalidTemplate`] if the stored template does not parse
    pub fn from_json(mut raw: Metadata) -> Result<Self> {
        let stored = match raw.remove(ITEMFORMAT_KEY) {
            Some(value) => {
                raw.remove(LEGACY_ENTRYFORMAT_KEY);
                Some(value)
            }
            None => raw.remove(LEGACY_ENTRYFORMAT_KEY),
        };
        let itemformat = match stored {
            None | Some(Value::Null) => None,
            Some(Value::String(template)) => Some(ItemFormat::parse(&template)?),
            Some(other) => {
                return Err(JbofError::TypeMismatch(format!(
                    "'{}' must be a string or null, found {}",
                    ITEMFORMAT_KEY,
                    json_type(&other)
                )))
            }
        };
        Ok(Self {
            metadata: raw,
            itemformat,
        })
    }

    /// The on-disk form, with `_itemformat` always present.
    pub fn to_json(&self) -> Metadata {
        let mut raw = self.metadata.clone();
        let template = match &self.itemformat {
            Some(format) => Value::String(format.as_str().to_string()),
            None => Value::Null,
        };
        raw.insert(ITEMFORMAT_KEY.to_string(), template);
        raw
    }
}

/// An array sidecar (`<name>.json`).
#[derive(Debug, Clone, PartialEq)]
pub struct ArraySidecar {
    /// Public metadata, including format-derived fields such as
    /// `samplerate`.
    pub metadata: Metadata,
    /// The payload file name exactly as stored.
    pub filename: String,
}

impl ArraySidecar {
    /// Split a parsed sidecar into public metadata and `_filename`.
    ///
    /// `origin` names the sidecar in error messages.
    pub fn from_json(origin: &str, mut raw: Metadata) -> Result<Self> {
        let filename = match raw.remove(FILENAME_KEY) {
            Some(Value::String(name)) => name,
            Some(other) => {
                return Err(JbofError::TypeMismatch(format!(
                    "'{}' in {} must be a string, found {}",
                    FILENAME_KEY,
                    origin,
                    json_type(&other)
                )))
            }
            None => {
                return Err(JbofError::Parse {
                    path: origin.to_string(),
                    message: format!("sidecar has no '{}'", FILENAME_KEY),
                })
            }
        };
        Ok(Self {
            metadata: raw,
            filename,
        })
    }

    /// The on-disk form, with `_filename` added.
    pub fn to_json(&self) -> Metadata {
        let mut raw = self.metadata.clone();
        raw.insert(
            FILENAME_KEY.to_string(),
            Value::String(self.filename.clone()),
        );
        raw
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
