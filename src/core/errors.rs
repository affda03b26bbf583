//! core::errors
//!
//! Error taxonomy shared by the dataset, item, and array layers.
//!
//! # Design
//!
//! Every failure is surfaced synchronously as a typed variant. Nothing is
//! retried internally and nothing is swallowed, except the best-effort
//! cleanup of a half-written array, which never masks the original error.
//!
//! Filesystem errors are mapped onto the taxonomy where the kind is
//! meaningful (`NotFound`, `AlreadyExists`); everything else stays an
//! [`JbofError::Io`] that carries the offending path.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::codec::{CodecError, Format};
use crate::core::naming::NamingError;
use crate::core::types::TypeError;

/// Errors from dataset operations.
#[derive(Debug, Error)]
pub enum JbofError {
    /// A dataset, item, array, or source file does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A create operation collided with an existing name.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// A mutation was attempted through a read-only handle.
    #[error("{0} is read-only")]
    ReadOnly(String),

    /// An operation received a handle it does not own, or a stored value
    /// of the wrong JSON type.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// A required companion value was not supplied.
    #[error("format '{format}' requires parameter '{parameter}'")]
    MissingParameter {
        /// The format that needs the parameter
        format: Format,
        /// Name of the missing parameter
        parameter: &'static str,
    },

    /// The format tag or file extension is not known to the registry.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The item format template references a key absent from the metadata.
    #[error("item format references missing metadata key '{0}'")]
    MissingKey(String),

    /// The handle was deleted earlier in this process.
    #[error("{0} has been deleted")]
    Invalidated(String),

    /// A name cannot be used for an item or array.
    #[error("invalid name: {0}")]
    InvalidName(#[from] TypeError),

    /// The item format template is malformed.
    #[error("invalid item format: {0}")]
    InvalidTemplate(String),

    /// User metadata tried to set a key the layout reserves.
    #[error("metadata key '{0}' is reserved")]
    ReservedKey(String),

    /// A value could not be represented as a JSON metadata mapping.
    #[error("failed to serialize metadata: {0}")]
    Serialization(String),

    /// A metadata file could not be parsed.
    #[error("failed to parse '{path}': {message}")]
    Parse {
        /// The file that failed to parse
        path: String,
        /// Parser message
        message: String,
    },

    /// A codec failed to encode or decode a payload.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Any other I/O failure.
    #[error("i/o error on '{}': {source}", path.display())]
    Io {
        /// The path being accessed
        path: PathBuf,
        /// Underlying error
        source: io::Error,
    },

    /// The zip archive backing a read-only dataset is unreadable.
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, JbofError>;

impl JbofError {
    /// Map an I/O error on `path` onto the taxonomy.
    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        let path = path.as_ref();
        match source.kind() {
            io::ErrorKind::NotFound => JbofError::NotFound(path.display().to_string()),
            io::ErrorKind::AlreadyExists => {
                JbofError::AlreadyExists(path.display().to_string())
            }
            _ => JbofError::Io {
                path: path.to_path_buf(),
                source,
            },
        }
    }

    /// Whether this error means "the thing does not exist".
    pub fn is_not_found(&self) -> bool {
        matches!(self, JbofError::NotFound(_))
    }
}

impl From<NamingError> for JbofError {
    fn from(err: NamingError) -> Self {
        match err {
            NamingError::MissingKey(key) => JbofError::MissingKey(key),
            NamingError::Malformed(message) => JbofError::InvalidTemplate(message),
        }
    }
}
