//! core::hash
//!
//! Order-independent content fingerprint of a dataset.
//!
//! # Algorithm
//!
//! 1. Every file below an item directory is hashed with SHA-256 (content
//!    only, names are not part of the digest)
//! 2. An item's file digests are sorted and the concatenation is hashed
//!    into the item digest
//! 3. The item digests are sorted and the concatenation is hashed into the
//!    dataset digest, rendered as lowercase hex
//!
//! Sorting at both levels makes the result independent of directory
//! listing order, so two datasets with the same contents hash equal however
//! they were laid out. The dataset's own `_metadata.json` is not hashed,
//! nor are hidden files such as temp files left by an interrupted write.

use sha2::{Digest, Sha256};

use crate::backend::Backend;
use crate::core::errors::Result;
use crate::core::types::Fingerprint;

/// A raw SHA-256 digest.
pub type Digest32 = [u8; 32];

/// Digest of one file's bytes.
pub fn file_digest(bytes: &[u8]) -> Digest32 {
    Sha256::digest(bytes).into()
}

/// Sort `digests` and hash their concatenation.
pub fn combine(mut digests: Vec<Digest32>) -> Digest32 {
    digests.sort_unstable();
    let mut hasher = Sha256::new();
    for digest in &digests {
        hasher.update(digest);
    }
    hasher.finalize().into()
}

/// Digest of one item directory.
pub fn item_digest(backend: &dyn Backend, item: &str) -> Result<Digest32> {
    let mut digests = Vec::new();
    for key in backend.walk_files(item)? {
        digests.push(file_digest(&backend.read(&key)?));
    }
    Ok(combine(digests))
}

/// Fingerprint every item currently on disk.
///
/// Items are listed fresh from the backend, never from a cache.
pub fn dataset_fingerprint(backend: &dyn Backend) -> Result<Fingerprint> {
    let mut digests = Vec::new();
    for item in backend.item_dirs()? {
        let item = item?;
        digests.push(item_digest(backend, &item)?);
    }
    tracing::debug!(items = digests.len(), "hashed dataset");
    Ok(Fingerprint::from_digest(&combine(digests)))
}
