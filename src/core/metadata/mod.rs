//! core::metadata
//!
//! JSON sidecar schema and storage.
//!
//! # Modules
//!
//! - [`schema`] - Sidecar documents and their reserved keys
//! - [`store`] - Reading and writing sidecars through a backend
//!
//! # Schema Design
//!
//! - Sidecars are plain JSON objects; user keys are free-form
//! - Reserved keys start with `_` and never appear in the public view
//! - Output is canonical: 2-space indent, keys sorted, so on-disk bytes
//!   are reproducible for hashing and diffing
//!
//! # Example
//!
//! ```
//! use jbof::core::metadata::{to_canonical_json, to_metadata};
//! use serde_json::json;
//!
//! let meta = to_metadata(&json!({"b": 1, "a": "x"})).unwrap();
//! assert_eq!(to_canonical_json(&meta).unwrap(), "{\n  \"a\": \"x\",\n  \"b\": 1\n}");
//! ```

mod finite;
pub mod schema;
pub mod store;

pub use schema::{
    parse_metadata, to_canonical_json, to_metadata, ArraySidecar, DataSetDocument, Metadata,
};
pub use store::MetadataStore;
