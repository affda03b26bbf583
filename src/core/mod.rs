//! core
//!
//! Core domain types, schemas, and storage rules for jbof.
//!
//! # Modules
//!
//! - [`types`] - Strong types: ItemName, ArrayName, Fingerprint
//! - [`naming`] - Item naming templates and fresh names
//! - [`metadata`] - JSON sidecar schema and storage
//! - [`config`] - Configuration schema and loading
//! - [`paths`] - Centralized key routing inside a dataset
//! - [`hash`] - Order-independent content hashing
//! - [`errors`] - The library error type
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid names at compile time
//! - Sidecars are plain JSON, readable without this crate
//! - Hashing is deterministic and independent of naming and order

pub mod config;
pub mod errors;
pub mod hash;
pub mod metadata;
pub mod naming;
pub mod paths;
pub mod types;
