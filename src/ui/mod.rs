//! ui
//!
//! User-facing output for the CLI.
//!
//! # Modules
//!
//! - [`output`] - Output formatting and display
//!
//! # Design
//!
//! All CLI output goes through this module so the quiet and debug flags
//! apply uniformly. Library code logs through `tracing` instead.

pub mod output;
