//! ui::output
//!
//! Terminal output for the `jbof` commands.
//!
//! # Design
//!
//! Output is formatted consistently and respects the quiet flag. Results
//! a script would consume (names, hashes) go to stdout through [`data`],
//! which quiet mode never suppresses.

use std::fmt::Display;

use crate::core::metadata::{to_canonical_json, Metadata};

/// How much a command prints, from `--quiet` and `--debug`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Only command results and errors
    Quiet,
    /// Progress and confirmation messages too
    Normal,
    /// Like `Normal`; library tracing is enabled separately
    Debug,
}

impl Verbosity {
    /// `--quiet` wins over `--debug`.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if debug {
            Verbosity::Debug
        } else {
            Verbosity::Normal
        }
    }
}

/// Print a progress message to stdout unless quiet.
pub fn print(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("{}", message);
    }
}

/// Print a command result (always shown).
pub fn data(message: impl Display) {
    println!("{}", message);
}

/// Print an error to stderr, even when quiet.
pub fn error(message: impl Display) {
    eprintln!("error: {}", message);
}

/// Print a warning to stderr unless quiet.
pub fn warn(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        eprintln!("warning: {}", message);
    }
}

/// Print a confirmation to stdout unless quiet.
pub fn success(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("{}", message);
    }
}

/// Format metadata as indented JSON, or `{}` when empty.
pub fn format_metadata(metadata: &Metadata, indent: &str) -> String {
    if metadata.is_empty() {
        return "{}".to_string();
    }
    match to_canonical_json(metadata) {
        Ok(json) => json.replace('\n', &format!("\n{}", indent)),
        Err(_) => format!("{:?}", metadata),
    }
}

/// Format a shape as `3x2`, or `scalar` for rank 0.
pub fn format_shape(shape: &[usize]) -> String {
    if shape.is_empty() {
        return "scalar".to_string();
    }
    shape
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("x")
}
