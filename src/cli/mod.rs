//! cli
//!
//! Command-line interface layer for jbof.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Load the user config and install logging
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap and dispatches to the
//! handlers in [`commands`], which call the [`crate::dataset`] API. Library
//! errors are wrapped with `anyhow` context at this layer only.

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};

use anyhow::{Context as _, Result};

use crate::core::config::Config;
use crate::ui::output::Verbosity;

/// Execution context shared by command handlers.
#[derive(Debug, Clone)]
pub struct Context {
    /// Output verbosity
    pub verbosity: Verbosity,
    /// Loaded user configuration
    pub config: Config,
}

impl Context {
    /// A context with default config, for tests and embedding.
    pub fn new(verbosity: Verbosity) -> Self {
        Self {
            verbosity,
            config: Config::default(),
        }
    }
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();
    let config = Config::load().context("failed to load configuration")?;

    let debug = cli.debug || config.debug();
    if debug {
        init_logging();
    }
    if let Some(path) = config.loaded_from() {
        tracing::debug!(path = %path.display(), "using config file");
    }

    let ctx = Context {
        verbosity: Verbosity::from_flags(cli.quiet, debug),
        config,
    };

    // Dispatch to command handler
    commands::dispatch(cli.command, &ctx)
}

/// Send `tracing` events at debug level and above to stderr.
fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
