//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! jbof has a single, user-level configuration scope. It only supplies
//! CLI defaults; the library never reads it.
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Global config file
//! 3. CLI flags (not handled here)
//!
//! # Locations
//!
//! Searched in order, first existing file wins:
//! 1. `$JBOF_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/jbof/config.toml`
//! 3. `~/.jbof/config.toml`
//!
//! # Example
//!
//! ```no_run
//! use jbof::core::config::Config;
//!
//! let config = Config::load().unwrap();
//! println!("Read-only by default: {}", config.readonly());
//! ```

pub mod schema;

pub use schema::GlobalConfig;

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::codec::Format;

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Loaded configuration with defaults applied by the accessors.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Global configuration
    pub global: GlobalConfig,
    /// Path to the config file (if loaded)
    path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the default locations.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be parsed or
    /// fails validation. A missing file is not an error.
    pub fn load() -> Result<Config, ConfigError> {
        Self::load_first(&Self::search_paths())
    }

    /// Candidate config files, highest precedence first.
    fn search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Ok(path) = std::env::var("JBOF_CONFIG") {
            paths.push(PathBuf::from(path));
        }
        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            paths.push(PathBuf::from(xdg_home).join("jbof/config.toml"));
        }
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".jbof/config.toml"));
        }
        paths
    }

    fn load_first(candidates: &[PathBuf]) -> Result<Config, ConfigError> {
        for path in candidates {
            if path.exists() {
                let global = Self::read_global_config(path)?;
                global.validate()?;
                tracing::debug!(path = %path.display(), "loaded config");
                return Ok(Config {
                    global,
                    path: Some(path.clone()),
                });
            }
        }
        Ok(Config::default())
    }

    /// Read and parse a config file.
    fn read_global_config(path: &Path) -> Result<GlobalConfig, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Format `add-array` stores arrays in when `--format` is not given.
    ///
    /// Defaults to `None` (keep the source file's format).
    pub fn default_format(&self) -> Option<Format> {
        self.global.format()
    }

    /// Whether read commands open datasets read-only.
    ///
    /// Defaults to `true` if not configured.
    pub fn readonly(&self) -> bool {
        self.global.readonly.unwrap_or(true)
    }

    /// Whether debug logging is on without `--debug`.
    ///
    /// Defaults to `false` if not configured.
    pub fn debug(&self) -> bool {
        self.global.debug.unwrap_or(false)
    }

    /// Get the path to the loaded config file.
    pub fn loaded_from(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}
