//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Global Config
//!
//! Located at (in order of precedence):
//! 1. `$JBOF_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/jbof/config.toml`
//! 3. `~/.jbof/config.toml`
//!
//! # Validation
//!
//! Config values are validated after parsing; `default_format` must name
//! a registered format.

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::codec::Format;

/// Global configuration (user scope).
///
/// # Example
///
/// ```toml
/// default_format = "flac"
/// readonly = false
/// debug = true
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// Format `add-array` converts into when `--format` is not given
    pub default_format: Option<String>,

    /// Open datasets read-only for commands that only read
    pub readonly: Option<bool>,

    /// Emit debug logs without `--debug`
    pub debug: Option<bool>,
}

impl GlobalConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(format) = &self.default_format {
            self.parsed_format(format)?;
        }
        Ok(())
    }

    fn parsed_format(&self, tag: &str) -> Result<Format, ConfigError> {
        tag.parse::<Format>().map_err(|_| {
            let valid: Vec<_> = Format::ALL.into_iter().map(Format::extension).collect();
            ConfigError::InvalidValue(format!(
                "invalid default_format '{}', must be one of: {}",
                tag,
                valid.join(", ")
            ))
        })
    }

    /// The configured default format, if valid.
    pub fn format(&self) -> Option<Format> {
        self.default_format
            .as_deref()
            .and_then(|tag| self.parsed_format(tag).ok())
    }
}
