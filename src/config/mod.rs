//! Configuration management for manlook
//!
//! Settings for the man-page fetch and for how results are presented.
//! Every field has a default, so a config file only needs the keys it
//! wants to change.

#[allow(unexpected_cfgs)]
pub mod loader;

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Manual sections searched by default: system calls and library functions
pub const DEFAULT_SECTIONS: &str = "2:3";

/// Default upper bound on a single `man` run
pub const DEFAULT_TIMEOUT_MS: u64 = 250;

/// Main configuration structure for manlook
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Man page fetch configuration
    pub fetch: FetchConfig,

    /// Result presentation configuration
    pub presenter: PresenterConfig,
}

/// How the manual reader is invoked and its output cleaned
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Manual reader executable
    pub program: String,

    /// Value passed to `-S`
    pub sections: String,

    /// How long to wait for the reader, in milliseconds
    pub timeout_ms: u64,

    /// Kill the reader (and its children) when it times out
    pub kill_on_timeout: bool,

    /// Remove SGR color/style escapes some formatters emit
    pub strip_ansi: bool,

    /// Exported as `MANWIDTH` to the reader when set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manwidth: Option<u16>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            program: "man".to_string(),
            sections: DEFAULT_SECTIONS.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            kill_on_timeout: true,
            strip_ansi: true,
            manwidth: None,
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Set the timeout, rounded up to whole milliseconds (at least 1)
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        let millis = timeout.as_nanos().div_ceil(1_000_000);
        self.timeout_ms = u64::try_from(millis).unwrap_or(u64::MAX).max(1);
        self
    }

    pub fn with_sections(mut self, sections: impl Into<String>) -> Self {
        self.sections = sections.into();
        self
    }
}

/// Presentation surface behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresenterConfig {
    /// Bring the surface to the front after each update
    pub activate_on_present: bool,

    /// Whether activation also takes keyboard focus
    pub focus_on_activate: bool,

    /// Prefix for surface titles, followed by the term
    pub title_prefix: String,
}

impl Default for PresenterConfig {
    fn default() -> Self {
        Self {
            activate_on_present: true,
            focus_on_activate: false,
            title_prefix: "man".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a specific file, validating it
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let loader = loader::ConfigLoader::new();
        let format = utils::get_config_format(path).unwrap_or(loader::ConfigFormat::Toml);
        let config = loader.load_config_file(path, format)?;
        loader.validate_config(&config)?;
        Ok(config)
    }
}

/// Configuration utilities
pub mod utils {
    use super::*;
    use crate::error::Error;

    /// Get configuration file format from path
    pub fn get_config_format(path: &Path) -> Option<loader::ConfigFormat> {
        match path.extension()?.to_str()? {
            "toml" => Some(loader::ConfigFormat::Toml),
            "json" => Some(loader::ConfigFormat::Json),
            _ => None,
        }
    }

    /// Create a default configuration file content
    pub fn create_default_config_content(format: loader::ConfigFormat) -> Result<String> {
        let config = Config::default();

        match format {
            loader::ConfigFormat::Toml => {
                toml::to_string_pretty(&config).map_err(|e| Error::ConfigSerializationFailed {
                    format: "TOML".to_string(),
                    reason: e.to_string(),
                })
            }
            loader::ConfigFormat::Json => Ok(serde_json::to_string_pretty(&config)?),
        }
    }
}
