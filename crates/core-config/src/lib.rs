//! Typed editor configuration.
//!
//! Everything is serde-deserializable from TOML with per-field defaults, so a
//! partial config file only overrides what it names. Hosts either parse a
//! string they obtained themselves or call [`load_default`] which looks under
//! the user config directory.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Indentation behavior for `editor.indent*` and the indent operators.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct IndentConfig {
    pub tab_width: usize,
    pub use_tabs: bool,
    pub indent_size: usize,
}

impl Default for IndentConfig {
    fn default() -> Self {
        Self {
            tab_width: 4,
            use_tabs: false,
            indent_size: 4,
        }
    }
}

impl IndentConfig {
    /// One indent step as inserted text.
    pub fn indent_string(&self) -> String {
        if self.use_tabs {
            "\t".to_string()
        } else {
            " ".repeat(self.indent_size.max(1))
        }
    }
}

/// Input front-end tunables.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Multi-key sequence resolution timeout in milliseconds.
    pub sequence_timeout_ms: u64,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            sequence_timeout_ms: 1000,
        }
    }
}

/// Dispatcher tunables.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Bound of the action channel (drop-oldest beyond this).
    pub channel_capacity: usize,
    /// Counts above this are rejected by the count-limit hook.
    pub max_count: i32,
    /// Actions per second admitted by the rate-limit hook; 0 disables it.
    pub rate_limit_per_sec: u32,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 100,
            max_count: 999_999,
            rate_limit_per_sec: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub indent: IndentConfig,
    pub input: InputConfig,
    pub dispatch: DispatchConfig,
}

impl EditorConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("invalid editor configuration")
    }

    pub fn load_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let cfg = Self::from_toml_str(&raw)?;
        tracing::info!(target: "config", path = %path.display(), "loaded configuration");
        Ok(cfg)
    }
}

/// Default config file location (`<config dir>/keystorm/config.toml`).
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("keystorm").join("config.toml"))
}

/// Load the default config file; absent file yields defaults, a malformed
/// file is an error.
pub fn load_default() -> Result<EditorConfig> {
    match default_config_path() {
        Some(path) if path.exists() => EditorConfig::load_file(&path),
        _ => {
            tracing::debug!(target: "config", "no config file, using defaults");
            Ok(EditorConfig::default())
        }
    }
}
