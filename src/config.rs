//! Configuration for Skiff
//!
//! Settings live in `~/.skiff/config.json` and can be overridden from the
//! environment. Only two knobs exist: whether experimental plugins are
//! allowed, and extra directories to search for plugins ahead of the
//! defaults.
//!
//! ```json
//! {
//!   "experimental": true,
//!   "plugin_dirs": ["/opt/skiff/plugins"]
//! }
//! ```

use std::collections::HashSet;
use std::env;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Result, SkiffError};

/// User configuration directory under $HOME.
const CONFIG_DIR: &str = ".skiff";
/// Configuration file inside the config directory.
const CONFIG_FILE: &str = "config.json";
/// Subdirectory of the config dir holding user-installed plugins.
const PLUGIN_SUBDIR: &str = "cli-plugins";

/// Environment variable overriding the experimental flag.
pub const EXPERIMENTAL_ENV: &str = "SKIFF_CLI_EXPERIMENTAL";
/// Environment variable with extra plugin directories, PATH-style separated.
/// These take precedence over directories from the config file.
pub const PLUGIN_DIRS_ENV: &str = "SKIFF_PLUGIN_DIRS";

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Whether experimental plugins may be used. Off by default.
    pub experimental: bool,

    /// Extra directories searched for plugins before the default locations.
    pub plugin_dirs: Vec<PathBuf>,
}

impl Config {
    /// Load configuration from the default location, then apply environment
    /// overrides. A missing config file is not an error; defaults apply.
    pub fn load() -> Result<Self> {
        let mut config = match config_file() {
            Some(path) if path.is_file() => Self::load_from(&path)?,
            _ => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SkiffError::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        serde_json::from_str(&content)
            .map_err(|e| SkiffError::Config(format!("Invalid config {}: {}", path.display(), e)))
    }

    /// Apply environment variable overrides to this configuration.
    pub fn apply_env(&mut self) {
        if let Ok(raw) = env::var(EXPERIMENTAL_ENV) {
            match parse_bool(&raw) {
                Some(value) => self.experimental = value,
                None => warn!(
                    value = %raw,
                    "Ignoring unrecognized {} value",
                    EXPERIMENTAL_ENV
                ),
            }
        }
        if let Some(raw) = env::var_os(PLUGIN_DIRS_ENV) {
            let mut dirs: Vec<PathBuf> = env::split_paths(&raw).collect();
            dirs.append(&mut self.plugin_dirs);
            self.plugin_dirs = dirs;
        }
    }

    /// Effective plugin search path: extra directories first, then the user
    /// plugin directory, then the system-wide locations. Earlier entries win
    /// when the same plugin name appears twice; duplicates are dropped while
    /// preserving order.
    pub fn plugin_search_path(&self) -> Vec<PathBuf> {
        let mut dirs = self.plugin_dirs.clone();
        if let Some(user) = user_plugin_dir() {
            dirs.push(user);
        }
        dirs.extend(system_plugin_dirs());

        let mut seen = HashSet::new();
        dirs.into_iter().filter(|d| seen.insert(d.clone())).collect()
    }
}

/// Returns the user configuration directory (`~/.skiff`).
pub fn config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CONFIG_DIR))
}

/// Returns the per-user plugin directory (`~/.skiff/cli-plugins`).
pub fn user_plugin_dir() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join(PLUGIN_SUBDIR))
}

fn config_file() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join(CONFIG_FILE))
}

/// System-wide plugin directories, lowest precedence.
fn system_plugin_dirs() -> Vec<PathBuf> {
    if cfg!(unix) {
        vec![
            PathBuf::from("/usr/local/lib/skiff/cli-plugins"),
            PathBuf::from("/usr/local/libexec/skiff/cli-plugins"),
            PathBuf::from("/usr/lib/skiff/cli-plugins"),
            PathBuf::from("/usr/libexec/skiff/cli-plugins"),
        ]
    } else {
        Vec::new()
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "enabled" | "on" => Some(true),
        "0" | "false" | "disabled" | "off" => Some(false),
        _ => None,
    }
}
