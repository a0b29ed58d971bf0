//! Core plugin types
//!
//! A plugin is an executable on the search path whose file name starts with
//! `skiff-`. When invoked with the reserved `skiff-cli-plugin-metadata`
//! argument it must print a JSON document describing itself:
//!
//! ```json
//! {
//!   "SchemaVersion": "0.1.0",
//!   "Vendor": "acme",
//!   "Version": "1.4.0",
//!   "ShortDescription": "Deploy things",
//!   "URL": "https://example.com/acme/skiff-deploy"
//! }
//! ```
//!
//! Validation produces a [`Plugin`] record either way: a candidate that
//! fails a rule still gets a record, with [`Plugin::err`] naming the first
//! rule it broke. Only candidates that cannot be treated as plugins at all
//! produce no record (see [`crate::error::SkiffError`]).

use std::path::PathBuf;

use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Prefix every plugin executable's file name must carry.
pub const NAME_PREFIX: &str = "skiff-";

/// Reserved argument a plugin must answer with its metadata JSON on stdout.
/// Its shape makes it collide with a (forbidden) plugin name, so no real
/// subcommand can ever claim it.
pub const METADATA_SUBCOMMAND: &str = "skiff-cli-plugin-metadata";

/// Self-reported plugin metadata, as decoded from the plugin's stdout.
///
/// Unknown fields are ignored so the schema can grow without breaking older
/// hosts. All fields are optional at the decoding layer; which ones are
/// required is the validator's business.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Metadata {
    /// Version of the metadata schema the plugin speaks. Required; must be
    /// valid semver.
    pub schema_version: String,

    /// Party maintaining the plugin. Required; must not be blank.
    pub vendor: String,

    /// The plugin's own version string. Informational.
    pub version: String,

    /// One-line description shown in listings. Informational.
    pub short_description: String,

    /// Homepage or repository. Informational.
    #[serde(rename = "URL")]
    pub url: String,

    /// Whether the plugin only works against an experimental host.
    pub experimental: bool,
}

/// Why a discovered plugin is unusable.
///
/// Carried inside [`Plugin::err`] rather than returned as an error: a broken
/// plugin remains listable by name, and one broken plugin never prevents
/// others from loading. Serializes as its bare message so plugin records
/// stay readable as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct PluginError {
    message: String,
}

impl PluginError {
    /// Create an invalidity from its user-facing message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The user-facing reason this plugin is invalid.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Serialize for PluginError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.message)
    }
}

/// The outcome of validating one plugin candidate.
///
/// When `err` is set the metadata-derived fields hold their defaults and the
/// plugin must not be run, but it still shows up in listings so users can
/// see what is broken and why.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Plugin {
    /// Logical plugin name, the file name with the `skiff-` prefix (and any
    /// executable suffix) stripped.
    pub name: String,

    /// Path of the executable backing this plugin.
    pub path: PathBuf,

    /// Metadata schema version reported by the plugin.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub schema_version: String,

    /// Party maintaining the plugin.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub vendor: String,

    /// The plugin's own version.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub version: String,

    /// One-line description for listings.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub short_description: String,

    /// Homepage or repository.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub url: String,

    /// Same-named executables in lower-precedence directories that this
    /// plugin hides.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub shadowed_paths: Vec<PathBuf>,

    /// Why the plugin is invalid, if it failed a validation rule.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub err: Option<PluginError>,
}

impl Plugin {
    /// Identity-only record used while validation is still in flight.
    pub(crate) fn stub(name: String, path: PathBuf) -> Self {
        Self {
            name,
            path,
            schema_version: String::new(),
            vendor: String::new(),
            version: String::new(),
            short_description: String::new(),
            url: String::new(),
            shadowed_paths: Vec::new(),
            err: None,
        }
    }

    /// True when the plugin passed every validation rule and may be run.
    pub fn is_valid(&self) -> bool {
        self.err.is_none()
    }
}

/// A builtin command of the host CLI, as seen by conflict checking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltinCommand {
    /// Canonical command name.
    pub name: String,
    /// Alternative names accepted for the command.
    pub aliases: Vec<String>,
}

/// Read-only view of the host CLI's builtin command tree.
///
/// Conflict checking only needs top-level command names and their aliases,
/// so any command-definition mechanism can participate by listing them.
pub trait CommandTree {
    /// Top-level builtin commands with their aliases.
    fn builtin_commands(&self) -> Vec<BuiltinCommand>;
}

impl CommandTree for clap::Command {
    fn builtin_commands(&self) -> Vec<BuiltinCommand> {
        self.get_subcommands()
            .map(|cmd| BuiltinCommand {
                name: cmd.get_name().to_string(),
                aliases: cmd.get_all_aliases().map(|alias| alias.to_string()).collect(),
            })
            .collect()
    }
}
