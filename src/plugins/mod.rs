//! Plugin system for Skiff
//!
//! Skiff subcommands can be provided by external executables dropped on the
//! plugin search path. The pieces:
//!
//! - **Discovery** ([`discover_candidates`]): scan the search directories
//!   for files named `skiff-*`, first directory wins per file name.
//! - **Candidates** ([`Candidate`], [`BinaryCandidate`]): a discovered file
//!   that can report metadata by being run with the reserved
//!   `skiff-cli-plugin-metadata` argument.
//! - **Validation** ([`validate_candidate`]): name pattern, builtin-command
//!   conflicts, metadata schema and vendor rules, experimental gating.
//! - **Records** ([`Plugin`]): the outcome, valid or annotated with a
//!   [`PluginError`]; broken plugins stay visible in listings.
//!
//! Search path (first match wins):
//!
//! ```text
//! $SKIFF_PLUGIN_DIRS            (extra, highest precedence)
//! ~/.skiff/cli-plugins          (per user)
//! /usr/local/lib/skiff/cli-plugins
//! /usr/local/libexec/skiff/cli-plugins
//! /usr/lib/skiff/cli-plugins
//! /usr/libexec/skiff/cli-plugins
//! ```
//!
//! A plugin answers the metadata argument with JSON on stdout:
//!
//! ```json
//! {
//!   "SchemaVersion": "0.1.0",
//!   "Vendor": "acme",
//!   "Version": "1.4.0",
//!   "ShortDescription": "Deploy things"
//! }
//! ```
//!
//! Listing everything the host can see:
//!
//! ```no_run
//! use std::path::PathBuf;
//! use skiff::plugins::list_plugins;
//!
//! # async fn demo() -> skiff::Result<()> {
//! let root = clap::Command::new("skiff").subcommand(clap::Command::new("version"));
//! let dirs = vec![PathBuf::from("/usr/local/lib/skiff/cli-plugins")];
//! for plugin in list_plugins(&dirs, &root, false).await? {
//!     match &plugin.err {
//!         Some(err) => println!("{} (invalid: {})", plugin.name, err),
//!         None => println!("{} ({})", plugin.name, plugin.vendor),
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod candidate;
mod discovery;
mod validate;
pub mod types;

pub use candidate::{BinaryCandidate, Candidate};
pub use discovery::{discover_candidates, find_plugin, list_plugins, CandidateSet};
pub use types::{
    BuiltinCommand, CommandTree, Metadata, Plugin, PluginError, METADATA_SUBCOMMAND, NAME_PREFIX,
};
pub use validate::{validate_candidate, NAME_PATTERN};
