//! Candidate validation pipeline
//!
//! Takes a discovered candidate plus the host's builtin command tree and
//! decides whether the candidate is a legitimate, non-conflicting,
//! schema-compliant plugin. Failures land in one of two disjoint tiers:
//!
//! - **Hard errors**: the candidate could not even be named (empty path,
//!   missing `skiff-` prefix). No [`Plugin`] record exists and the candidate
//!   never surfaces in listings.
//! - **Invalidity**: the candidate is a real, nameable plugin that breaks a
//!   rule (bad name pattern, builtin conflict, metadata problems). A
//!   [`Plugin`] record is still produced with [`Plugin::err`] set, so
//!   listings can say what is broken while other candidates proceed.
//!
//! Checks run in a fixed order: name derivation, builtin-conflict check,
//! metadata fetch, metadata decode with schema and vendor rules, then the
//! experimental gate. The conflict check runs before the fetch: a candidate
//! that collides with a builtin command is never executed.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::error::{Result, SkiffError};

use super::candidate::Candidate;
use super::types::{CommandTree, Metadata, Plugin, PluginError, NAME_PREFIX};

/// Pattern every logical plugin name must match: lowercase alphanumeric,
/// starting with a letter.
pub const NAME_PATTERN: &str = "^[a-z][a-z0-9]*$";

static NAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(NAME_PATTERN).expect("invalid regex"));

/// True when `name` is an acceptable logical plugin name.
pub(crate) fn is_valid_name(name: &str) -> bool {
    NAME_RE.is_match(name)
}

/// Append the platform executable suffix to a plugin file name.
#[cfg(windows)]
pub(crate) fn add_exe_suffix(file_name: String) -> String {
    format!("{}.exe", file_name)
}

#[cfg(not(windows))]
pub(crate) fn add_exe_suffix(file_name: String) -> String {
    file_name
}

/// Strip the platform executable suffix from a candidate's base file name.
/// On Windows the suffix is mandatory: a candidate without `.exe` (any case)
/// is not a plugin at all.
#[cfg(windows)]
fn trim_exe_suffix(path: &Path, base: &str) -> Result<String> {
    match base.rsplit_once('.') {
        Some((stem, ext)) if ext.eq_ignore_ascii_case("exe") => Ok(stem.to_string()),
        _ => Err(SkiffError::Candidate(format!(
            "plugin candidate \"{}\" does not have \".exe\" suffix",
            path.display()
        ))),
    }
}

#[cfg(not(windows))]
fn trim_exe_suffix(_path: &Path, base: &str) -> Result<String> {
    Ok(base.to_string())
}

/// Derive the logical plugin name from a candidate path.
///
/// The path's base file name, minus the platform executable suffix, must
/// carry the `skiff-` prefix; anything else is a hard error because such a
/// file can never be a plugin. A prefixed name that fails [`NAME_PATTERN`]
/// comes back alongside the invalidity to embed instead.
fn derive_name(path: &Path) -> Result<(String, Option<PluginError>)> {
    if path.as_os_str().is_empty() {
        return Err(SkiffError::Candidate(
            "plugin candidate path cannot be empty".to_string(),
        ));
    }

    let base = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let base = trim_exe_suffix(path, &base)?;

    let name = match base.strip_prefix(NAME_PREFIX) {
        Some(rest) => rest.to_string(),
        None => {
            return Err(SkiffError::Candidate(format!(
                "plugin candidate \"{}\" does not have \"{}\" prefix",
                path.display(),
                NAME_PREFIX
            )));
        }
    };

    if !is_valid_name(&name) {
        let err = PluginError::new(format!(
            "plugin candidate \"{}\" did not match \"{}\"",
            name, NAME_PATTERN
        ));
        return Ok((name, Some(err)));
    }

    Ok((name, None))
}

/// Check a derived name against the host's builtin commands.
///
/// Command names form the first tier and aliases the second: aliases are
/// only consulted when no builtin is named `name`, and an alias hit reports
/// the owning command's canonical name.
fn check_builtin_conflict(name: &str, tree: &dyn CommandTree) -> Option<PluginError> {
    let builtins = tree.builtin_commands();

    if builtins.iter().any(|cmd| cmd.name == name) {
        return Some(PluginError::new(format!(
            "plugin \"{}\" duplicates builtin command",
            name
        )));
    }

    builtins
        .iter()
        .find(|cmd| cmd.aliases.iter().any(|alias| alias == name))
        .map(|cmd| {
            PluginError::new(format!(
                "plugin \"{}\" duplicates an alias of builtin command \"{}\"",
                name, cmd.name
            ))
        })
}

/// Decode metadata bytes and apply the schema-version and vendor rules.
fn parse_metadata(bytes: &[u8]) -> std::result::Result<Metadata, PluginError> {
    let metadata: Metadata = serde_json::from_slice(bytes)
        .map_err(|e| PluginError::new(format!("invalid metadata: {}", e)))?;

    if metadata.schema_version.is_empty()
        || semver::Version::parse(&metadata.schema_version).is_err()
    {
        return Err(PluginError::new(format!(
            "plugin SchemaVersion \"{}\" is not valid",
            metadata.schema_version
        )));
    }

    if metadata.vendor.trim().is_empty() {
        return Err(PluginError::new("plugin metadata does not define a vendor"));
    }

    Ok(metadata)
}

/// Validate one plugin candidate against the host command tree.
///
/// Returns a hard error only when the candidate cannot be treated as a
/// plugin at all. Every other failure produces a [`Plugin`] whose
/// [`Plugin::err`] describes the first rule the candidate broke; a fully
/// valid candidate comes back with `err` unset and the metadata fields
/// populated. Given the same candidate and tree, the outcome is the same
/// every time.
pub async fn validate_candidate(
    candidate: &dyn Candidate,
    tree: &dyn CommandTree,
    allow_experimental: bool,
) -> Result<Plugin> {
    let plugin = build_plugin(candidate, tree, allow_experimental).await?;
    match &plugin.err {
        Some(err) => debug!(plugin = %plugin.name, error = %err, "Plugin candidate rejected"),
        None => debug!(plugin = %plugin.name, path = %plugin.path.display(), "Plugin candidate valid"),
    }
    Ok(plugin)
}

async fn build_plugin(
    candidate: &dyn Candidate,
    tree: &dyn CommandTree,
    allow_experimental: bool,
) -> Result<Plugin> {
    let path = candidate.path();
    let (name, name_err) = derive_name(path)?;

    let mut plugin = Plugin::stub(name, path.to_path_buf());
    if let Some(err) = name_err {
        plugin.err = Some(err);
        return Ok(plugin);
    }

    // Conflicts are decided before fetching metadata, so a conflicting
    // executable is never run.
    if let Some(err) = check_builtin_conflict(&plugin.name, tree) {
        plugin.err = Some(err);
        return Ok(plugin);
    }

    let bytes = match candidate.metadata().await {
        Ok(bytes) => bytes,
        Err(e) => {
            plugin.err = Some(PluginError::new(format!("failed to fetch metadata: {}", e)));
            return Ok(plugin);
        }
    };

    let metadata = match parse_metadata(&bytes) {
        Ok(metadata) => metadata,
        Err(err) => {
            plugin.err = Some(err);
            return Ok(plugin);
        }
    };

    if metadata.experimental && !allow_experimental {
        plugin.err = Some(PluginError::new("plugin requires experimental CLI"));
        return Ok(plugin);
    }

    plugin.schema_version = metadata.schema_version;
    plugin.vendor = metadata.vendor;
    plugin.version = metadata.version;
    plugin.short_description = metadata.short_description;
    plugin.url = metadata.url;
    Ok(plugin)
}
