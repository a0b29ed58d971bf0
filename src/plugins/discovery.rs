//! Plugin discovery across the search path
//!
//! Scans the plugin directories for files named `skiff-*`, groups them by
//! file name with first-directory-wins precedence, and hands the winners to
//! the validation pipeline. Unreadable directories are skipped with a
//! warning so one bad entry on the search path never takes out the rest.

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::PathBuf;

use futures::future;
use tracing::{debug, warn};

use super::candidate::BinaryCandidate;
use super::types::{CommandTree, Plugin, NAME_PREFIX};
use super::validate::{add_exe_suffix, is_valid_name, validate_candidate};
use crate::error::{Result, SkiffError};

/// One plugin file name as found on the search path: the path that wins plus
/// any same-named files in later directories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateSet {
    /// Path in the earliest directory containing this file name.
    pub path: PathBuf,
    /// Same-named paths in later directories, in directory order.
    pub shadowed: Vec<PathBuf>,
}

/// Collect plugin candidates from `dirs`, in first-seen order.
///
/// Only regular files (and symlinks to them) whose name starts with
/// `skiff-` count. Entries within a directory are taken in sorted order so
/// discovery is deterministic regardless of readdir ordering. Missing
/// directories are fine; any other read failure is logged and skipped.
pub fn discover_candidates(dirs: &[PathBuf]) -> Vec<CandidateSet> {
    let mut order: Vec<OsString> = Vec::new();
    let mut by_name: HashMap<OsString, Vec<PathBuf>> = HashMap::new();

    for dir in dirs {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(dir = %dir.display(), error = %e, "Skipping unreadable plugin directory");
                }
                continue;
            }
        };

        let mut files: Vec<(OsString, PathBuf)> = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let file_name = entry.file_name();
            if !file_name.to_string_lossy().starts_with(NAME_PREFIX) {
                continue;
            }
            files.push((file_name, path));
        }
        files.sort();

        for (file_name, path) in files {
            match by_name.get_mut(&file_name) {
                Some(paths) => paths.push(path),
                None => {
                    order.push(file_name.clone());
                    by_name.insert(file_name, vec![path]);
                }
            }
        }
    }

    order
        .into_iter()
        .filter_map(|file_name| by_name.remove(&file_name))
        .map(|mut paths| {
            let path = paths.remove(0);
            CandidateSet {
                path,
                shadowed: paths,
            }
        })
        .collect()
}

/// Discover and validate every plugin on the search path.
///
/// Candidates are validated concurrently; results come back sorted by
/// plugin name. Invalid plugins are included with their `err` set, and
/// callers decide how to present them. The rare hard error (a candidate
/// that stops being nameable) aborts the listing.
pub async fn list_plugins(
    dirs: &[PathBuf],
    tree: &dyn CommandTree,
    allow_experimental: bool,
) -> Result<Vec<Plugin>> {
    let candidates = discover_candidates(dirs);
    debug!(count = candidates.len(), "Collected plugin candidates");

    let validations = candidates.iter().map(|set| {
        let candidate = BinaryCandidate::new(set.path.clone());
        async move { validate_candidate(&candidate, tree, allow_experimental).await }
    });
    let results = future::join_all(validations).await;

    let mut plugins = Vec::with_capacity(candidates.len());
    for (set, result) in candidates.iter().zip(results) {
        let mut plugin = result?;
        plugin.shadowed_paths = set.shadowed.clone();
        plugins.push(plugin);
    }

    plugins.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(plugins)
}

/// Look up a single plugin by logical name.
///
/// Names that fail the plugin name pattern report as not found, so callers
/// fall through to their usual unknown-command handling. The first directory
/// containing `skiff-<name>` decides; the plugin comes back even when
/// invalid, `err` explaining why it cannot be used.
pub async fn find_plugin(
    name: &str,
    dirs: &[PathBuf],
    tree: &dyn CommandTree,
    allow_experimental: bool,
) -> Result<Plugin> {
    if !is_valid_name(name) {
        return Err(SkiffError::PluginNotFound(name.to_string()));
    }

    let file_name = add_exe_suffix(format!("{}{}", NAME_PREFIX, name));
    for dir in dirs {
        let path = dir.join(&file_name);
        // Existence is decided by a stat, not by running the file: an exec
        // failure on a present file is a fetch error, not "no such plugin".
        if !path.is_file() {
            continue;
        }
        let candidate = BinaryCandidate::new(path);
        return validate_candidate(&candidate, tree, allow_experimental).await;
    }

    Err(SkiffError::PluginNotFound(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, "").unwrap();
        path
    }

    #[cfg(unix)]
    fn write_plugin(dir: &Path, name: &str, metadata_json: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\necho '{}'\n", metadata_json)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn host_tree() -> clap::Command {
        clap::Command::new("skiff")
            .subcommand(clap::Command::new("version"))
            .subcommand(clap::Command::new("plugin"))
    }

    #[test]
    fn test_discover_empty_dir() {
        let dir = TempDir::new().unwrap();
        let candidates = discover_candidates(&[dir.path().to_path_buf()]);
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_discover_missing_dir() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("no-such-dir");
        let candidates = discover_candidates(&[missing]);
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_discover_skips_unrelated_entries() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "README.md");
        touch(dir.path(), "skiffling");
        std::fs::create_dir(dir.path().join("skiff-subdir")).unwrap();
        let kept = touch(dir.path(), "skiff-keeper");

        let candidates = discover_candidates(&[dir.path().to_path_buf()]);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].path, kept);
        assert!(candidates[0].shadowed.is_empty());
    }

    #[test]
    fn test_discover_sorts_within_a_directory() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "skiff-bbb");
        touch(dir.path(), "skiff-aaa");

        let candidates = discover_candidates(&[dir.path().to_path_buf()]);
        let names: Vec<_> = candidates
            .iter()
            .map(|set| set.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["skiff-aaa", "skiff-bbb"]);
    }

    #[test]
    fn test_discover_first_directory_wins() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        let winner = touch(first.path(), "skiff-dupe");
        let loser = touch(second.path(), "skiff-dupe");
        let only = touch(second.path(), "skiff-only");

        let candidates = discover_candidates(&[
            first.path().to_path_buf(),
            second.path().to_path_buf(),
        ]);
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].path, winner);
        assert_eq!(candidates[0].shadowed, vec![loser]);
        assert_eq!(candidates[1].path, only);
        assert!(candidates[1].shadowed.is_empty());
    }

    #[tokio::test]
    async fn test_list_plugins_no_dirs() {
        let plugins = list_plugins(&[], &host_tree(), false).await.unwrap();
        assert!(plugins.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_list_plugins_reports_valid_and_invalid() {
        let dir = TempDir::new().unwrap();
        write_plugin(
            dir.path(),
            "skiff-good",
            r#"{"SchemaVersion": "0.1.0", "Vendor": "e2e-testing"}"#,
        );
        write_plugin(dir.path(), "skiff-bad", "xyzzy");
        // Short-circuited before any fetch, so these need no real metadata.
        touch(dir.path(), "skiff-123456");
        touch(dir.path(), "skiff-version");

        let plugins = list_plugins(&[dir.path().to_path_buf()], &host_tree(), false)
            .await
            .unwrap();
        let names: Vec<_> = plugins.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["123456", "bad", "good", "version"]);

        assert!(plugins[0].err.as_ref().unwrap().to_string().contains("did not match"));
        assert!(plugins[1]
            .err
            .as_ref()
            .unwrap()
            .to_string()
            .contains("invalid metadata"));
        assert!(plugins[2].is_valid());
        assert_eq!(plugins[2].vendor, "e2e-testing");
        assert!(plugins[3]
            .err
            .as_ref()
            .unwrap()
            .to_string()
            .contains("duplicates builtin command"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_list_plugins_attaches_shadowed_paths() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        write_plugin(
            first.path(),
            "skiff-dupe",
            r#"{"SchemaVersion": "0.1.0", "Vendor": "first"}"#,
        );
        let loser = write_plugin(
            second.path(),
            "skiff-dupe",
            r#"{"SchemaVersion": "0.1.0", "Vendor": "second"}"#,
        );

        let plugins = list_plugins(
            &[first.path().to_path_buf(), second.path().to_path_buf()],
            &host_tree(),
            false,
        )
        .await
        .unwrap();
        assert_eq!(plugins.len(), 1);
        assert_eq!(plugins[0].vendor, "first");
        assert_eq!(plugins[0].shadowed_paths, vec![loser]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_find_plugin_valid() {
        let dir = TempDir::new().unwrap();
        let path = write_plugin(
            dir.path(),
            "skiff-real",
            r#"{"SchemaVersion": "0.1.0", "Vendor": "e2e-testing"}"#,
        );

        let plugin = find_plugin("real", &[dir.path().to_path_buf()], &host_tree(), false)
            .await
            .unwrap();
        assert!(plugin.is_valid());
        assert_eq!(plugin.name, "real");
        assert_eq!(plugin.path, path);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_find_plugin_invalid_still_returned() {
        use std::os::unix::fs::PermissionsExt;
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("skiff-broken");
        std::fs::write(&path, "#!/bin/sh\nexit 1\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();

        let plugin = find_plugin("broken", &[dir.path().to_path_buf()], &host_tree(), false)
            .await
            .unwrap();
        let err = plugin.err.as_ref().unwrap().to_string();
        assert!(err.contains("failed to fetch metadata"), "err was: {}", err);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_find_plugin_first_directory_wins() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        write_plugin(
            first.path(),
            "skiff-pick",
            r#"{"SchemaVersion": "0.1.0", "Vendor": "first"}"#,
        );
        write_plugin(
            second.path(),
            "skiff-pick",
            r#"{"SchemaVersion": "0.1.0", "Vendor": "second"}"#,
        );

        let plugin = find_plugin(
            "pick",
            &[first.path().to_path_buf(), second.path().to_path_buf()],
            &host_tree(),
            false,
        )
        .await
        .unwrap();
        assert_eq!(plugin.vendor, "first");
    }

    #[tokio::test]
    async fn test_find_plugin_missing() {
        let dir = TempDir::new().unwrap();
        let err = find_plugin("ghost", &[dir.path().to_path_buf()], &host_tree(), false)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "no plugin found for \"ghost\"");
    }

    #[tokio::test]
    async fn test_find_plugin_rejects_malformed_name() {
        let err = find_plugin("Not-a-name!", &[], &host_tree(), false)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
