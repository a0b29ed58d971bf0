//! Plugin candidates and metadata retrieval
//!
//! A candidate is anything with a path that can produce raw metadata bytes.
//! The production implementation, [`BinaryCandidate`], spawns the candidate
//! executable with the reserved metadata argument and captures its stdout.
//! Tests substitute canned candidates so the validation pipeline can be
//! exercised without touching the filesystem.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;

use crate::error::{Result, SkiffError};

use super::types::METADATA_SUBCOMMAND;

/// A discovered plugin candidate that can report its own metadata.
///
/// Fetching metadata is the only side effect validation performs, and it is
/// skipped entirely for candidates rejected before that point.
#[async_trait]
pub trait Candidate: Send + Sync {
    /// Path (or bare file name) identifying the candidate.
    fn path(&self) -> &Path;

    /// Raw self-reported metadata bytes.
    ///
    /// No timeout is imposed here; callers who need one wrap the future.
    async fn metadata(&self) -> Result<Vec<u8>>;
}

/// Candidate backed by an executable file on disk.
#[derive(Debug, Clone)]
pub struct BinaryCandidate {
    path: PathBuf,
}

impl BinaryCandidate {
    /// Wrap the executable at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl Candidate for BinaryCandidate {
    fn path(&self) -> &Path {
        &self.path
    }

    /// Runs `<path> skiff-cli-plugin-metadata` and returns its stdout.
    ///
    /// The child is killed if this future is dropped, so cancelling a
    /// validation also cancels the fetch.
    async fn metadata(&self) -> Result<Vec<u8>> {
        let output = tokio::process::Command::new(&self.path)
            .arg(METADATA_SUBCOMMAND)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr = stderr.trim();
            let message = if stderr.is_empty() {
                format!("{} exited with {}", self.path.display(), output.status)
            } else {
                format!(
                    "{} exited with {}: {}",
                    self.path.display(),
                    output.status,
                    stderr
                )
            };
            return Err(SkiffError::Metadata(message));
        }

        Ok(output.stdout)
    }
}
