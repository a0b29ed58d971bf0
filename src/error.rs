//! Error types for Skiff
//!
//! Errors here are the *hard* failures: conditions under which no plugin
//! record exists at all. A discovered plugin that merely breaks a validation
//! rule is not an error in this sense; it is reported through
//! [`crate::plugins::PluginError`] on the plugin record itself, so listings
//! can still name it.

use thiserror::Error;

/// The primary error type for Skiff operations.
#[derive(Error, Debug)]
pub enum SkiffError {
    /// The candidate cannot be treated as a plugin at all (empty path,
    /// missing name prefix). The payload is the complete user-facing text.
    #[error("{0}")]
    Candidate(String),

    /// The plugin's metadata subprocess misbehaved (non-zero exit, etc).
    #[error("{0}")]
    Metadata(String),

    /// No plugin by the requested name exists on the search path.
    #[error("no plugin found for \"{0}\"")]
    PluginNotFound(String),

    /// Configuration file problems.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SkiffError {
    /// True when the error means "no such plugin" rather than a real failure.
    /// Callers use this to fall through to their usual unknown-command path.
    pub fn is_not_found(&self) -> bool {
        matches!(self, SkiffError::PluginNotFound(_))
    }
}

/// Convenience result type for Skiff operations.
pub type Result<T> = std::result::Result<T, SkiffError>;
