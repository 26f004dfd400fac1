//! Error types for walk operations.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::locator::Locator;

/// Error type returned by walk handlers.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur during a walk or while handling checkpoints.
#[derive(Debug, Error)]
pub enum WalkError {
    /// Metadata for an entry on the active path could not be read.
    #[error("File system appears to be unavailable for: {path}")]
    FilesystemUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Root path is not a directory.
    #[error("Root path is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// The walk was cancelled by the caller.
    #[error("Walk interrupted")]
    Interrupted,

    /// A walk handler failed.
    #[error("Handler failed at {path}: {source}")]
    Handler {
        path: PathBuf,
        #[source]
        source: HandlerError,
    },

    /// A directory was pushed while already open on the progress stack.
    #[error("Directory is already open on the progress stack: {locator}")]
    DuplicateEntry { locator: Locator },

    /// A locator string is not a valid `file://` URI.
    #[error("Invalid locator {locator:?}: {reason}")]
    InvalidLocator { locator: String, reason: String },

    /// A checkpoint failed validation.
    #[error("Invalid checkpoint: {reason}")]
    InvalidCheckpoint { reason: String },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// I/O error while reading or writing a checkpoint.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Checkpoint (de)serialization failed.
    #[error("Checkpoint serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl WalkError {
    /// Create a filesystem-unavailable error for a path.
    pub fn unavailable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FilesystemUnavailable {
            path: path.into(),
            source,
        }
    }

    /// Wrap a handler failure with the path being handled.
    pub fn handler(path: impl Into<PathBuf>, source: HandlerError) -> Self {
        Self::Handler {
            path: path.into(),
            source,
        }
    }

    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the progress stack is still consistent after this error, so
    /// that a later walk can resume from it.
    pub fn is_resumable(&self) -> bool {
        matches!(
            self,
            Self::FilesystemUnavailable { .. } | Self::Interrupted | Self::Handler { .. }
        )
    }

    /// The filesystem path this error refers to, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::FilesystemUnavailable { path, .. }
            | Self::NotADirectory { path }
            | Self::Handler { path, .. }
            | Self::Io { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// Kind of non-fatal walk condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningKind {
    /// A directory's listing could not be enumerated.
    RestrictedAccess,
    /// The live filesystem no longer matched the recorded progress.
    RecoveryDivergence,
}

/// Non-fatal condition recorded during a walk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkWarning {
    /// Path where the condition occurred.
    pub path: PathBuf,
    /// Human-readable message.
    pub message: String,
    /// Kind of warning.
    pub kind: WarningKind,
}

impl WalkWarning {
    /// Create a new walk warning.
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>, kind: WarningKind) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            kind,
        }
    }

    /// Create a restricted-access warning.
    pub fn restricted(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            message: format!("Restricted directory: {}", path.display()),
            path,
            kind: WarningKind::RestrictedAccess,
        }
    }

    /// Create a recovery divergence warning.
    pub fn divergence(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::new(path, message, WarningKind::RecoveryDivergence)
    }
}
