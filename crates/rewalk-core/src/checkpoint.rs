//! Persisted walk progress.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::WalkError;
use crate::locator::Locator;
use crate::progress::ProgressStack;

/// Current checkpoint format version.
pub const CHECKPOINT_VERSION: u32 = 1;

/// A serialized snapshot of walk progress.
///
/// Holds the walk-level settings once, followed by one entry per open
/// directory, root first. Seeding a new walk with `progress` resumes the
/// interrupted one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Format version.
    pub version: u32,
    /// Root of the walk.
    pub root: Locator,
    /// Whether the walk descends below the root's children.
    pub recursive: bool,
    /// Whether listings were sorted by name.
    #[serde(default)]
    pub sort_entries: bool,
    /// When the checkpoint was taken.
    pub saved_at: DateTime<Utc>,
    /// Open directories, root first.
    pub progress: ProgressStack,
}

impl Checkpoint {
    /// Snapshot a progress stack.
    pub fn new(root: Locator, recursive: bool, sort_entries: bool, progress: &ProgressStack) -> Self {
        Self {
            version: CHECKPOINT_VERSION,
            root,
            recursive,
            sort_entries,
            saved_at: Utc::now(),
            progress: progress.clone(),
        }
    }

    /// Whether the walk had finished when this checkpoint was taken.
    pub fn is_finished(&self) -> bool {
        self.progress.is_empty()
    }

    /// Check structural consistency.
    ///
    /// The first entry must be the root, every entry must lie beneath the
    /// previous one, and every pending child must lie beneath its entry.
    pub fn validate(&self) -> Result<(), WalkError> {
        if self.version != CHECKPOINT_VERSION {
            return Err(invalid(format!(
                "unsupported version {} (expected {CHECKPOINT_VERSION})",
                self.version
            )));
        }
        Locator::parse(self.root.as_str())?;

        if let Some(first) = self.progress.get(0) {
            if first.locator() != &self.root {
                return Err(invalid(format!(
                    "first entry {} is not the root {}",
                    first.locator(),
                    self.root
                )));
            }
        }

        for (parent, child) in self.progress.iter().zip(self.progress.iter().skip(1)) {
            if !parent.locator().is_ancestor_of(child.locator()) {
                return Err(invalid(format!(
                    "entry {} does not lie beneath {}",
                    child.locator(),
                    parent.locator()
                )));
            }
        }

        for entry in &self.progress {
            if let Some(stray) = entry.pending().find(|c| !entry.locator().is_ancestor_of(c)) {
                return Err(invalid(format!(
                    "pending child {stray} does not lie beneath {}",
                    entry.locator()
                )));
            }
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, WalkError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and validate a checkpoint.
    pub fn from_json(json: &str) -> Result<Self, WalkError> {
        let checkpoint: Self = serde_json::from_str(json)?;
        checkpoint.validate()?;
        Ok(checkpoint)
    }

    /// Write the checkpoint, replacing any previous file atomically.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), WalkError> {
        let path = path.as_ref();
        let json = self.to_json()?;
        let tmp = temp_path(path);
        fs::write(&tmp, json).map_err(|e| WalkError::io(&tmp, e))?;
        fs::rename(&tmp, path).map_err(|e| WalkError::io(path, e))
    }

    /// Read and validate a checkpoint file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, WalkError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| WalkError::io(path, e))?;
        Self::from_json(&json)
    }
}

fn invalid(reason: String) -> WalkError {
    WalkError::InvalidCheckpoint { reason }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from("checkpoint"));
    name.push(".tmp");
    path.with_file_name(name)
}
