//! Walk configuration types.

use std::path::PathBuf;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::error::WalkError;

/// Configuration for a walk.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct WalkConfig {
    /// Root directory of the walk.
    pub root: PathBuf,

    /// Descend below the root's immediate children.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub recursive: bool,

    /// Sort each directory listing by file name.
    ///
    /// Resuming relies on sibling directories being enumerated in the same
    /// order as in the interrupted run. Filesystems usually enumerate an
    /// unchanged directory identically, but sorting makes that hold across
    /// platforms and copies of the tree.
    #[builder(default = "false")]
    #[serde(default)]
    pub sort_entries: bool,
}

fn default_true() -> bool {
    true
}

impl WalkConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        match self.root {
            Some(ref root) if root.as_os_str().is_empty() => {
                Err("Root path cannot be empty".to_string())
            }
            Some(_) => Ok(()),
            None => Err("Root path is required".to_string()),
        }
    }
}

impl WalkConfig {
    /// Create a new walk config builder.
    pub fn builder() -> WalkConfigBuilder {
        WalkConfigBuilder::default()
    }

    /// Create a recursive, unsorted config for walking a path.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            recursive: true,
            sort_entries: false,
        }
    }

    /// Check a config that was not produced by the builder.
    pub fn validate(&self) -> Result<(), WalkError> {
        if self.root.as_os_str().is_empty() {
            return Err(WalkError::InvalidConfig {
                message: "Root path cannot be empty".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self::new(".")
    }
}
