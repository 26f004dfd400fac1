//! Walk statistics.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::WalkWarning;

/// Summary of one walk invocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WalkStats {
    /// Directories passed to the directory handler.
    pub directories: u64,
    /// Files passed to the file handler.
    pub files: u64,
    /// Directories passed to the restricted-directory handler.
    pub restricted: u64,
    /// Entries skipped while fast-forwarding.
    pub skipped: u64,
    /// Times the live tree no longer matched the recorded progress.
    pub divergences: u64,
    /// Whether this invocation started from recorded progress.
    pub resumed: bool,
    /// Time spent in the walk.
    pub duration: Duration,
    /// Non-fatal conditions encountered.
    pub warnings: Vec<WalkWarning>,
}

impl WalkStats {
    /// Create new empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_directory(&mut self) {
        self.directories += 1;
    }

    pub fn record_file(&mut self) {
        self.files += 1;
    }

    pub fn record_skipped(&mut self) {
        self.skipped += 1;
    }

    /// Record a directory whose listing could not be read.
    pub fn record_restricted(&mut self, path: impl Into<PathBuf>) {
        self.restricted += 1;
        self.warnings.push(WalkWarning::restricted(path));
    }

    /// Record a mismatch between recorded progress and the live tree.
    pub fn record_divergence(&mut self, path: impl Into<PathBuf>, message: impl Into<String>) {
        self.divergences += 1;
        self.warnings.push(WalkWarning::divergence(path, message));
    }

    /// Total entries passed to any handler.
    pub fn total_handled(&self) -> u64 {
        self.directories + self.files + self.restricted
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WarningKind;

    #[test]
    fn test_stats_default() {
        let stats = WalkStats::default();
        assert_eq!(stats.total_handled(), 0);
        assert!(!stats.resumed);
        assert!(!stats.has_warnings());
    }

    #[test]
    fn test_stats_record() {
        let mut stats = WalkStats::new();
        stats.record_directory();
        stats.record_file();
        stats.record_file();
        stats.record_restricted("/srv/private");
        stats.record_divergence("/srv/gone", "recorded directory vanished");

        assert_eq!(stats.total_handled(), 4);
        assert_eq!(stats.divergences, 1);
        assert_eq!(stats.warnings.len(), 2);
        assert_eq!(stats.warnings[0].kind, WarningKind::RestrictedAccess);
        assert_eq!(stats.warnings[1].kind, WarningKind::RecoveryDivergence);
    }
}
