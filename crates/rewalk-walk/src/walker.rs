//! Resumable depth-first walker.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{Dispatch, debug, error, info, warn};

use rewalk_core::{
    Checkpoint, Locator, ProgressEntry, ProgressStack, WalkConfig, WalkError, WalkStats,
};

use crate::fs::{EntryKind, FileSystem, OsFileSystem};
use crate::handler::WalkHandler;
use crate::recovery::{RecoveryRoad, RoadDecision};

/// Depth-first walker that records its progress so an interrupted walk can
/// be resumed.
///
/// While the walk runs, the progress stack holds one entry per open
/// directory with the children that have not been handled yet. When a walk
/// stops early (cancellation, a handler failure, or an unreadable entry)
/// the stack is left consistent; seeding a new walker with it, directly or
/// through a [`Checkpoint`], continues where the old one stopped.
///
/// Directories are visited recursively, one stack frame per level, so the
/// recursion depth is bounded by the depth of the tree being walked.
pub struct FileWalker<H, F = OsFileSystem> {
    config: WalkConfig,
    root: PathBuf,
    handler: H,
    fs: F,
    progress: ProgressStack,
    recovery: Option<RecoveryRoad>,
    cancel: CancellationToken,
    dispatch: Option<Dispatch>,
    stats: WalkStats,
}

impl<H: WalkHandler> FileWalker<H> {
    /// Create a walker over the real filesystem.
    pub fn new(config: WalkConfig, handler: H) -> Self {
        Self::with_filesystem(config, handler, OsFileSystem)
    }

    /// Create a walker that resumes a checkpointed walk.
    pub fn from_checkpoint(checkpoint: Checkpoint, handler: H) -> Result<Self, WalkError> {
        Self::from_checkpoint_with_filesystem(checkpoint, handler, OsFileSystem)
    }
}

impl<H: WalkHandler, F: FileSystem> FileWalker<H, F> {
    /// Create a walker over a custom filesystem.
    pub fn with_filesystem(config: WalkConfig, handler: H, fs: F) -> Self {
        let root = std::path::absolute(&config.root).unwrap_or_else(|_| config.root.clone());
        Self {
            config,
            root,
            handler,
            fs,
            progress: ProgressStack::new(),
            recovery: None,
            cancel: CancellationToken::new(),
            dispatch: None,
            stats: WalkStats::new(),
        }
    }

    pub fn from_checkpoint_with_filesystem(
        checkpoint: Checkpoint,
        handler: H,
        fs: F,
    ) -> Result<Self, WalkError> {
        checkpoint.validate()?;
        let config = WalkConfig {
            root: checkpoint.root.to_path()?,
            recursive: checkpoint.recursive,
            sort_entries: checkpoint.sort_entries,
        };
        Ok(Self::with_filesystem(config, handler, fs).with_progress(checkpoint.progress))
    }

    /// Seed the walker with recorded progress.
    pub fn with_progress(mut self, progress: ProgressStack) -> Self {
        self.progress = progress;
        self
    }

    /// Use a caller-owned cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Emit the walk's log events to `dispatch` instead of the global
    /// subscriber.
    pub fn with_dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = Some(dispatch);
        self
    }

    pub fn config(&self) -> &WalkConfig {
        &self.config
    }

    /// The absolute walk root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Current progress. Empty after a completed walk.
    pub fn progress(&self) -> &ProgressStack {
        &self.progress
    }

    pub fn set_progress(&mut self, progress: ProgressStack) {
        self.progress = progress;
    }

    /// Statistics of the last walk.
    pub fn stats(&self) -> &WalkStats {
        &self.stats
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    pub fn into_handler(self) -> H {
        self.handler
    }

    pub fn filesystem(&self) -> &F {
        &self.fs
    }

    pub fn filesystem_mut(&mut self) -> &mut F {
        &mut self.fs
    }

    /// A handle that cancels this walker's walks.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Snapshot the current progress.
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint::new(
            Locator::from_path(&self.root),
            self.config.recursive,
            self.config.sort_entries,
            &self.progress,
        )
    }

    /// Walk the tree, resuming from the current progress if there is any.
    ///
    /// On success the progress stack is empty. On a resumable error it
    /// describes exactly what is left to do.
    pub fn walk(&mut self) -> Result<WalkStats, WalkError> {
        match self.dispatch.clone() {
            Some(dispatch) => tracing::dispatcher::with_default(&dispatch, || self.run()),
            None => self.run(),
        }
    }

    fn run(&mut self) -> Result<WalkStats, WalkError> {
        self.config.validate()?;
        let start = Instant::now();

        self.stats = WalkStats::new();
        self.recovery = RecoveryRoad::plan(&self.progress);
        self.stats.resumed = self.recovery.is_some();

        info!(
            root = %self.root.display(),
            recursive = self.config.recursive,
            resumed = self.stats.resumed,
            open_directories = self.progress.len(),
            "starting walk"
        );

        let root = self.root.clone();
        let result = self.walk_root(&root);
        self.recovery = None;
        self.stats.duration = start.elapsed();

        match &result {
            Ok(()) => info!(
                directories = self.stats.directories,
                files = self.stats.files,
                restricted = self.stats.restricted,
                skipped = self.stats.skipped,
                divergences = self.stats.divergences,
                elapsed_ms = self.stats.duration.as_millis() as u64,
                "walk complete"
            ),
            Err(WalkError::Interrupted) => info!(
                open_directories = self.progress.len(),
                "walk interrupted"
            ),
            Err(err) => warn!(
                error = %err,
                open_directories = self.progress.len(),
                "walk stopped"
            ),
        }

        result.map(|()| self.stats.clone())
    }

    fn walk_root(&mut self, root: &Path) -> Result<(), WalkError> {
        self.check_cancelled()?;
        match self.fs.entry_kind(root, true) {
            Ok(EntryKind::Directory) => self.walk_directory(root, 0),
            Ok(_) => Err(WalkError::NotADirectory {
                path: root.to_path_buf(),
            }),
            Err(source) => Err(self.unavailable(root, source)),
        }
    }

    fn walk_directory(&mut self, dir: &Path, depth: usize) -> Result<(), WalkError> {
        let locator = Locator::from_path(dir);

        let decision = self
            .recovery
            .as_ref()
            .map(|road| road.decide_directory(depth, &locator));
        match decision {
            Some(RoadDecision::Follow) => {
                debug!(path = %dir.display(), depth, "fast-forwarding through directory");
            }
            Some(RoadDecision::Resume) => self.stop_fast_forward(dir, depth),
            Some(RoadDecision::Skip) => {
                debug!(path = %dir.display(), depth, "skipping finished directory");
                self.stats.record_skipped();
                return Ok(());
            }
            Some(RoadDecision::Diverged) => {
                warn!(
                    path = %dir.display(),
                    "walk root does not match recorded progress; starting afresh"
                );
                self.stop_fast_forward(dir, 0);
            }
            None => {}
        }

        let children = match self.list_children(dir) {
            Ok(children) => children,
            Err(err) => {
                if self.recovery.is_some() {
                    // A recorded directory that can no longer be listed.
                    self.stop_fast_forward(dir, depth);
                }
                return self.handle_restricted(dir, depth, &locator, &err);
            }
        };

        if self.recovery.is_none() {
            self.open_directory(dir, depth, &locator, &children)?;
        }

        if self.config.recursive || depth == 0 {
            let child_depth = depth + 1;
            for child in &children {
                self.check_cancelled()?;
                match self.fs.entry_kind(child, false) {
                    Ok(EntryKind::Directory) => self.walk_directory(child, child_depth)?,
                    Ok(kind) => self.walk_file(child, child_depth, kind)?,
                    Err(source) => return Err(self.unavailable(child, source)),
                }
            }
        }

        self.close_directory(dir, depth, &locator);
        Ok(())
    }

    fn open_directory(
        &mut self,
        dir: &Path,
        depth: usize,
        locator: &Locator,
        children: &[PathBuf],
    ) -> Result<(), WalkError> {
        debug!(path = %dir.display(), depth, children = children.len(), "directory");
        let resource_id = self
            .handler
            .handle_directory(dir, depth, self.progress.peek())
            .map_err(|source| WalkError::handler(dir, source))?;

        self.progress.push(ProgressEntry::new(
            locator.clone(),
            resource_id,
            children.iter().map(Locator::from_path),
        ))?;
        self.stats.record_directory();
        Ok(())
    }

    fn close_directory(&mut self, dir: &Path, depth: usize, locator: &Locator) {
        if self.recovery.is_some() {
            // Nothing recorded under this directory was found again; carry on
            // after it.
            let outstanding = self.progress.get(depth).map_or(0, ProgressEntry::pending_len);
            self.recovery = None;
            self.progress.truncate(depth + 1);
            if outstanding > 0 {
                warn!(
                    path = %dir.display(),
                    outstanding,
                    "recorded children no longer present; resuming after directory"
                );
                self.stats.record_divergence(
                    dir,
                    format!("{outstanding} recorded children no longer present"),
                );
            } else {
                info!(path = %dir.display(), depth, "resuming after finished directory");
            }
        }

        if let Some(entry) = self.progress.pop() {
            debug_assert_eq!(entry.locator(), locator);
            self.handler.directory_finished(dir, depth, &entry);
        }
        self.progress.remove_child_from_top(locator);
    }

    fn walk_file(&mut self, file: &Path, depth: usize, kind: EntryKind) -> Result<(), WalkError> {
        let locator = Locator::from_path(file);

        let decision = self
            .recovery
            .as_ref()
            .map(|road| road.decide_file(depth, &locator));
        match decision {
            Some(RoadDecision::Resume) => self.stop_fast_forward(file, depth),
            Some(_) => {
                debug!(path = %file.display(), depth, "skipping finished file");
                self.stats.record_skipped();
                return Ok(());
            }
            None => {}
        }

        if self.is_regular_file(file, kind) {
            debug!(path = %file.display(), depth, "file");
            self.handler
                .handle_file(file, depth, self.progress.peek())
                .map_err(|source| WalkError::handler(file, source))?;
            self.stats.record_file();
        } else {
            debug!(path = %file.display(), ?kind, "not a regular file; marking complete");
        }
        self.progress.remove_child_from_top(&locator);
        Ok(())
    }

    fn handle_restricted(
        &mut self,
        dir: &Path,
        depth: usize,
        locator: &Locator,
        err: &io::Error,
    ) -> Result<(), WalkError> {
        warn!(
            path = %dir.display(),
            depth,
            error = %err,
            "cannot list directory; treating as restricted"
        );
        self.handler
            .handle_restricted_directory(dir, depth, self.progress.peek())
            .map_err(|source| WalkError::handler(dir, source))?;
        self.stats.record_restricted(dir);
        self.progress.remove_child_from_top(locator);
        Ok(())
    }

    /// Leave fast-forward mode at `path`, discarding recorded entries at
    /// `depth` and below.
    fn stop_fast_forward(&mut self, path: &Path, depth: usize) {
        self.recovery = None;
        let discarded = self.progress.truncate(depth);
        if discarded > 0 {
            warn!(
                path = %path.display(),
                discarded,
                "recorded directories are no longer on the walk path"
            );
            self.stats.record_divergence(
                path,
                format!("discarded {discarded} recorded open directories"),
            );
        }
        info!(path = %path.display(), depth, "resume point found");
    }

    fn list_children(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        let mut children = self.fs.read_dir(dir)?;
        if self.config.sort_entries {
            children.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        }
        Ok(children)
    }

    /// Symlinks are never descended; one pointing at a regular file is
    /// handled as that file.
    fn is_regular_file(&self, path: &Path, kind: EntryKind) -> bool {
        match kind {
            EntryKind::File => true,
            EntryKind::Symlink => matches!(self.fs.entry_kind(path, true), Ok(EntryKind::File)),
            EntryKind::Directory | EntryKind::Other => false,
        }
    }

    fn check_cancelled(&self) -> Result<(), WalkError> {
        if self.cancel.is_cancelled() {
            return Err(WalkError::Interrupted);
        }
        Ok(())
    }

    fn unavailable(&self, path: &Path, source: io::Error) -> WalkError {
        error!(
            path = %path.display(),
            error = %source,
            "file system appears to be unavailable"
        );
        WalkError::unavailable(path, source)
    }
}
