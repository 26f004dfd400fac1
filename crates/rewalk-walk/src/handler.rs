//! Callbacks invoked by the walker.

use std::path::Path;

use rewalk_core::{HandlerError, ProgressEntry, ResourceId};

/// Receives the walk's events.
///
/// `parent` is the progress entry of the directory containing `path`, or
/// `None` for the walk root. Each location is handled at most once per walk;
/// locations skipped while fast-forwarding are never passed to a handler.
/// Handlers must not assume anything about the order of siblings.
///
/// A handler error aborts the walk. The failing location stays pending, so
/// a resumed walk hands it to the handler again.
pub trait WalkHandler {
    /// A directory is being opened. The returned id is stored in its
    /// progress entry.
    fn handle_directory(
        &mut self,
        path: &Path,
        depth: usize,
        parent: Option<&ProgressEntry>,
    ) -> Result<ResourceId, HandlerError>;

    /// A regular file (or a symlink to one).
    fn handle_file(
        &mut self,
        path: &Path,
        depth: usize,
        parent: Option<&ProgressEntry>,
    ) -> Result<ResourceId, HandlerError>;

    /// A directory whose listing could not be read. It is not descended.
    fn handle_restricted_directory(
        &mut self,
        path: &Path,
        depth: usize,
        parent: Option<&ProgressEntry>,
    ) -> Result<ResourceId, HandlerError>;

    /// Every child of a directory has been handled.
    fn directory_finished(&mut self, _path: &Path, _depth: usize, _entry: &ProgressEntry) {}
}

impl<H: WalkHandler + ?Sized> WalkHandler for &mut H {
    fn handle_directory(
        &mut self,
        path: &Path,
        depth: usize,
        parent: Option<&ProgressEntry>,
    ) -> Result<ResourceId, HandlerError> {
        (**self).handle_directory(path, depth, parent)
    }

    fn handle_file(
        &mut self,
        path: &Path,
        depth: usize,
        parent: Option<&ProgressEntry>,
    ) -> Result<ResourceId, HandlerError> {
        (**self).handle_file(path, depth, parent)
    }

    fn handle_restricted_directory(
        &mut self,
        path: &Path,
        depth: usize,
        parent: Option<&ProgressEntry>,
    ) -> Result<ResourceId, HandlerError> {
        (**self).handle_restricted_directory(path, depth, parent)
    }

    fn directory_finished(&mut self, path: &Path, depth: usize, entry: &ProgressEntry) {
        (**self).directory_finished(path, depth, entry)
    }
}

impl<H: WalkHandler + ?Sized> WalkHandler for Box<H> {
    fn handle_directory(
        &mut self,
        path: &Path,
        depth: usize,
        parent: Option<&ProgressEntry>,
    ) -> Result<ResourceId, HandlerError> {
        (**self).handle_directory(path, depth, parent)
    }

    fn handle_file(
        &mut self,
        path: &Path,
        depth: usize,
        parent: Option<&ProgressEntry>,
    ) -> Result<ResourceId, HandlerError> {
        (**self).handle_file(path, depth, parent)
    }

    fn handle_restricted_directory(
        &mut self,
        path: &Path,
        depth: usize,
        parent: Option<&ProgressEntry>,
    ) -> Result<ResourceId, HandlerError> {
        (**self).handle_restricted_directory(path, depth, parent)
    }

    fn directory_finished(&mut self, path: &Path, depth: usize, entry: &ProgressEntry) {
        (**self).directory_finished(path, depth, entry)
    }
}
