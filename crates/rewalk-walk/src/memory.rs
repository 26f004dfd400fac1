//! In-memory filesystem for walker tests.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use crate::fs::{EntryKind, FileSystem};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Node {
    File,
    Dir,
    Restricted,
    Unavailable,
}

/// A tree of paths with injectable failures. Listings come back in path
/// order unless `reverse_listing` is set.
#[derive(Debug, Default)]
pub(crate) struct MemoryFileSystem {
    nodes: BTreeMap<PathBuf, Node>,
    reverse_listing: bool,
    listed: RefCell<Vec<PathBuf>>,
}

impl MemoryFileSystem {
    /// Build a tree from paths; a trailing `/` marks a directory.
    pub(crate) fn from_paths(paths: &[&str]) -> Self {
        let mut fs = Self::default();
        for path in paths {
            match path.strip_suffix('/') {
                Some(dir) => fs.add_dir(dir),
                None => fs.add_file(path),
            }
        }
        fs
    }

    pub(crate) fn add_dir(&mut self, path: impl Into<PathBuf>) {
        self.nodes.insert(path.into(), Node::Dir);
    }

    pub(crate) fn add_file(&mut self, path: impl Into<PathBuf>) {
        self.nodes.insert(path.into(), Node::File);
    }

    /// Listing the directory fails with `PermissionDenied`.
    pub(crate) fn restrict(&mut self, path: impl Into<PathBuf>) {
        self.nodes.insert(path.into(), Node::Restricted);
    }

    /// Reading the entry's metadata fails.
    pub(crate) fn make_unavailable(&mut self, path: impl Into<PathBuf>) {
        self.nodes.insert(path.into(), Node::Unavailable);
    }

    /// Remove a path and everything beneath it.
    pub(crate) fn remove(&mut self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        self.nodes.retain(|p, _| !p.starts_with(path));
    }

    pub(crate) fn set_reverse_listing(&mut self, reverse: bool) {
        self.reverse_listing = reverse;
    }

    /// Directories listed so far.
    pub(crate) fn listed(&self) -> Vec<PathBuf> {
        self.listed.borrow().clone()
    }
}

impl FileSystem for MemoryFileSystem {
    fn entry_kind(&self, path: &Path, _follow_links: bool) -> io::Result<EntryKind> {
        match self.nodes.get(path) {
            Some(Node::File) => Ok(EntryKind::File),
            Some(Node::Dir | Node::Restricted) => Ok(EntryKind::Directory),
            Some(Node::Unavailable) => Err(io::Error::other("device not ready")),
            None => Err(io::Error::from(io::ErrorKind::NotFound)),
        }
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        match self.nodes.get(path) {
            Some(Node::Dir) => {
                self.listed.borrow_mut().push(path.to_path_buf());
                let mut children: Vec<PathBuf> = self
                    .nodes
                    .keys()
                    .filter(|p| p.parent() == Some(path))
                    .cloned()
                    .collect();
                if self.reverse_listing {
                    children.reverse();
                }
                Ok(children)
            }
            Some(Node::Restricted) => Err(io::Error::from(io::ErrorKind::PermissionDenied)),
            Some(_) => Err(io::Error::other("not a directory")),
            None => Err(io::Error::from(io::ErrorKind::NotFound)),
        }
    }
}
