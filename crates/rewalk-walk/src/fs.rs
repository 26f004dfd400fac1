//! Filesystem access used by the walker.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Type of a filesystem entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    Symlink,
    /// Sockets, devices, fifos.
    Other,
}

impl From<fs::FileType> for EntryKind {
    fn from(file_type: fs::FileType) -> Self {
        if file_type.is_dir() {
            Self::Directory
        } else if file_type.is_file() {
            Self::File
        } else if file_type.is_symlink() {
            Self::Symlink
        } else {
            Self::Other
        }
    }
}

/// Read-only view of a filesystem.
///
/// The walker never writes through this trait.
pub trait FileSystem {
    /// Read the type of an entry. With `follow_links` false a symlink is
    /// reported as [`EntryKind::Symlink`].
    fn entry_kind(&self, path: &Path, follow_links: bool) -> io::Result<EntryKind>;

    /// List the full paths of a directory's children, in enumeration order.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;
}

impl<F: FileSystem + ?Sized> FileSystem for &F {
    fn entry_kind(&self, path: &Path, follow_links: bool) -> io::Result<EntryKind> {
        (**self).entry_kind(path, follow_links)
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        (**self).read_dir(path)
    }
}

/// [`FileSystem`] backed by `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn entry_kind(&self, path: &Path, follow_links: bool) -> io::Result<EntryKind> {
        let metadata = if follow_links {
            fs::metadata(path)?
        } else {
            fs::symlink_metadata(path)?
        };
        Ok(metadata.file_type().into())
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        fs::read_dir(path)?
            .map(|entry| entry.map(|e| e.path()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_os_entry_kinds() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir(root.join("dir")).unwrap();
        fs::write(root.join("file.txt"), "x").unwrap();

        let fs = OsFileSystem;
        assert_eq!(fs.entry_kind(root, false).unwrap(), EntryKind::Directory);
        assert_eq!(
            fs.entry_kind(&root.join("file.txt"), false).unwrap(),
            EntryKind::File
        );
        assert!(fs.entry_kind(&root.join("missing"), false).is_err());

        let mut children = fs.read_dir(root).unwrap();
        children.sort();
        assert_eq!(children, vec![root.join("dir"), root.join("file.txt")]);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_not_followed_by_default() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir(root.join("target")).unwrap();
        std::os::unix::fs::symlink(root.join("target"), root.join("link")).unwrap();

        let fs = OsFileSystem;
        assert_eq!(
            fs.entry_kind(&root.join("link"), false).unwrap(),
            EntryKind::Symlink
        );
        assert_eq!(
            fs.entry_kind(&root.join("link"), true).unwrap(),
            EntryKind::Directory
        );
    }
}
