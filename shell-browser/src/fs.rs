use std::io;
use std::path::{Path, PathBuf};

/// What [`FsNamespace`](crate::FsNamespace) needs to know about a path before
/// binding it as a folder.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EntryInfo {
    /// The path resolves to a directory (after following links).
    pub is_dir: bool,
    /// The path itself is a symbolic link.
    pub is_symlink: bool,
}

/// Disk access behind the directory-tree namespace.
///
/// Swapped out in tests for an in-memory tree.
pub trait FileSystem {
    /// Resolve `path` to an absolute path with links and `..` removed.
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf>;
    /// Classify `path`. Fails with `NotFound` for dangling links.
    fn entry_info(&self, path: &Path) -> io::Result<EntryInfo>;
}

/// [`FileSystem`] backed by `std::fs`.
#[derive(Clone, Copy, Debug, Default)]
pub struct StdFileSystem;

impl FileSystem for StdFileSystem {
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        std::fs::canonicalize(path)
    }

    fn entry_info(&self, path: &Path) -> io::Result<EntryInfo> {
        let own = std::fs::symlink_metadata(path)?;
        if !own.file_type().is_symlink() {
            return Ok(EntryInfo {
                is_dir: own.is_dir(),
                is_symlink: false,
            });
        }
        let target = std::fs::metadata(path)?;
        Ok(EntryInfo {
            is_dir: target.is_dir(),
            is_symlink: true,
        })
    }
}
